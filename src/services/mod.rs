pub mod calendar;
pub mod conversation;
pub mod messaging;
pub mod reminders;
pub mod schedule_file;
