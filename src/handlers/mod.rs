pub mod admin;
pub mod dispatch;
pub mod records;
pub mod schedule;
pub mod settings;
