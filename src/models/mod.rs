pub mod booking;
pub mod schedule;
pub mod session;

pub use booking::{Booking, BookingStatus};
pub use schedule::{DayShift, DayStatus, ScheduleMode};
pub use session::{Session, SessionState, SessionStore};
