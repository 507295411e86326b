use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub requester_id: i64,
    pub name: String,
    pub phone: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: BookingStatus,
    pub notification_sent: bool,
}

impl Booking {
    /// Fixed-width `HH:MM` label used for slot-occupancy comparisons.
    pub fn slot_label(&self) -> String {
        self.time.format("%H:%M").to_string()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            "rejected" => BookingStatus::Rejected,
            _ => BookingStatus::Pending,
        }
    }
}
