use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleMode {
    Default,
    Excel,
}

impl ScheduleMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleMode::Default => "default",
            ScheduleMode::Excel => "excel",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "excel" => ScheduleMode::Excel,
            _ => ScheduleMode::Default,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Working,
    Off,
}

impl DayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayStatus::Working => "working",
            DayStatus::Off => "off",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "working" => Some(DayStatus::Working),
            "off" => Some(DayStatus::Off),
            _ => None,
        }
    }

    /// Column value used in the schedule file.
    pub fn label(&self) -> &'static str {
        match self {
            DayStatus::Working => "Working",
            DayStatus::Off => "Off",
        }
    }
}

/// One imported schedule day. Shift times are present exactly when the day
/// is a working day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayShift {
    pub date: NaiveDate,
    pub day_of_week: String,
    pub status: DayStatus,
    pub start_shift: Option<NaiveTime>,
    pub start_break: Option<NaiveTime>,
    pub end_break: Option<NaiveTime>,
    pub end_shift: Option<NaiveTime>,
}

impl DayShift {
    pub fn working(
        date: NaiveDate,
        day_of_week: String,
        start_shift: NaiveTime,
        start_break: NaiveTime,
        end_break: NaiveTime,
        end_shift: NaiveTime,
    ) -> Self {
        Self {
            date,
            day_of_week,
            status: DayStatus::Working,
            start_shift: Some(start_shift),
            start_break: Some(start_break),
            end_break: Some(end_break),
            end_shift: Some(end_shift),
        }
    }

    pub fn day_off(date: NaiveDate, day_of_week: String) -> Self {
        Self {
            date,
            day_of_week,
            status: DayStatus::Off,
            start_shift: None,
            start_break: None,
            end_break: None,
            end_shift: None,
        }
    }

    /// Shift windows for a working day: (start, break start, break end, end).
    pub fn windows(&self) -> Option<(NaiveTime, NaiveTime, NaiveTime, NaiveTime)> {
        match (
            self.start_shift,
            self.start_break,
            self.end_break,
            self.end_shift,
        ) {
            (Some(a), Some(b), Some(c), Some(d)) => Some((a, b, c, d)),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        match self.status {
            DayStatus::Working => {
                let (start, break_start, break_end, end) =
                    self.windows().ok_or_else(|| {
                        AppError::Validation(format!(
                            "working day {} is missing shift times",
                            self.date
                        ))
                    })?;
                if !(start < break_start && break_start < break_end && break_end < end) {
                    return Err(AppError::Validation(format!(
                        "working day {} has mis-ordered shift times",
                        self.date
                    )));
                }
                Ok(())
            }
            DayStatus::Off => {
                if self.start_shift.is_some()
                    || self.start_break.is_some()
                    || self.end_break.is_some()
                    || self.end_shift.is_some()
                {
                    return Err(AppError::Validation(format!(
                        "day off {} must not carry shift times",
                        self.date
                    )));
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_working_day_valid() {
        let shift = DayShift::working(
            d("2025-06-16"),
            "Monday".to_string(),
            t("09:00"),
            t("12:00"),
            t("13:00"),
            t("18:00"),
        );
        assert!(shift.validate().is_ok());
    }

    #[test]
    fn test_working_day_misordered_break() {
        let shift = DayShift::working(
            d("2025-06-16"),
            "Monday".to_string(),
            t("09:00"),
            t("13:00"),
            t("12:00"),
            t("18:00"),
        );
        assert!(shift.validate().is_err());
    }

    #[test]
    fn test_working_day_break_outside_shift() {
        let shift = DayShift::working(
            d("2025-06-16"),
            "Monday".to_string(),
            t("09:00"),
            t("08:00"),
            t("08:30"),
            t("18:00"),
        );
        assert!(shift.validate().is_err());
    }

    #[test]
    fn test_day_off_with_times_rejected() {
        let mut shift = DayShift::day_off(d("2025-06-18"), "Wednesday".to_string());
        assert!(shift.validate().is_ok());
        shift.start_shift = Some(t("09:00"));
        assert!(shift.validate().is_err());
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(DayStatus::parse("Working"), Some(DayStatus::Working));
        assert_eq!(DayStatus::parse(" off "), Some(DayStatus::Off));
        assert_eq!(DayStatus::parse("holiday"), None);
    }
}
