use chrono::NaiveDate;

use crate::models::ScheduleMode;
use crate::services::messaging::{button, Keyboard};

pub fn main_menu(is_admin: bool) -> Keyboard {
    let mut keyboard = Keyboard::new()
        .row(vec![button("Book a slot", "start_registration")])
        .row(vec![button("My bookings", "view_records")]);
    if is_admin {
        keyboard = keyboard.row(vec![button("Settings", "settings")]);
    }
    keyboard
}

/// One button per date; the action carries the ISO date, the label the
/// friendlier day-first form.
pub fn date_picker(dates: &[NaiveDate]) -> Keyboard {
    let mut keyboard = Keyboard::new();
    for date in dates {
        keyboard = keyboard.row(vec![button(
            date.format("%d-%m-%Y").to_string(),
            format!("date_{}", date.format("%Y-%m-%d")),
        )]);
    }
    keyboard.row(vec![button("Back", "cancel")])
}

pub fn time_picker(slots: &[String]) -> Keyboard {
    let mut keyboard = Keyboard::new();
    for slot in slots {
        keyboard = keyboard.row(vec![button(slot.clone(), format!("time_{slot}"))]);
    }
    keyboard.row(vec![button("Back", "cancel")])
}

pub fn records_menu(is_admin: bool) -> Keyboard {
    if is_admin {
        Keyboard::new()
            .row(vec![button("Active bookings (all)", "view_active_records_admin")])
            .row(vec![button("History (all)", "view_history_records_admin")])
            .row(vec![button("Back", "cancel")])
    } else {
        Keyboard::new()
            .row(vec![button("Active bookings", "view_active_records_user")])
            .row(vec![button("History", "view_history_records_user")])
            .row(vec![button("Back", "cancel")])
    }
}

pub fn settings_menu() -> Keyboard {
    Keyboard::new()
        .row(vec![button("Schedule", "settings_schedule")])
        .row(vec![button("Back", "cancel")])
}

pub fn schedule_mode_menu(current: ScheduleMode) -> Keyboard {
    let toggle = match current {
        ScheduleMode::Default => button("Enable spreadsheet schedule", "enable_excel_schedule"),
        ScheduleMode::Excel => button("Enable standard schedule", "enable_standard_schedule"),
    };
    Keyboard::new()
        .row(vec![toggle])
        .row(vec![button("Back", "cancel")])
}

pub fn decision(booking_id: i64) -> Keyboard {
    Keyboard::new().row(vec![
        button("Confirm", format!("confirm_{booking_id}")),
        button("Reject", format!("reject_{booking_id}")),
    ])
}

pub fn back() -> Keyboard {
    Keyboard::new().row(vec![button("Back", "cancel")])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_menu_settings_is_admin_only() {
        assert_eq!(main_menu(false).rows.len(), 2);

        let admin = main_menu(true);
        assert_eq!(admin.rows.len(), 3);
        assert_eq!(admin.rows[2][0].action, "settings");
    }

    #[test]
    fn test_date_picker_tokens_carry_iso_dates() {
        let date = NaiveDate::parse_from_str("2024-01-02", "%Y-%m-%d").unwrap();
        let keyboard = date_picker(&[date]);

        assert_eq!(keyboard.rows[0][0].action, "date_2024-01-02");
        assert_eq!(keyboard.rows[0][0].label, "02-01-2024");
        assert_eq!(keyboard.rows[1][0].action, "cancel");
    }

    #[test]
    fn test_time_picker_tokens() {
        let keyboard = time_picker(&["09:00".to_string(), "14:00".to_string()]);
        assert_eq!(keyboard.rows[0][0].action, "time_09:00");
        assert_eq!(keyboard.rows[1][0].action, "time_14:00");
    }

    #[test]
    fn test_schedule_mode_menu_offers_the_other_mode() {
        let from_default = schedule_mode_menu(ScheduleMode::Default);
        assert_eq!(from_default.rows[0][0].action, "enable_excel_schedule");

        let from_excel = schedule_mode_menu(ScheduleMode::Excel);
        assert_eq!(from_excel.rows[0][0].action, "enable_standard_schedule");
    }

    #[test]
    fn test_decision_pair() {
        let keyboard = decision(7);
        assert_eq!(keyboard.rows[0][0].action, "confirm_7");
        assert_eq!(keyboard.rows[0][1].action, "reject_7");
    }
}
