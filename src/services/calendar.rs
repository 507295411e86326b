use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::ScheduleMode;

/// Fixed working hours used when no shift table is loaded. The last bookable
/// slot starts at the closing hour.
pub const OPEN_HOUR: u32 = 9;
pub const CLOSE_HOUR: u32 = 18;

pub const BOOKING_WINDOW_DAYS: i64 = 7;
pub const SLOT_MINUTES: i64 = 60;

/// Free `HH:MM` slot labels for a date, ordered ascending. Past slots are
/// dropped when the date is today.
pub fn available_slots(
    conn: &Connection,
    date: NaiveDate,
    mode: ScheduleMode,
    now: NaiveDateTime,
) -> Result<Vec<String>, AppError> {
    match mode {
        ScheduleMode::Default => fixed_hour_slots(conn, date, now),
        ScheduleMode::Excel => shift_slots(conn, date, now),
    }
}

/// Dates offered in the date picker. The fixed schedule always offers the
/// next week regardless of occupancy; the imported schedule offers its
/// working days that have not passed.
pub fn available_dates(
    conn: &Connection,
    mode: ScheduleMode,
    today: NaiveDate,
) -> Result<Vec<NaiveDate>, AppError> {
    match mode {
        ScheduleMode::Default => Ok((0..BOOKING_WINDOW_DAYS)
            .map(|offset| today + Duration::days(offset))
            .collect()),
        ScheduleMode::Excel => queries::working_dates_from(conn, today),
    }
}

fn fixed_hour_slots(
    conn: &Connection,
    date: NaiveDate,
    now: NaiveDateTime,
) -> Result<Vec<String>, AppError> {
    let occupied = queries::confirmed_times_on(conn, date)?;
    let is_today = date == now.date();

    let mut slots = vec![];
    for hour in OPEN_HOUR..=CLOSE_HOUR {
        if is_today && hour <= now.hour() {
            continue;
        }
        let label = format!("{hour:02}:00");
        if occupied.contains(&label) {
            continue;
        }
        slots.push(label);
    }
    Ok(slots)
}

fn shift_slots(
    conn: &Connection,
    date: NaiveDate,
    now: NaiveDateTime,
) -> Result<Vec<String>, AppError> {
    let shifts = queries::shifts_on(conn, date)?;
    let is_today = date == now.date();
    let current = now.time();

    let mut slots = vec![];
    for shift in &shifts {
        let (start, break_start, break_end, end) = shift.windows().ok_or_else(|| {
            AppError::Corrupt(format!("working day {} is missing shift times", shift.date))
        })?;

        let mut slot = start;
        loop {
            let (slot_end, wrapped) = slot.overflowing_add_signed(Duration::minutes(SLOT_MINUTES));
            if wrapped != 0 || slot_end > end {
                break;
            }

            let in_break = break_start <= slot && slot < break_end;
            let passed = is_today && slot <= current;
            if !in_break && !passed {
                slots.push(slot.format("%H:%M").to_string());
            }

            slot = slot_end;
        }
    }

    slots.sort();
    slots.dedup();
    Ok(slots)
}
