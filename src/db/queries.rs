use std::collections::HashSet;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection};

use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, DayShift, DayStatus, ScheduleMode};

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M:%S";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

const BOOKING_COLUMNS: &str =
    "id, requester_id, name, phone, date, time, status, notification_sent";

// ── Bookings ──

/// Inserts a new pending booking. The date is accepted as `YYYY-MM-DD` or
/// `DD-MM-YYYY` and the time as `H:MM`, `HH:MM` or `HH:MM:SS`; both are
/// normalized before the write.
pub fn create_booking(
    conn: &Connection,
    requester_id: i64,
    name: &str,
    phone: &str,
    date: &str,
    time: &str,
) -> Result<i64, AppError> {
    let date = normalize_date(date)?;
    let time = normalize_time(time)?;

    conn.execute(
        "INSERT INTO bookings (requester_id, name, phone, date, time)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            requester_id,
            name,
            phone,
            date.format(DATE_FMT).to_string(),
            time.format(TIME_FMT).to_string(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_booking(conn: &Connection, id: i64) -> Result<Option<Booking>, AppError> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1");
    let result = conn.query_row(&sql, params![id], |row| Ok(read_booking(row)));

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Overwrites the status unconditionally; the caller decides whether the
/// current status matters. Flipping to Confirmed trips the unique index when
/// another confirmed booking already holds the slot.
pub fn set_status(conn: &Connection, id: i64, status: BookingStatus) -> Result<bool, AppError> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(count > 0)
}

pub fn mark_notified(conn: &Connection, id: i64) -> Result<(), AppError> {
    conn.execute(
        "UPDATE bookings SET notification_sent = 1 WHERE id = ?1",
        params![id],
    )?;
    Ok(())
}

pub fn active_for_requester(
    conn: &Connection,
    requester_id: i64,
    now: NaiveDateTime,
) -> Result<Vec<Booking>, AppError> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE requester_id = ?1 AND status = 'confirmed'
           AND datetime(date || ' ' || time) >= datetime(?2)
         ORDER BY date ASC, time ASC"
    );
    collect_bookings(conn, &sql, params![requester_id, fmt_datetime(now)])
}

pub fn history_for_requester(
    conn: &Connection,
    requester_id: i64,
) -> Result<Vec<Booking>, AppError> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE requester_id = ?1 ORDER BY date ASC, time ASC"
    );
    collect_bookings(conn, &sql, params![requester_id])
}

pub fn active_bookings(conn: &Connection, now: NaiveDateTime) -> Result<Vec<Booking>, AppError> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE status = 'confirmed'
           AND datetime(date || ' ' || time) >= datetime(?1)
         ORDER BY date ASC, time ASC"
    );
    collect_bookings(conn, &sql, params![fmt_datetime(now)])
}

pub fn all_bookings(conn: &Connection) -> Result<Vec<Booking>, AppError> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY date ASC, time ASC");
    collect_bookings(conn, &sql, params![])
}

/// `HH:MM` labels of confirmed bookings on a date.
pub fn confirmed_times_on(
    conn: &Connection,
    date: NaiveDate,
) -> Result<HashSet<String>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT time FROM bookings WHERE date = ?1 AND status = 'confirmed'",
    )?;
    let rows = stmt.query_map(params![date.format(DATE_FMT).to_string()], |row| {
        row.get::<_, String>(0)
    })?;

    let mut times = HashSet::new();
    for row in rows {
        let time = row?;
        times.insert(time.chars().take(5).collect());
    }
    Ok(times)
}

/// Confirmed, not-yet-notified bookings starting after `now` and no later
/// than `now + window`.
pub fn due_for_reminder(
    conn: &Connection,
    now: NaiveDateTime,
    window: Duration,
) -> Result<Vec<Booking>, AppError> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE status = 'confirmed' AND notification_sent = 0
           AND datetime(date || ' ' || time) > datetime(?1)
           AND datetime(date || ' ' || time) <= datetime(?2)
         ORDER BY date ASC, time ASC"
    );
    collect_bookings(
        conn,
        &sql,
        params![fmt_datetime(now), fmt_datetime(now + window)],
    )
}

fn collect_bookings(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> Result<Vec<Booking>, AppError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| Ok(read_booking(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

fn read_booking(row: &rusqlite::Row) -> Result<Booking, AppError> {
    let date_str: String = row.get(4)?;
    let time_str: String = row.get(5)?;
    let status_str: String = row.get(6)?;

    Ok(Booking {
        id: row.get(0)?,
        requester_id: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
        date: NaiveDate::parse_from_str(&date_str, DATE_FMT)
            .map_err(|_| AppError::Corrupt(format!("stored booking date: {date_str}")))?,
        time: NaiveTime::parse_from_str(&time_str, TIME_FMT)
            .map_err(|_| AppError::Corrupt(format!("stored booking time: {time_str}")))?,
        status: BookingStatus::parse(&status_str),
        notification_sent: row.get::<_, i64>(7)? != 0,
    })
}

fn normalize_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d-%m-%Y"))
        .map_err(|_| AppError::Validation(format!("unrecognized date: {s}")))
}

fn normalize_time(s: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| AppError::Validation(format!("unrecognized time: {s}")))
}

fn fmt_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

// ── Day shifts ──

/// Clears the shift table and inserts the new rows in one transaction; any
/// failure leaves the previous contents in place.
pub fn replace_schedule(conn: &mut Connection, rows: &[DayShift]) -> Result<(), AppError> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM day_shifts", [])?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO day_shifts
                 (date, day_of_week, status, start_shift, start_break, end_break, end_shift)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for row in rows {
            stmt.execute(params![
                row.date.format(DATE_FMT).to_string(),
                row.day_of_week,
                row.status.as_str(),
                row.start_shift.map(fmt_shift_time),
                row.start_break.map(fmt_shift_time),
                row.end_break.map(fmt_shift_time),
                row.end_shift.map(fmt_shift_time),
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

pub fn working_dates_from(
    conn: &Connection,
    today: NaiveDate,
) -> Result<Vec<NaiveDate>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT date FROM day_shifts
         WHERE status = 'working' AND date >= ?1 ORDER BY date ASC",
    )?;
    let rows = stmt.query_map(params![today.format(DATE_FMT).to_string()], |row| {
        row.get::<_, String>(0)
    })?;

    let mut dates = vec![];
    for row in rows {
        let raw = row?;
        let date = NaiveDate::parse_from_str(&raw, DATE_FMT)
            .map_err(|_| AppError::Corrupt(format!("stored shift date: {raw}")))?;
        dates.push(date);
    }
    Ok(dates)
}

/// Working shift rows for a date, with their times parsed. A working row
/// with missing or malformed times is reported as corrupt.
pub fn shifts_on(conn: &Connection, date: NaiveDate) -> Result<Vec<DayShift>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT date, day_of_week, status, start_shift, start_break, end_break, end_shift
         FROM day_shifts WHERE date = ?1 AND status = 'working'",
    )?;
    let rows = stmt.query_map(params![date.format(DATE_FMT).to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, Option<String>>(6)?,
        ))
    })?;

    let mut shifts = vec![];
    for row in rows {
        let (date_str, day_of_week, status_str, t1, t2, t3, t4) = row?;
        let date = NaiveDate::parse_from_str(&date_str, DATE_FMT)
            .map_err(|_| AppError::Corrupt(format!("stored shift date: {date_str}")))?;
        let status = DayStatus::parse(&status_str)
            .ok_or_else(|| AppError::Corrupt(format!("stored shift status: {status_str}")))?;
        shifts.push(DayShift {
            date,
            day_of_week,
            status,
            start_shift: parse_shift_time(t1)?,
            start_break: parse_shift_time(t2)?,
            end_break: parse_shift_time(t3)?,
            end_shift: parse_shift_time(t4)?,
        });
    }
    Ok(shifts)
}

fn fmt_shift_time(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

fn parse_shift_time(value: Option<String>) -> Result<Option<NaiveTime>, AppError> {
    match value {
        None => Ok(None),
        Some(raw) => NaiveTime::parse_from_str(&raw, "%H:%M")
            .map(Some)
            .map_err(|_| AppError::Corrupt(format!("stored shift time: {raw}"))),
    }
}

// ── Schedule mode ──

pub fn schedule_mode(conn: &Connection) -> Result<ScheduleMode, AppError> {
    let mode: String =
        conn.query_row("SELECT mode FROM schedule_mode WHERE id = 1", [], |row| {
            row.get(0)
        })?;
    Ok(ScheduleMode::parse(&mode))
}

pub fn set_schedule_mode(conn: &Connection, mode: ScheduleMode) -> Result<(), AppError> {
    conn.execute(
        "UPDATE schedule_mode SET mode = ?1 WHERE id = 1",
        params![mode.as_str()],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    #[test]
    fn test_create_booking_normalizes_inputs() {
        let conn = setup_db();

        let id = create_booking(&conn, 100, "Ann", "555-1212", "02-01-2024", "9:00").unwrap();
        let booking = get_booking(&conn, id).unwrap().unwrap();

        assert_eq!(booking.date, d("2024-01-02"));
        assert_eq!(booking.time, t("09:00"));
        assert_eq!(booking.slot_label(), "09:00");
        assert_eq!(booking.status, BookingStatus::Pending);
        assert!(!booking.notification_sent);

        let stored: (String, String) = conn
            .query_row("SELECT date, time FROM bookings WHERE id = ?1", [id], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(stored, ("2024-01-02".to_string(), "09:00:00".to_string()));
    }

    #[test]
    fn test_create_booking_accepts_iso_date() {
        let conn = setup_db();
        let id = create_booking(&conn, 100, "Ann", "555", "2024-01-02", "14:30").unwrap();
        let booking = get_booking(&conn, id).unwrap().unwrap();
        assert_eq!(booking.date, d("2024-01-02"));
        assert_eq!(booking.slot_label(), "14:30");
    }

    #[test]
    fn test_create_booking_rejects_garbage() {
        let conn = setup_db();
        assert!(matches!(
            create_booking(&conn, 1, "A", "1", "tomorrow", "10:00"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            create_booking(&conn, 1, "A", "1", "2024-01-02", "noonish"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_get_booking_missing() {
        let conn = setup_db();
        assert!(get_booking(&conn, 42).unwrap().is_none());
    }

    #[test]
    fn test_set_status_overwrites_terminal_states() {
        let conn = setup_db();
        let id = create_booking(&conn, 1, "A", "1", "2024-01-02", "10:00").unwrap();

        assert!(set_status(&conn, id, BookingStatus::Rejected).unwrap());
        assert_eq!(
            get_booking(&conn, id).unwrap().unwrap().status,
            BookingStatus::Rejected
        );

        // no precondition on the current status
        assert!(set_status(&conn, id, BookingStatus::Confirmed).unwrap());
        assert_eq!(
            get_booking(&conn, id).unwrap().unwrap().status,
            BookingStatus::Confirmed
        );

        assert!(!set_status(&conn, 999, BookingStatus::Confirmed).unwrap());
    }

    #[test]
    fn test_confirmed_slot_is_unique() {
        let conn = setup_db();
        let first = create_booking(&conn, 1, "A", "1", "2024-01-02", "10:00").unwrap();
        let second = create_booking(&conn, 2, "B", "2", "2024-01-02", "10:00").unwrap();

        assert!(set_status(&conn, first, BookingStatus::Confirmed).unwrap());

        let err = set_status(&conn, second, BookingStatus::Confirmed).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(
            get_booking(&conn, second).unwrap().unwrap().status,
            BookingStatus::Pending
        );
    }

    #[test]
    fn test_mark_notified_is_idempotent() {
        let conn = setup_db();
        let id = create_booking(&conn, 1, "A", "1", "2024-01-02", "10:00").unwrap();

        mark_notified(&conn, id).unwrap();
        mark_notified(&conn, id).unwrap();

        assert!(get_booking(&conn, id).unwrap().unwrap().notification_sent);
    }

    #[test]
    fn test_active_vs_history_queries() {
        let conn = setup_db();
        let now = dt("2024-01-01 12:00");

        let past = create_booking(&conn, 1, "A", "1", "2023-12-31", "10:00").unwrap();
        let future = create_booking(&conn, 1, "A", "1", "2024-01-02", "10:00").unwrap();
        let _pending = create_booking(&conn, 1, "A", "1", "2024-01-03", "10:00").unwrap();
        let other = create_booking(&conn, 2, "B", "2", "2024-01-04", "10:00").unwrap();

        set_status(&conn, past, BookingStatus::Confirmed).unwrap();
        set_status(&conn, future, BookingStatus::Confirmed).unwrap();
        set_status(&conn, other, BookingStatus::Confirmed).unwrap();

        let active = active_for_requester(&conn, 1, now).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, future);

        let history = history_for_requester(&conn, 1).unwrap();
        assert_eq!(history.len(), 3);

        let admin_active = active_bookings(&conn, now).unwrap();
        assert_eq!(admin_active.len(), 2);

        assert_eq!(all_bookings(&conn).unwrap().len(), 4);
    }

    #[test]
    fn test_active_includes_booking_starting_now() {
        let conn = setup_db();
        let id = create_booking(&conn, 1, "A", "1", "2024-01-01", "12:00").unwrap();
        set_status(&conn, id, BookingStatus::Confirmed).unwrap();

        let active = active_for_requester(&conn, 1, dt("2024-01-01 12:00")).unwrap();
        assert_eq!(active.len(), 1);
    }

    #[test]
    fn test_confirmed_times_on() {
        let conn = setup_db();
        let a = create_booking(&conn, 1, "A", "1", "2024-01-02", "10:00").unwrap();
        let b = create_booking(&conn, 2, "B", "2", "2024-01-02", "11:00").unwrap();
        create_booking(&conn, 3, "C", "3", "2024-01-03", "12:00").unwrap();

        set_status(&conn, a, BookingStatus::Confirmed).unwrap();
        set_status(&conn, b, BookingStatus::Rejected).unwrap();

        let times = confirmed_times_on(&conn, d("2024-01-02")).unwrap();
        assert!(times.contains("10:00"));
        assert!(!times.contains("11:00"));
        assert_eq!(times.len(), 1);
    }

    #[test]
    fn test_due_for_reminder_window() {
        let conn = setup_db();
        let now = dt("2024-01-01 13:05");

        let soon = create_booking(&conn, 1, "A", "1", "2024-01-01", "14:00").unwrap();
        let far = create_booking(&conn, 2, "B", "2", "2024-01-01", "16:00").unwrap();
        let past = create_booking(&conn, 3, "C", "3", "2024-01-01", "12:00").unwrap();
        for id in [soon, far, past] {
            set_status(&conn, id, BookingStatus::Confirmed).unwrap();
        }

        let due = due_for_reminder(&conn, now, Duration::hours(1)).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, soon);

        mark_notified(&conn, soon).unwrap();
        assert!(due_for_reminder(&conn, now, Duration::hours(1))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_replace_schedule_swaps_contents() {
        let mut conn = setup_db();

        let first = vec![DayShift::working(
            d("2024-01-01"),
            "Monday".to_string(),
            t("09:00"),
            t("12:00"),
            t("13:00"),
            t("18:00"),
        )];
        replace_schedule(&mut conn, &first).unwrap();

        let second = vec![
            DayShift::day_off(d("2024-01-03"), "Wednesday".to_string()),
            DayShift::working(
                d("2024-01-04"),
                "Thursday".to_string(),
                t("10:00"),
                t("12:00"),
                t("12:30"),
                t("16:00"),
            ),
        ];
        replace_schedule(&mut conn, &second).unwrap();

        assert!(working_dates_from(&conn, d("2024-01-01")).unwrap() == vec![d("2024-01-04")]);
        assert!(shifts_on(&conn, d("2024-01-01")).unwrap().is_empty());

        let thursday = shifts_on(&conn, d("2024-01-04")).unwrap();
        assert_eq!(thursday.len(), 1);
        assert_eq!(thursday[0].start_shift, Some(t("10:00")));
        assert_eq!(thursday[0].end_shift, Some(t("16:00")));
    }

    #[test]
    fn test_working_dates_excludes_past_and_off_days() {
        let mut conn = setup_db();
        let rows = vec![
            DayShift::working(
                d("2024-01-01"),
                "Monday".to_string(),
                t("09:00"),
                t("12:00"),
                t("13:00"),
                t("18:00"),
            ),
            DayShift::day_off(d("2024-01-02"), "Tuesday".to_string()),
            DayShift::working(
                d("2024-01-05"),
                "Friday".to_string(),
                t("09:00"),
                t("12:00"),
                t("13:00"),
                t("18:00"),
            ),
        ];
        replace_schedule(&mut conn, &rows).unwrap();

        let dates = working_dates_from(&conn, d("2024-01-02")).unwrap();
        assert_eq!(dates, vec![d("2024-01-05")]);
    }

    #[test]
    fn test_shifts_on_reports_corrupt_times() {
        let conn = setup_db();
        conn.execute(
            "INSERT INTO day_shifts (date, day_of_week, status, start_shift, start_break, end_break, end_shift)
             VALUES ('2024-01-01', 'Monday', 'working', 'soon', '12:00', '13:00', '18:00')",
            [],
        )
        .unwrap();

        assert!(matches!(
            shifts_on(&conn, d("2024-01-01")),
            Err(AppError::Corrupt(_))
        ));
    }

    #[test]
    fn test_schedule_mode_roundtrip() {
        let conn = setup_db();
        assert_eq!(schedule_mode(&conn).unwrap(), ScheduleMode::Default);

        set_schedule_mode(&conn, ScheduleMode::Excel).unwrap();
        assert_eq!(schedule_mode(&conn).unwrap(), ScheduleMode::Excel);

        set_schedule_mode(&conn, ScheduleMode::Default).unwrap();
        assert_eq!(schedule_mode(&conn).unwrap(), ScheduleMode::Default);
    }
}
