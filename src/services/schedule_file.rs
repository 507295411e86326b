use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};

use crate::errors::AppError;
use crate::models::{DayShift, DayStatus};

pub const FILE_NAME: &str = "schedule_week.csv";

const HEADER: &str = "Date,DayOfWeek,Status,StartShift,StartBreak,EndBreak,EndShift";
const COLUMN_COUNT: usize = 7;

const TEMPLATE_SHIFT: (&str, &str, &str, &str) = ("09:00", "12:00", "13:00", "18:00");

/// Renders the two-week editable template: the current week (Monday through
/// Sunday), a blank separator row, then the next week. Wednesday and Sunday
/// are pre-filled as days off.
pub fn render_template(today: NaiveDate) -> String {
    let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);

    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');

    for week in 0..2 {
        if week == 1 {
            out.push_str(&blank_row());
            out.push('\n');
        }
        for day in 0..7 {
            let date = monday + Duration::days(week * 7 + day);
            out.push_str(&render_row(&template_row(date)));
            out.push('\n');
        }
    }
    out
}

/// Decodes an uploaded schedule file. The header is skipped, blank rows are
/// skipped, and any row that fails to parse or validate aborts the whole
/// import so the stored schedule is never partially replaced.
pub fn parse(input: &str) -> Result<Vec<DayShift>, AppError> {
    let mut rows = vec![];

    for (index, line) in input.lines().enumerate() {
        if index == 0 {
            continue;
        }

        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        if cells.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        let line_no = index + 1;
        if cells.len() != COLUMN_COUNT {
            return Err(AppError::Validation(format!(
                "line {line_no}: expected {COLUMN_COUNT} columns, found {}",
                cells.len()
            )));
        }

        let date = NaiveDate::parse_from_str(cells[0], "%Y-%m-%d").map_err(|_| {
            AppError::Validation(format!("line {line_no}: unrecognized date: {}", cells[0]))
        })?;
        let status = DayStatus::parse(cells[2]).ok_or_else(|| {
            AppError::Validation(format!("line {line_no}: unknown status: {}", cells[2]))
        })?;

        let shift = match status {
            DayStatus::Working => DayShift::working(
                date,
                cells[1].to_string(),
                parse_time(cells[3], line_no)?,
                parse_time(cells[4], line_no)?,
                parse_time(cells[5], line_no)?,
                parse_time(cells[6], line_no)?,
            ),
            DayStatus::Off => {
                if cells[3..].iter().any(|cell| !cell.is_empty()) {
                    return Err(AppError::Validation(format!(
                        "line {line_no}: a day off must not carry shift times"
                    )));
                }
                DayShift::day_off(date, cells[1].to_string())
            }
        };
        shift.validate()?;
        rows.push(shift);
    }

    if rows.is_empty() {
        return Err(AppError::Validation(
            "the file contains no schedule rows".to_string(),
        ));
    }
    Ok(rows)
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn template_row(date: NaiveDate) -> DayShift {
    let name = weekday_name(date.weekday()).to_string();
    match date.weekday() {
        Weekday::Wed | Weekday::Sun => DayShift::day_off(date, name),
        _ => {
            let (start, break_start, break_end, end) = TEMPLATE_SHIFT;
            DayShift::working(
                date,
                name,
                time(start),
                time(break_start),
                time(break_end),
                time(end),
            )
        }
    }
}

fn render_row(shift: &DayShift) -> String {
    let fmt = |t: Option<NaiveTime>| {
        t.map(|t| t.format("%H:%M").to_string()).unwrap_or_default()
    };
    format!(
        "{},{},{},{},{},{},{}",
        shift.date.format("%Y-%m-%d"),
        shift.day_of_week,
        shift.status.label(),
        fmt(shift.start_shift),
        fmt(shift.start_break),
        fmt(shift.end_break),
        fmt(shift.end_shift),
    )
}

fn blank_row() -> String {
    ",".repeat(COLUMN_COUNT - 1)
}

fn parse_time(cell: &str, line_no: usize) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(cell, "%H:%M")
        .map_err(|_| AppError::Validation(format!("line {line_no}: unrecognized time: {cell}")))
}

fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").unwrap_or_default()
}
