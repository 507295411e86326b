use std::sync::Arc;

use chrono::{Duration, Local, NaiveDateTime};

use crate::db::queries;
use crate::errors::AppError;
use crate::state::AppState;

/// Look-ahead horizon for the reminder sweep.
pub const REMINDER_WINDOW_HOURS: i64 = 1;

/// Runs for the lifetime of the process, sweeping on a fixed interval. A
/// failed sweep is logged and the next tick proceeds as usual.
pub async fn run(state: Arc<AppState>) {
    let period = std::time::Duration::from_secs(state.config.reminder_interval_secs);
    let mut ticker = tokio::time::interval(period);

    loop {
        ticker.tick().await;
        let now = Local::now().naive_local();
        match sweep_once(&state, now).await {
            Ok(0) => {}
            Ok(sent) => tracing::info!(sent, "reminders delivered"),
            Err(e) => tracing::error!(error = %e, "reminder sweep failed"),
        }
    }
}

/// One sweep: every confirmed, not-yet-notified booking starting within the
/// look-ahead window gets a reminder pair (requester + admin) and is flagged
/// so the next sweep skips it. Failures are contained per booking.
pub async fn sweep_once(state: &Arc<AppState>, now: NaiveDateTime) -> Result<usize, AppError> {
    let due = {
        let db = state.db.lock().unwrap();
        queries::due_for_reminder(&db, now, Duration::hours(REMINDER_WINDOW_HOURS))?
    };

    let mut sent = 0;
    for booking in due {
        let when = format!(
            "{} at {}",
            booking.date.format("%d-%m-%Y"),
            booking.slot_label()
        );

        if let Err(e) = state
            .gateway
            .send_message(
                booking.requester_id,
                &format!("Reminder: your booking on {when} starts within the next hour."),
                None,
            )
            .await
        {
            let e = AppError::Delivery(e.to_string());
            tracing::error!(error = %e, booking_id = booking.id, "requester reminder dropped");
        }

        if let Err(e) = state
            .gateway
            .send_message(
                state.config.admin_chat_id,
                &format!(
                    "Reminder: {} (id {}) has a booking on {when} within the next hour.",
                    booking.name, booking.requester_id
                ),
                None,
            )
            .await
        {
            let e = AppError::Delivery(e.to_string());
            tracing::error!(error = %e, booking_id = booking.id, "admin reminder dropped");
        }

        let flagged = {
            let db = state.db.lock().unwrap();
            queries::mark_notified(&db, booking.id)
        };
        if let Err(e) = flagged {
            tracing::error!(error = %e, booking_id = booking.id, "failed to flag reminder");
            continue;
        }
        sent += 1;
    }
    Ok(sent)
}
