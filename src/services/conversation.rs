use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveTime};

use crate::db::queries;
use crate::errors::AppError;
use crate::keyboards;
use crate::models::{Session, SessionState};
use crate::services::calendar;
use crate::state::AppState;

/// Enters the booking dialog: offers the date picker, or reports that
/// nothing is open without creating a session.
pub async fn start_registration(
    state: &Arc<AppState>,
    from: i64,
    message_id: i64,
) -> anyhow::Result<()> {
    let now = Local::now().naive_local();
    let (mode, dates) = {
        let db = state.db.lock().unwrap();
        let mode = queries::schedule_mode(&db)?;
        let dates = calendar::available_dates(&db, mode, now.date())?;
        (mode, dates)
    };

    if dates.is_empty() {
        state
            .gateway
            .edit_message(
                from,
                message_id,
                "There are no dates open for booking right now.",
                Some(keyboards::back()),
            )
            .await?;
        return Ok(());
    }

    state.sessions.begin(from, now);
    tracing::info!(requester = from, mode = mode.as_str(), "booking dialog started");

    state
        .gateway
        .edit_message(
            from,
            message_id,
            "Choose a date:",
            Some(keyboards::date_picker(&dates)),
        )
        .await?;
    Ok(())
}

/// Date picked. Advances to time selection only when the day still has free
/// slots; otherwise the picker is re-rendered and the dialog stays put.
pub async fn pick_date(
    state: &Arc<AppState>,
    from: i64,
    message_id: i64,
    raw: &str,
) -> anyhow::Result<()> {
    let now = Local::now().naive_local();
    let Some(mut session) = state.sessions.get(from, now) else {
        return Ok(());
    };
    if session.state != SessionState::SelectingDate {
        return Ok(());
    }

    let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") else {
        tracing::warn!(requester = from, raw, "malformed date token");
        return Ok(());
    };

    let mode = {
        let db = state.db.lock().unwrap();
        queries::schedule_mode(&db)?
    };
    let slots = {
        let db = state.db.lock().unwrap();
        match calendar::available_slots(&db, date, mode, now) {
            Ok(slots) => slots,
            Err(AppError::Corrupt(detail)) => {
                tracing::error!(%date, detail, "schedule data unreadable, treating day as full");
                vec![]
            }
            Err(e) => return Err(e.into()),
        }
    };

    if slots.is_empty() {
        let dates = {
            let db = state.db.lock().unwrap();
            calendar::available_dates(&db, mode, now.date())?
        };
        state.sessions.put(from, session, now);
        state
            .gateway
            .edit_message(
                from,
                message_id,
                &format!(
                    "No free time on {}. Please pick another day.",
                    date.format("%d-%m-%Y")
                ),
                Some(keyboards::date_picker(&dates)),
            )
            .await?;
        return Ok(());
    }

    session.selected_date = Some(date);
    session.state = SessionState::SelectingTime;
    state.sessions.put(from, session, now);

    state
        .gateway
        .edit_message(
            from,
            message_id,
            &format!("Choose a time for {}:", date.format("%d-%m-%Y")),
            Some(keyboards::time_picker(&slots)),
        )
        .await?;
    Ok(())
}

pub async fn pick_time(
    state: &Arc<AppState>,
    from: i64,
    message_id: i64,
    raw: &str,
) -> anyhow::Result<()> {
    let now = Local::now().naive_local();
    let Some(mut session) = state.sessions.get(from, now) else {
        return Ok(());
    };
    if session.state != SessionState::SelectingTime {
        return Ok(());
    }

    if NaiveTime::parse_from_str(raw, "%H:%M").is_err() {
        tracing::warn!(requester = from, raw, "malformed time token");
        return Ok(());
    }

    session.selected_time = Some(raw.to_string());
    session.state = SessionState::EnteringName;
    state.sessions.put(from, session, now);

    state
        .gateway
        .edit_message(from, message_id, "Enter your name:", None)
        .await?;
    Ok(())
}

/// Free text feeds the name and phone steps; outside those it is ignored.
pub async fn text_input(state: &Arc<AppState>, from: i64, text: &str) -> anyhow::Result<()> {
    let now = Local::now().naive_local();
    let Some(mut session) = state.sessions.get(from, now) else {
        return Ok(());
    };

    match session.state {
        SessionState::EnteringName => {
            session.name = Some(text.trim().to_string());
            session.state = SessionState::EnteringPhone;
            state.sessions.put(from, session, now);
            state
                .gateway
                .send_message(from, "Enter your phone number:", None)
                .await?;
            Ok(())
        }
        SessionState::EnteringPhone => {
            session.phone = Some(text.trim().to_string());
            finish(state, from, session).await
        }
        _ => Ok(()),
    }
}

/// Discards the in-flight dialog, if any, and shows the main menu.
pub async fn cancel(
    state: &Arc<AppState>,
    from: i64,
    message_id: Option<i64>,
) -> anyhow::Result<()> {
    if state.sessions.end(from) {
        tracing::info!(requester = from, "booking dialog cancelled");
    }

    let text = "Choose an action:";
    let keyboard = keyboards::main_menu(state.is_admin(from));
    match message_id {
        Some(id) => state.gateway.edit_message(from, id, text, Some(keyboard)).await?,
        None => {
            state.gateway.send_message(from, text, Some(keyboard)).await?;
        }
    }
    Ok(())
}

/// Final transition: writes the booking and pushes the admin a decision
/// prompt. The session ends whether or not the write succeeds.
async fn finish(state: &Arc<AppState>, from: i64, session: Session) -> anyhow::Result<()> {
    state.sessions.end(from);

    let (Some(date), Some(time), Some(name), Some(phone)) = (
        session.selected_date,
        session.selected_time,
        session.name,
        session.phone,
    ) else {
        tracing::error!(requester = from, "dialog finished with incomplete data");
        state
            .gateway
            .send_message(from, "Something went wrong. Please start over.", None)
            .await?;
        return Ok(());
    };

    let created = {
        let db = state.db.lock().unwrap();
        queries::create_booking(
            &db,
            from,
            &name,
            &phone,
            &date.format("%Y-%m-%d").to_string(),
            &time,
        )
    };

    let id = match created {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, requester = from, "failed to create booking");
            state
                .gateway
                .send_message(from, "Could not create the booking. Please try again.", None)
                .await?;
            return Ok(());
        }
    };
    tracing::info!(booking_id = id, requester = from, "booking created");

    let display = state
        .gateway
        .display_name(from)
        .await
        .unwrap_or_else(|_| format!("Client ({from})"));
    let summary = format!(
        "New booking #{id}:\nName: {name}\nPhone: {phone}\nDate: {}\nTime: {time}\nProfile: {display}",
        date.format("%d-%m-%Y"),
    );
    if let Err(e) = state
        .gateway
        .send_message(
            state.config.admin_chat_id,
            &summary,
            Some(keyboards::decision(id)),
        )
        .await
    {
        let e = AppError::Delivery(e.to_string());
        tracing::error!(error = %e, booking_id = id, "decision prompt dropped");
    }

    state
        .gateway
        .send_message(
            from,
            "Your booking is awaiting confirmation. You will be notified.",
            None,
        )
        .await?;
    Ok(())
}
