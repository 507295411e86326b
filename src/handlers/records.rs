use std::sync::Arc;

use chrono::Local;

use crate::db::queries;
use crate::keyboards;
use crate::models::Booking;
use crate::state::AppState;

pub async fn menu(state: &Arc<AppState>, from: i64, message_id: i64) -> anyhow::Result<()> {
    state
        .gateway
        .edit_message(
            from,
            message_id,
            "Which bookings would you like to see?",
            Some(keyboards::records_menu(state.is_admin(from))),
        )
        .await?;
    Ok(())
}

pub async fn view(
    state: &Arc<AppState>,
    from: i64,
    message_id: i64,
    token: &str,
) -> anyhow::Result<()> {
    let now = Local::now().naive_local();

    let text = match token {
        "view_active_records_admin" => {
            let bookings = {
                let db = state.db.lock().unwrap();
                queries::active_bookings(&db, now)?
            };
            if bookings.is_empty() {
                "There are no active bookings.".to_string()
            } else {
                admin_listing(state, "Active bookings:", &bookings, false).await
            }
        }
        "view_history_records_admin" => {
            let bookings = {
                let db = state.db.lock().unwrap();
                queries::all_bookings(&db)?
            };
            if bookings.is_empty() {
                "The booking history is empty.".to_string()
            } else {
                admin_listing(state, "Booking history:", &bookings, true).await
            }
        }
        "view_active_records_user" => {
            let bookings = {
                let db = state.db.lock().unwrap();
                queries::active_for_requester(&db, from, now)?
            };
            if bookings.is_empty() {
                "You have no active bookings.".to_string()
            } else {
                user_listing("Your active bookings:", &bookings, false)
            }
        }
        "view_history_records_user" => {
            let bookings = {
                let db = state.db.lock().unwrap();
                queries::history_for_requester(&db, from)?
            };
            if bookings.is_empty() {
                "You have no past bookings.".to_string()
            } else {
                user_listing("Your booking history:", &bookings, true)
            }
        }
        _ => return Ok(()),
    };

    state
        .gateway
        .edit_message(from, message_id, &text, Some(keyboards::back()))
        .await?;
    Ok(())
}

async fn admin_listing(
    state: &Arc<AppState>,
    title: &str,
    bookings: &[Booking],
    with_status: bool,
) -> String {
    let mut text = format!("{title}\n");
    for booking in bookings {
        let display = state
            .gateway
            .display_name(booking.requester_id)
            .await
            .unwrap_or_else(|_| format!("Client ({})", booking.requester_id));

        text.push_str(&format!(
            "#{}: {}, {} - {} at {}",
            booking.id,
            booking.name,
            booking.phone,
            booking.date.format("%d-%m-%Y"),
            booking.slot_label(),
        ));
        if with_status {
            text.push_str(&format!(" [{}]", booking.status.as_str()));
        }
        text.push_str(&format!(" - {display}\n"));
    }
    text
}

fn user_listing(title: &str, bookings: &[Booking], with_status: bool) -> String {
    let mut text = format!("{title}\n");
    for booking in bookings {
        text.push_str(&format!(
            "{} at {}",
            booking.date.format("%d-%m-%Y"),
            booking.slot_label(),
        ));
        if with_status {
            text.push_str(&format!(" [{}]", booking.status.as_str()));
        }
        text.push('\n');
    }
    text
}
