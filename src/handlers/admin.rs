use std::sync::Arc;

use crate::db::queries;
use crate::errors::AppError;
use crate::keyboards;
use crate::models::BookingStatus;
use crate::state::AppState;

/// Applies an administrator decision token (`confirm_<id>` / `reject_<id>`).
/// The status write does not re-check the current status; a later decision
/// on the same booking simply overwrites the earlier one. Outward pushes are
/// best-effort and never undo the committed status change.
pub async fn handle_decision(
    state: &Arc<AppState>,
    message_id: i64,
    token: &str,
) -> anyhow::Result<()> {
    let admin = state.config.admin_chat_id;

    let Some((action, raw_id)) = token.split_once('_') else {
        return Ok(());
    };
    let Ok(booking_id) = raw_id.parse::<i64>() else {
        state
            .gateway
            .edit_message(admin, message_id, "Malformed booking id.", None)
            .await?;
        return Ok(());
    };

    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking(&db, booking_id)?
    };
    let Some(booking) = booking else {
        let e = AppError::NotFound(format!("booking {booking_id}"));
        tracing::warn!(error = %e, "decision on missing booking");
        state
            .gateway
            .edit_message(
                admin,
                message_id,
                &format!("Booking #{booking_id} not found."),
                None,
            )
            .await?;
        return Ok(());
    };

    let when = format!(
        "{} at {}",
        booking.date.format("%d-%m-%Y"),
        booking.slot_label()
    );

    match action {
        "confirm" => {
            let updated = {
                let db = state.db.lock().unwrap();
                queries::set_status(&db, booking_id, BookingStatus::Confirmed)
            };
            match updated {
                Ok(true) => {
                    tracing::info!(booking_id, "booking confirmed");
                    notify_requester(
                        state,
                        booking.requester_id,
                        &format!("Your booking on {when} is confirmed!"),
                        Some(keyboards::main_menu(false)),
                    )
                    .await;
                    state
                        .gateway
                        .edit_message(
                            admin,
                            message_id,
                            &format!("Booking #{booking_id} confirmed."),
                            None,
                        )
                        .await?;
                }
                Ok(false) => {
                    state
                        .gateway
                        .edit_message(
                            admin,
                            message_id,
                            &format!("Booking #{booking_id} not found."),
                            None,
                        )
                        .await?;
                }
                Err(e) if e.is_conflict() => {
                    tracing::warn!(booking_id, %when, "confirmed slot collision");
                    state
                        .gateway
                        .edit_message(
                            admin,
                            message_id,
                            &format!(
                                "Cannot confirm booking #{booking_id}: {when} already has a confirmed booking."
                            ),
                            None,
                        )
                        .await?;
                }
                Err(e) => return Err(e.into()),
            }
        }
        "reject" => {
            let updated = {
                let db = state.db.lock().unwrap();
                queries::set_status(&db, booking_id, BookingStatus::Rejected)?
            };
            if updated {
                tracing::info!(booking_id, "booking rejected");
                notify_requester(
                    state,
                    booking.requester_id,
                    &format!(
                        "Unfortunately your booking on {when} was rejected. \
                         The operator will contact you to sort out the details."
                    ),
                    Some(keyboards::back()),
                )
                .await;
            }
            state
                .gateway
                .edit_message(
                    admin,
                    message_id,
                    &format!("Booking #{booking_id} rejected."),
                    None,
                )
                .await?;
        }
        _ => {}
    }

    Ok(())
}

async fn notify_requester(
    state: &Arc<AppState>,
    requester_id: i64,
    text: &str,
    keyboard: Option<crate::services::messaging::Keyboard>,
) {
    if let Err(e) = state.gateway.send_message(requester_id, text, keyboard).await {
        let e = AppError::Delivery(e.to_string());
        tracing::error!(error = %e, requester = requester_id, "requester notification dropped");
    }
}
