use std::sync::Arc;

use crate::handlers::{admin, records, schedule, settings};
use crate::keyboards;
use crate::models::ScheduleMode;
use crate::services::conversation;
use crate::services::messaging::InboundEvent;
use crate::state::AppState;

/// Top-level inbound funnel. Errors never escape: they are logged and the
/// requester gets a generic retry message.
pub async fn handle_event(state: &Arc<AppState>, event: InboundEvent) {
    let from = event.sender();
    if let Err(e) = route(state, event).await {
        tracing::error!(error = %e, requester = from, "failed to handle event");
        let _ = state
            .gateway
            .send_message(from, "Something went wrong. Please try again.", None)
            .await;
    }
}

async fn route(state: &Arc<AppState>, event: InboundEvent) -> anyhow::Result<()> {
    match event {
        InboundEvent::Command { from, name } => command(state, from, &name).await,
        InboundEvent::Action {
            from,
            callback_id,
            message_id,
            token,
        } => {
            if let Err(e) = state.gateway.answer_action(&callback_id).await {
                tracing::debug!(error = %e, "failed to acknowledge action");
            }
            action(state, from, message_id, &token).await
        }
        InboundEvent::Text { from, text } => conversation::text_input(state, from, &text).await,
        InboundEvent::Document {
            from,
            file_id,
            file_name,
        } => schedule::receive_file(state, from, &file_id, &file_name).await,
    }
}

async fn command(state: &Arc<AppState>, from: i64, name: &str) -> anyhow::Result<()> {
    match name {
        "start" => {
            state
                .gateway
                .send_message(
                    from,
                    "Welcome! Choose an action:",
                    Some(keyboards::main_menu(state.is_admin(from))),
                )
                .await?;
            Ok(())
        }
        "send_excel" => {
            if require_admin(state, from).await? {
                schedule::export(state, from).await?;
            }
            Ok(())
        }
        "get_excel" => {
            if require_admin(state, from).await? {
                schedule::begin_import(state, from).await?;
            }
            Ok(())
        }
        "cancel" => {
            if schedule::cancel_import(state, from) {
                state
                    .gateway
                    .send_message(from, "Schedule upload cancelled.", None)
                    .await?;
                Ok(())
            } else {
                conversation::cancel(state, from, None).await
            }
        }
        other => {
            tracing::debug!(command = other, "unknown command ignored");
            Ok(())
        }
    }
}

async fn action(
    state: &Arc<AppState>,
    from: i64,
    message_id: i64,
    token: &str,
) -> anyhow::Result<()> {
    match token {
        "start_registration" => conversation::start_registration(state, from, message_id).await,
        "view_records" => records::menu(state, from, message_id).await,
        "cancel" => conversation::cancel(state, from, Some(message_id)).await,
        "settings" => {
            if require_admin(state, from).await? {
                settings::show(state, from, message_id).await?;
            }
            Ok(())
        }
        "settings_schedule" => {
            if require_admin(state, from).await? {
                settings::show_schedule(state, from, message_id).await?;
            }
            Ok(())
        }
        "enable_standard_schedule" => {
            if require_admin(state, from).await? {
                settings::set_mode(state, from, message_id, ScheduleMode::Default).await?;
            }
            Ok(())
        }
        "enable_excel_schedule" => {
            if require_admin(state, from).await? {
                settings::set_mode(state, from, message_id, ScheduleMode::Excel).await?;
            }
            Ok(())
        }
        t if t.starts_with("date_") => {
            conversation::pick_date(state, from, message_id, &t["date_".len()..]).await
        }
        t if t.starts_with("time_") => {
            conversation::pick_time(state, from, message_id, &t["time_".len()..]).await
        }
        t if t.starts_with("confirm_") || t.starts_with("reject_") => {
            // decision prompts only ever live in the admin chat; a forged
            // press from anywhere else is dropped
            if state.is_admin(from) {
                admin::handle_decision(state, message_id, t).await?;
            }
            Ok(())
        }
        t if t.starts_with("view_") => {
            if t.ends_with("_admin") && !require_admin(state, from).await? {
                return Ok(());
            }
            records::view(state, from, message_id, t).await
        }
        other => {
            tracing::debug!(token = other, "unhandled action token");
            Ok(())
        }
    }
}

async fn require_admin(state: &Arc<AppState>, from: i64) -> anyhow::Result<bool> {
    if state.is_admin(from) {
        return Ok(true);
    }
    state
        .gateway
        .send_message(
            from,
            "This action is only available to the administrator.",
            None,
        )
        .await?;
    Ok(false)
}
