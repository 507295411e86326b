use std::sync::Arc;

use chrono::Local;

use crate::db::queries;
use crate::errors::AppError;
use crate::services::schedule_file;
use crate::state::AppState;

/// Sends the editable two-week template as a document.
pub async fn export(state: &Arc<AppState>, from: i64) -> anyhow::Result<()> {
    let contents = schedule_file::render_template(Local::now().date_naive());
    state
        .gateway
        .send_document(
            from,
            schedule_file::FILE_NAME,
            contents.into_bytes(),
            "Schedule template for the current and next week.",
        )
        .await?;
    Ok(())
}

pub async fn begin_import(state: &Arc<AppState>, from: i64) -> anyhow::Result<()> {
    state.upload_dialogs.lock().unwrap().insert(from);
    state
        .gateway
        .send_message(
            from,
            "Send the schedule file (CSV). Use /cancel to abort.",
            None,
        )
        .await?;
    Ok(())
}

/// Leaves the upload dialog; returns whether one was open.
pub fn cancel_import(state: &Arc<AppState>, from: i64) -> bool {
    state.upload_dialogs.lock().unwrap().remove(&from)
}

/// A document arrived. Only chats inside the upload dialog are served; the
/// stored schedule is replaced only after the whole file decodes and
/// validates.
pub async fn receive_file(
    state: &Arc<AppState>,
    from: i64,
    file_id: &str,
    file_name: &str,
) -> anyhow::Result<()> {
    if !state.upload_dialogs.lock().unwrap().contains(&from) {
        tracing::debug!(requester = from, file = file_name, "unsolicited document ignored");
        return Ok(());
    }

    let bytes = match state.gateway.fetch_document(file_id).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, file = file_name, "failed to download schedule file");
            state
                .gateway
                .send_message(from, "Could not download the file. Please send it again.", None)
                .await?;
            return Ok(());
        }
    };

    cancel_import(state, from);

    let contents = match String::from_utf8(bytes) {
        Ok(contents) => contents,
        Err(_) => {
            state
                .gateway
                .send_message(
                    from,
                    "The file is not readable text. The stored schedule was not changed.",
                    None,
                )
                .await?;
            return Ok(());
        }
    };

    let rows = match schedule_file::parse(&contents) {
        Ok(rows) => rows,
        Err(AppError::Validation(detail)) => {
            tracing::warn!(file = file_name, detail, "schedule import rejected");
            state
                .gateway
                .send_message(
                    from,
                    &format!("Schedule rejected: {detail}. The stored schedule was not changed."),
                    None,
                )
                .await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let replaced = {
        let mut db = state.db.lock().unwrap();
        queries::replace_schedule(&mut db, &rows)
    };
    match replaced {
        Ok(()) => {
            tracing::info!(days = rows.len(), "schedule replaced");
            state
                .gateway
                .send_message(
                    from,
                    &format!("Schedule updated: {} days loaded.", rows.len()),
                    None,
                )
                .await?;
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to store schedule");
            state
                .gateway
                .send_message(
                    from,
                    "Could not store the schedule. The previous schedule is unchanged.",
                    None,
                )
                .await?;
        }
    }
    Ok(())
}
