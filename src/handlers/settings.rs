use std::sync::Arc;

use crate::db::queries;
use crate::keyboards;
use crate::models::ScheduleMode;
use crate::state::AppState;

pub async fn show(state: &Arc<AppState>, from: i64, message_id: i64) -> anyhow::Result<()> {
    state
        .gateway
        .edit_message(
            from,
            message_id,
            "Choose a setting:",
            Some(keyboards::settings_menu()),
        )
        .await?;
    Ok(())
}

pub async fn show_schedule(
    state: &Arc<AppState>,
    from: i64,
    message_id: i64,
) -> anyhow::Result<()> {
    let mode = {
        let db = state.db.lock().unwrap();
        queries::schedule_mode(&db)?
    };

    state
        .gateway
        .edit_message(
            from,
            message_id,
            &format!("Current schedule mode: {}.\nChoose an action:", describe(mode)),
            Some(keyboards::schedule_mode_menu(mode)),
        )
        .await?;
    Ok(())
}

pub async fn set_mode(
    state: &Arc<AppState>,
    from: i64,
    message_id: i64,
    mode: ScheduleMode,
) -> anyhow::Result<()> {
    {
        let db = state.db.lock().unwrap();
        queries::set_schedule_mode(&db, mode)?;
    }
    tracing::info!(mode = mode.as_str(), "schedule mode changed");

    let text = match mode {
        ScheduleMode::Default => "Standard schedule enabled.",
        ScheduleMode::Excel => "Spreadsheet schedule enabled.",
    };
    state
        .gateway
        .edit_message(from, message_id, text, Some(keyboards::back()))
        .await?;
    Ok(())
}

fn describe(mode: ScheduleMode) -> &'static str {
    match mode {
        ScheduleMode::Default => "standard hours",
        ScheduleMode::Excel => "imported spreadsheet",
    }
}
