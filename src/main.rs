use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use slotbook::config::AppConfig;
use slotbook::db;
use slotbook::handlers::dispatch;
use slotbook::models::SessionStore;
use slotbook::services::messaging::telegram::TelegramGateway;
use slotbook::services::reminders;
use slotbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    anyhow::ensure!(!config.bot_token.is_empty(), "BOT_TOKEN must be set");
    anyhow::ensure!(config.admin_chat_id != 0, "ADMIN_CHAT_ID must be set");

    let conn = db::init_db(&config.database_url)?;
    let gateway = TelegramGateway::new(config.bot_token.clone());

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config,
        gateway: Box::new(gateway),
        sessions: SessionStore::new(),
        upload_dialogs: Mutex::new(HashSet::new()),
    });

    tokio::spawn(reminders::run(Arc::clone(&state)));

    tracing::info!("booking assistant started");

    loop {
        match state.gateway.poll_events().await {
            Ok(events) => {
                for event in events {
                    dispatch::handle_event(&state, event).await;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to poll gateway");
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            }
        }
    }
}
