use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bot_token: String,
    pub admin_chat_id: i64,
    pub database_url: String,
    pub reminder_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            bot_token: env::var("BOT_TOKEN").unwrap_or_default(),
            admin_chat_id: env::var("ADMIN_CHAT_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "slotbook.db".to_string()),
            reminder_interval_secs: env::var("REMINDER_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        }
    }
}
