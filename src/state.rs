use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::models::SessionStore;
use crate::services::messaging::MessagingGateway;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub gateway: Box<dyn MessagingGateway>,
    pub sessions: SessionStore,
    /// Chats currently inside the schedule-upload dialog.
    pub upload_dialogs: Mutex<HashSet<i64>>,
}

impl AppState {
    pub fn is_admin(&self, user_id: i64) -> bool {
        user_id == self.config.admin_chat_id
    }
}
