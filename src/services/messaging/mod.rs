pub mod telegram;

use async_trait::async_trait;
use serde::Serialize;

/// One button of an inline keyboard: a visible label and the action token
/// delivered back when it is pressed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: String,
}

pub fn button(label: impl Into<String>, action: impl Into<String>) -> Button {
    Button {
        label: label.into(),
        action: action.into(),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        self.rows.push(buttons);
        self
    }
}

/// Inbound gateway traffic, already reduced to what the dispatcher needs.
/// `from` doubles as the chat to reply to.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    Command {
        from: i64,
        name: String,
    },
    Action {
        from: i64,
        callback_id: String,
        message_id: i64,
        token: String,
    },
    Text {
        from: i64,
        text: String,
    },
    Document {
        from: i64,
        file_id: String,
        file_name: String,
    },
}

impl InboundEvent {
    pub fn sender(&self) -> i64 {
        match self {
            InboundEvent::Command { from, .. }
            | InboundEvent::Action { from, .. }
            | InboundEvent::Text { from, .. }
            | InboundEvent::Document { from, .. } => *from,
        }
    }
}

#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Sends a text message, returning the gateway's message id.
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> anyhow::Result<i64>;

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> anyhow::Result<()>;

    async fn send_document(
        &self,
        chat_id: i64,
        file_name: &str,
        bytes: Vec<u8>,
        caption: &str,
    ) -> anyhow::Result<()>;

    /// Acknowledges an interactive action so the client stops spinning.
    async fn answer_action(&self, callback_id: &str) -> anyhow::Result<()>;

    async fn fetch_document(&self, file_id: &str) -> anyhow::Result<Vec<u8>>;

    /// Resolves a user id to a human-readable display profile.
    async fn display_name(&self, user_id: i64) -> anyhow::Result<String>;

    /// Blocks until the next batch of inbound events is available.
    async fn poll_events(&self) -> anyhow::Result<Vec<InboundEvent>>;
}
