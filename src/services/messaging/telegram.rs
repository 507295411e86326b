use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{InboundEvent, Keyboard, MessagingGateway};

const API_BASE: &str = "https://api.telegram.org";
const POLL_TIMEOUT_SECS: u32 = 30;

pub struct TelegramGateway {
    token: String,
    client: reqwest::Client,
    // last update id consumed from getUpdates
    offset: AtomicI64,
}

impl TelegramGateway {
    pub fn new(token: String) -> Self {
        Self {
            token,
            client: reqwest::Client::new(),
            offset: AtomicI64::new(0),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> anyhow::Result<T> {
        let url = format!("{API_BASE}/bot{}/{method}", self.token);
        let response: ApiResponse<T> = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("failed to reach gateway method {method}"))?
            .error_for_status()
            .with_context(|| format!("gateway method {method} returned error status"))?
            .json()
            .await
            .with_context(|| format!("failed to decode {method} response"))?;

        if !response.ok {
            anyhow::bail!(
                "gateway method {method} rejected: {}",
                response.description.unwrap_or_default()
            );
        }
        response
            .result
            .ok_or_else(|| anyhow::anyhow!("gateway method {method} returned no result"))
    }

    fn reply_markup(keyboard: &Keyboard) -> serde_json::Value {
        let rows: Vec<Vec<serde_json::Value>> = keyboard
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|b| {
                        serde_json::json!({ "text": b.label, "callback_data": b.action })
                    })
                    .collect()
            })
            .collect();
        serde_json::json!({ "inline_keyboard": rows })
    }

    fn classify(update: Update) -> Option<InboundEvent> {
        if let Some(query) = update.callback_query {
            let message = query.message?;
            return Some(InboundEvent::Action {
                from: query.from.id,
                callback_id: query.id,
                message_id: message.message_id,
                token: query.data.unwrap_or_default(),
            });
        }

        let message = update.message?;
        let from = message.chat.id;

        if let Some(document) = message.document {
            return Some(InboundEvent::Document {
                from,
                file_id: document.file_id,
                file_name: document.file_name.unwrap_or_default(),
            });
        }

        let text = message.text?;
        if let Some(command) = text.strip_prefix('/') {
            let name = command
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .split('@')
                .next()
                .unwrap_or_default()
                .to_string();
            return Some(InboundEvent::Command { from, name });
        }

        Some(InboundEvent::Text { from, text })
    }
}

#[async_trait]
impl MessagingGateway for TelegramGateway {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> anyhow::Result<i64> {
        let mut body = serde_json::json!({ "chat_id": chat_id, "text": text });
        if let Some(keyboard) = &keyboard {
            body["reply_markup"] = Self::reply_markup(keyboard);
        }
        let message: Message = self.call("sendMessage", body).await?;
        Ok(message.message_id)
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> anyhow::Result<()> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
        });
        if let Some(keyboard) = &keyboard {
            body["reply_markup"] = Self::reply_markup(keyboard);
        }
        let _: Message = self.call("editMessageText", body).await?;
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: i64,
        file_name: &str,
        bytes: Vec<u8>,
        caption: &str,
    ) -> anyhow::Result<()> {
        let url = format!("{API_BASE}/bot{}/sendDocument", self.token);
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("document", part);

        self.client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .context("failed to send document")?
            .error_for_status()
            .context("document upload rejected")?;
        Ok(())
    }

    async fn answer_action(&self, callback_id: &str) -> anyhow::Result<()> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                serde_json::json!({ "callback_query_id": callback_id }),
            )
            .await?;
        Ok(())
    }

    async fn fetch_document(&self, file_id: &str) -> anyhow::Result<Vec<u8>> {
        let file: FileInfo = self
            .call("getFile", serde_json::json!({ "file_id": file_id }))
            .await?;
        let path = file
            .file_path
            .ok_or_else(|| anyhow::anyhow!("gateway returned no file path"))?;

        let url = format!("{API_BASE}/file/bot{}/{path}", self.token);
        let bytes = self
            .client
            .get(&url)
            .send()
            .await
            .context("failed to download document")?
            .error_for_status()
            .context("document download rejected")?
            .bytes()
            .await
            .context("failed to read document body")?;
        Ok(bytes.to_vec())
    }

    async fn display_name(&self, user_id: i64) -> anyhow::Result<String> {
        let chat: Chat = self
            .call("getChat", serde_json::json!({ "chat_id": user_id }))
            .await?;

        Ok(match chat.username {
            Some(username) => format!("@{username} ({user_id})"),
            None => format!(
                "{} ({user_id})",
                chat.first_name.unwrap_or_else(|| "Client".to_string())
            ),
        })
    }

    async fn poll_events(&self) -> anyhow::Result<Vec<InboundEvent>> {
        let offset = self.offset.load(Ordering::SeqCst);
        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                serde_json::json!({
                    "offset": offset + 1,
                    "timeout": POLL_TIMEOUT_SECS,
                    "allowed_updates": ["message", "callback_query"],
                }),
            )
            .await?;

        let mut events = vec![];
        for update in updates {
            self.offset.fetch_max(update.update_id, Ordering::SeqCst);
            if let Some(event) = Self::classify(update) {
                events.push(event);
            }
        }
        Ok(events)
    }
}

// ── Wire types ──

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    description: Option<String>,
    result: Option<T>,
}

#[derive(Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
    callback_query: Option<CallbackQuery>,
}

#[derive(Deserialize)]
struct Message {
    message_id: i64,
    chat: Chat,
    text: Option<String>,
    document: Option<DocumentAttachment>,
}

#[derive(Deserialize)]
struct Chat {
    id: i64,
    username: Option<String>,
    first_name: Option<String>,
}

#[derive(Deserialize)]
struct DocumentAttachment {
    file_id: String,
    file_name: Option<String>,
}

#[derive(Deserialize)]
struct FileInfo {
    file_path: Option<String>,
}

#[derive(Deserialize)]
struct Sender {
    id: i64,
}

#[derive(Deserialize)]
struct CallbackQuery {
    id: String,
    from: Sender,
    data: Option<String>,
    message: Option<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(value: serde_json::Value) -> Option<InboundEvent> {
        TelegramGateway::classify(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_classify_command() {
        let event = classify(serde_json::json!({
            "update_id": 1,
            "message": {
                "message_id": 10,
                "chat": { "id": 55 },
                "text": "/send_excel@my_bot now"
            }
        }))
        .unwrap();

        match event {
            InboundEvent::Command { from, name } => {
                assert_eq!(from, 55);
                assert_eq!(name, "send_excel");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_classify_free_text() {
        let event = classify(serde_json::json!({
            "update_id": 1,
            "message": { "message_id": 10, "chat": { "id": 55 }, "text": "Ann" }
        }))
        .unwrap();
        assert!(matches!(event, InboundEvent::Text { from: 55, .. }));
    }

    #[test]
    fn test_classify_callback() {
        let event = classify(serde_json::json!({
            "update_id": 1,
            "callback_query": {
                "id": "abc",
                "from": { "id": 55 },
                "data": "date_2024-01-02",
                "message": { "message_id": 7, "chat": { "id": 55 } }
            }
        }))
        .unwrap();

        match event {
            InboundEvent::Action {
                from,
                message_id,
                token,
                ..
            } => {
                assert_eq!(from, 55);
                assert_eq!(message_id, 7);
                assert_eq!(token, "date_2024-01-02");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_classify_document() {
        let event = classify(serde_json::json!({
            "update_id": 1,
            "message": {
                "message_id": 10,
                "chat": { "id": 55 },
                "document": { "file_id": "f1", "file_name": "schedule.csv" }
            }
        }))
        .unwrap();
        assert!(matches!(event, InboundEvent::Document { from: 55, .. }));
    }

    #[test]
    fn test_classify_ignores_stickers_and_other_noise() {
        assert!(classify(serde_json::json!({
            "update_id": 1,
            "message": { "message_id": 10, "chat": { "id": 55 } }
        }))
        .is_none());
    }
}
