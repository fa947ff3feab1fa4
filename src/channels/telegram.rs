//! Telegram Bot API messenger.
//!
//! Posts review notifications with `sendMessage` and uploads documents
//! with `sendDocument`. The bot token is part of every URL, so errors that
//! leave this module never carry the URL.

use std::borrow::Cow;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::channels::messenger::{DispatchReceipt, Messenger, OutgoingDocument};
use crate::config::TelegramConfig;
use crate::error::DispatchError;

/// Maximum message length for Telegram's sendMessage API.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

/// Appended when a notification is cut to fit one message.
const TRUNCATION_MARKER: &str = "\n[truncated]";

/// Longest slice of an unparseable response body kept for the logs.
const MAX_ERROR_BODY: usize = 512;

/// Messenger backed by the Telegram Bot API.
pub struct TelegramMessenger {
    bot_token: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl TelegramMessenger {
    pub fn new(config: &TelegramConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: &TelegramConfig, client: reqwest::Client) -> Self {
        Self {
            bot_token: config.bot_token.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.api_base,
            self.bot_token.expose_secret()
        )
    }

    /// Send one plain-text message (≤4096 chars).
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<i64, DispatchError> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });

        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| http_error("sendMessage", e))?;

        read_api_response("sendMessage", resp).await
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    fn name(&self) -> &str {
        "telegram"
    }

    /// Always exactly one `sendMessage` call; overlong text is truncated.
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<DispatchReceipt, DispatchError> {
        let message = fit_message(text, TELEGRAM_MAX_MESSAGE_LENGTH);
        if let Cow::Owned(_) = message {
            tracing::warn!(
                chars = text.chars().count(),
                limit = TELEGRAM_MAX_MESSAGE_LENGTH,
                "Notification truncated to fit one message"
            );
        }
        let id = self.send_message(chat_id, &message).await?;
        tracing::info!(chat_id, "Telegram message sent");
        Ok(DispatchReceipt {
            message_ids: vec![id],
        })
    }

    async fn send_document(
        &self,
        chat_id: &str,
        document: &OutgoingDocument,
    ) -> Result<DispatchReceipt, DispatchError> {
        let file_bytes =
            tokio::fs::read(&document.path)
                .await
                .map_err(|source| DispatchError::Io {
                    path: document.path.display().to_string(),
                    source,
                })?;
        let part = Part::bytes(file_bytes).file_name(document.file_name.clone());

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", part);

        if let Some(cap) = &document.caption {
            form = form.text("caption", cap.clone());
        }

        let resp = self
            .client
            .post(self.api_url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| http_error("sendDocument", e))?;

        let id = read_api_response("sendDocument", resp).await?;
        tracing::info!(
            chat_id,
            caption = document.caption.as_deref().unwrap_or(""),
            "Telegram document sent"
        );
        Ok(DispatchReceipt {
            message_ids: vec![id],
        })
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    ok: bool,
    #[serde(default)]
    result: Option<ApiMessage>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message_id: i64,
}

fn http_error(method: &'static str, e: reqwest::Error) -> DispatchError {
    DispatchError::Http {
        method,
        source: e.without_url(),
    }
}

async fn read_api_response(
    method: &'static str,
    resp: reqwest::Response,
) -> Result<i64, DispatchError> {
    let status = resp.status();
    let body = resp.text().await.map_err(|e| http_error(method, e))?;
    parse_api_response(method, status.as_u16(), &body)
}

/// Interpret a Bot API reply. Success needs a 2xx status, `ok: true` and a message id.
fn parse_api_response(method: &'static str, status: u16, body: &str) -> Result<i64, DispatchError> {
    let envelope = serde_json::from_str::<ApiEnvelope>(body).ok();
    match envelope {
        Some(ApiEnvelope {
            ok: true,
            result: Some(message),
            ..
        }) if (200..300).contains(&status) => Ok(message.message_id),
        Some(envelope) => Err(DispatchError::Api {
            method,
            status,
            description: envelope
                .description
                .unwrap_or_else(|| "no description".to_string()),
        }),
        None => Err(DispatchError::Api {
            method,
            status,
            description: body.chars().take(MAX_ERROR_BODY).collect(),
        }),
    }
}

/// Cut `text` to at most `max_len` characters, ending in [`TRUNCATION_MARKER`] when cut.
fn fit_message(text: &str, max_len: usize) -> Cow<'_, str> {
    if text.chars().count() <= max_len {
        return Cow::Borrowed(text);
    }
    let keep = max_len.saturating_sub(TRUNCATION_MARKER.chars().count());
    let end = text
        .char_indices()
        .nth(keep)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    Cow::Owned(format!("{}{TRUNCATION_MARKER}", &text[..end]))
}

// ── Tests ───────────────────────────────────────────────────────────
