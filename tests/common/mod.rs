//! Shared fixtures: a fake Telegram Bot API and a relay wired to it.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use intake_relay::channels::{Messenger, TelegramMessenger};
use intake_relay::config::{TelegramConfig, UploadConfig};
use intake_relay::relay::{Relay, RelayState, UploadStore, relay_routes};

pub const BOT_TOKEN: &str = "123456:TEST";
pub const CHAT_ID: &str = "-100200300";

/// Maximum time any test is allowed to run before we consider it hung.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One call received by the fake Bot API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Message {
        token: String,
        chat_id: String,
        text: String,
    },
    Document {
        chat_id: String,
        file_name: String,
        caption: String,
        bytes: Vec<u8>,
    },
}

/// Recording stand-in for `api.telegram.org`.
#[derive(Clone, Default)]
pub struct FakeTelegram {
    calls: Arc<Mutex<Vec<Recorded>>>,
    fail_messages: Arc<AtomicBool>,
    fail_caption: Arc<Mutex<Option<String>>>,
    next_id: Arc<AtomicI64>,
}

impl FakeTelegram {
    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    pub fn message_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Recorded::Message { .. }))
            .count()
    }

    pub fn document_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Recorded::Document { .. }))
            .count()
    }

    /// Answer every sendMessage with a 500.
    pub fn fail_messages(&self) {
        self.fail_messages.store(true, Ordering::SeqCst);
    }

    /// Answer sendDocument with a 500 when the caption matches.
    pub fn fail_document(&self, caption: &str) {
        *self.fail_caption.lock().unwrap() = Some(caption.to_string());
    }

    fn ok(&self) -> Response {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Json(json!({ "ok": true, "result": { "message_id": id, "chat": { "id": CHAT_ID } } }))
            .into_response()
    }
}

fn upstream_failure() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "ok": false, "error_code": 500, "description": "Internal Server Error" })),
    )
        .into_response()
}

async fn send_message(
    State(fake): State<FakeTelegram>,
    UrlPath(bot): UrlPath<String>,
    Json(body): Json<Value>,
) -> Response {
    fake.calls.lock().unwrap().push(Recorded::Message {
        token: bot.trim_start_matches("bot").to_string(),
        chat_id: body["chat_id"].as_str().unwrap_or_default().to_string(),
        text: body["text"].as_str().unwrap_or_default().to_string(),
    });
    if fake.fail_messages.load(Ordering::SeqCst) {
        return upstream_failure();
    }
    fake.ok()
}

async fn send_document(State(fake): State<FakeTelegram>, mut multipart: Multipart) -> Response {
    let mut chat_id = String::new();
    let mut caption = String::new();
    let mut file_name = String::new();
    let mut bytes = Vec::new();

    while let Some(part) = multipart.next_field().await.unwrap() {
        match part.name().unwrap_or_default() {
            "chat_id" => chat_id = part.text().await.unwrap(),
            "caption" => caption = part.text().await.unwrap(),
            "document" => {
                file_name = part.file_name().unwrap_or_default().to_string();
                bytes = part.bytes().await.unwrap().to_vec();
            }
            _ => {}
        }
    }

    let fail = fake.fail_caption.lock().unwrap().as_deref() == Some(caption.as_str());
    fake.calls.lock().unwrap().push(Recorded::Document {
        chat_id,
        file_name,
        caption,
        bytes,
    });
    if fail {
        return upstream_failure();
    }
    fake.ok()
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{port}")
}

/// Start the fake Bot API; returns its base URL.
pub async fn start_fake_telegram(fake: FakeTelegram) -> String {
    let app = Router::new()
        .route("/{bot}/sendMessage", post(send_message))
        .route("/{bot}/sendDocument", post(send_document))
        .with_state(fake);
    serve(app).await
}

/// Start a relay that talks to `telegram_base` and stores uploads in `upload_dir`.
pub async fn start_relay(telegram_base: &str, upload_dir: &Path) -> String {
    let telegram = TelegramConfig::new(BOT_TOKEN, CHAT_ID).with_api_base(telegram_base);
    let messenger: Arc<dyn Messenger> = Arc::new(TelegramMessenger::new(&telegram));
    let relay = Relay::new(messenger, CHAT_ID);
    let store = UploadStore::new(&UploadConfig {
        dir: upload_dir.to_path_buf(),
        max_file_bytes: 1024 * 1024,
    });
    serve(relay_routes(RelayState::new(relay, store), 8 * 1024 * 1024)).await
}

/// Fake Bot API plus a relay in front of it.
pub async fn start_stack(upload_dir: &Path) -> (FakeTelegram, String) {
    let fake = FakeTelegram::default();
    let telegram_base = start_fake_telegram(fake.clone()).await;
    let relay_base = start_relay(&telegram_base, upload_dir).await;
    (fake, relay_base)
}

pub fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}
