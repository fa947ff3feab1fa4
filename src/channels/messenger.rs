//! Outbound messaging abstraction.
//!
//! The relay only needs two call shapes from the review channel: post a
//! text message and upload a document. Keeping them behind a trait lets
//! tests count dispatches without a network.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// Delivery metadata returned by the messaging API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReceipt {
    /// One id per delivered message; long text may be delivered in parts.
    pub message_ids: Vec<i64>,
}

/// A document stored on local disk, ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingDocument {
    pub path: PathBuf,
    /// Name shown to the reviewer.
    pub file_name: String,
    pub caption: Option<String>,
}

/// A destination for review notifications.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Post a text message to `chat_id`.
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<DispatchReceipt, DispatchError>;

    /// Upload a document to `chat_id`.
    async fn send_document(
        &self,
        chat_id: &str,
        document: &OutgoingDocument,
    ) -> Result<DispatchReceipt, DispatchError>;
}
