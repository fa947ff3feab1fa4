//! Outbound dispatch for one accepted submission.
//!
//! One text notification goes first and must succeed. The documents then go
//! out concurrently; every upload is awaited even when another one fails.
//! Nothing already delivered is retracted, so a failure here can leave a
//! partial record in the review chat.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, info, warn};

use super::request::RelayRequest;
use super::uploads::StoredUploads;
use crate::channels::{DispatchReceipt, Messenger, OutgoingDocument};
use crate::error::RelayError;
use crate::form::Field;

/// Every outbound call derived from one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPlan {
    pub text: String,
    pub documents: Vec<(Field, OutgoingDocument)>,
}

impl DispatchPlan {
    pub fn build(request: &RelayRequest, uploads: &StoredUploads) -> Self {
        let documents = Field::FILES
            .into_iter()
            .filter_map(|field| {
                uploads.get(field).map(|upload| {
                    (
                        field,
                        OutgoingDocument {
                            path: upload.path.clone(),
                            file_name: upload.original_name.clone(),
                            caption: Some(field.label().to_string()),
                        },
                    )
                })
            })
            .collect();

        Self {
            text: request.notification_text(uploads),
            documents,
        }
    }
}

/// What was delivered for a fully successful request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReport {
    pub documents: Vec<(Field, DispatchReceipt)>,
}

/// Sends dispatch plans to one fixed destination.
pub struct Relay {
    messenger: Arc<dyn Messenger>,
    chat_id: String,
}

impl Relay {
    pub fn new(messenger: Arc<dyn Messenger>, chat_id: impl Into<String>) -> Self {
        Self {
            messenger,
            chat_id: chat_id.into(),
        }
    }

    pub async fn execute(&self, plan: &DispatchPlan) -> Result<RelayReport, RelayError> {
        self.messenger
            .send_text(&self.chat_id, &plan.text)
            .await
            .map_err(|e| {
                error!(channel = self.messenger.name(), error = %e, "Notification dispatch failed");
                RelayError::Notify(e)
            })?;

        let results = join_all(plan.documents.iter().map(|(field, document)| async move {
            let result = self.messenger.send_document(&self.chat_id, document).await;
            (*field, result)
        }))
        .await;

        let attempted = results.len();
        let mut delivered = Vec::with_capacity(attempted);
        let mut failed = Vec::new();
        for (field, result) in results {
            match result {
                Ok(receipt) => delivered.push((field, receipt)),
                Err(e) => {
                    error!(
                        channel = self.messenger.name(),
                        field = %field,
                        error = %e,
                        "Document dispatch failed"
                    );
                    failed.push(field);
                }
            }
        }

        if !failed.is_empty() {
            // The notification and `delivered` documents stay in the chat.
            warn!(
                attempted,
                delivered = delivered.len(),
                failed = failed.len(),
                "Submission partially delivered"
            );
            return Err(RelayError::FileRelay { failed, attempted });
        }

        info!(documents = attempted, "Submission relayed");
        Ok(RelayReport {
            documents: delivered,
        })
    }
}
