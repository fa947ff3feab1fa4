//! Decoding and validating one `/submit-form` request.

use std::collections::BTreeMap;

use axum::extract::Multipart;
use tracing::{debug, warn};

use super::uploads::{StoreOutcome, StoredUploads, UploadStore};
use crate::error::RelayError;
use crate::form::{Field, NOTIFICATION_FIELDS, RELAY_REQUIRED};

/// The text half of a decoded submission. Files live in [`StoredUploads`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayRequest {
    values: BTreeMap<Field, String>,
}

impl RelayRequest {
    /// Record a text value. The first value seen for a field is kept.
    pub fn insert(&mut self, field: Field, value: impl Into<String>) {
        self.values.entry(field).or_insert_with(|| value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    /// Value of a text field, blank when absent.
    pub fn value(&self, field: Field) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Relay-required fields that are absent or empty.
    pub fn missing_required(&self) -> Vec<Field> {
        RELAY_REQUIRED
            .into_iter()
            .filter(|f| self.value(*f).is_empty())
            .collect()
    }

    pub fn validate(&self) -> Result<(), RelayError> {
        let missing = self.missing_required();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RelayError::Validation { missing })
        }
    }

    /// Review message: every text field, present or blank, then the attached documents.
    pub fn notification_text(&self, uploads: &StoredUploads) -> String {
        let mut lines = vec!["New application submission".to_string(), String::new()];
        for field in NOTIFICATION_FIELDS {
            lines.push(format!("{}: {}", field.label(), self.value(field)));
        }

        let attached: Vec<&str> = Field::FILES
            .into_iter()
            .filter(|f| uploads.contains(*f))
            .map(Field::label)
            .collect();
        lines.push(String::new());
        if attached.is_empty() {
            lines.push("Documents: none".to_string());
        } else {
            lines.push(format!("Documents: {}", attached.join(", ")));
        }

        lines.join("\n")
    }
}

/// Read every part of the body. File parts are streamed to `store` and tracked in `uploads`.
///
/// Unknown parts are skipped. File parts with no file name, no content or
/// over the size cap count as absent. Only the first part per field is used.
pub async fn decode(
    multipart: &mut Multipart,
    store: &UploadStore,
    uploads: &mut StoredUploads,
) -> Result<RelayRequest, RelayError> {
    let mut request = RelayRequest::default();

    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(RelayError::from)?
    {
        let Some(name) = part.name().map(str::to_owned) else {
            continue;
        };
        let Some(field) = Field::from_wire_name(&name) else {
            debug!(part = %name, "Ignoring unknown form part");
            continue;
        };

        if !field.is_file() {
            let value = part
                .text()
                .await
                .map_err(RelayError::from)?;
            request.insert(field, value);
            continue;
        }

        if uploads.contains(field) {
            debug!(field = %field, "Ignoring repeated file part");
            continue;
        }
        let file_name = part.file_name().unwrap_or_default().to_owned();
        if file_name.is_empty() {
            debug!(field = %field, "File part without a file name; treating as absent");
            continue;
        }

        match store.write_capped(field, &file_name, part, uploads).await? {
            StoreOutcome::Stored => {}
            StoreOutcome::TooLarge { limit } => {
                warn!(field = %field, limit, "Upload exceeds size limit; treating as absent");
            }
            StoreOutcome::Empty => {
                debug!(field = %field, "Empty upload; treating as absent");
            }
        }
    }

    Ok(request)
}
