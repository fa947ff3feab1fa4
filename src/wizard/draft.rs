//! In-memory form state held by the wizard until submission.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::WizardError;
use crate::form::{self, EMAIL_INVALID_MESSAGE, Field, FieldKind};

/// A file chosen for one of the upload fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Read a file from disk, naming it after its last path component.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();
        Ok(Self::new(file_name, bytes))
    }
}

/// A value for [`SubmissionDraft::set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    /// `None` clears a previous selection.
    File(Option<Attachment>),
}

impl FieldValue {
    fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::File(_) => FieldKind::File,
        }
    }
}

/// Every value entered so far, across all steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionDraft {
    text: BTreeMap<Field, String>,
    files: BTreeMap<Field, Attachment>,
}

impl SubmissionDraft {
    /// Replace a field's value. A file field holds one attachment; the latest wins.
    pub fn set(&mut self, field: Field, value: FieldValue) -> Result<(), WizardError> {
        if value.kind() != field.kind() {
            return Err(WizardError::KindMismatch {
                field,
                expected: match field.kind() {
                    FieldKind::Text => "text",
                    FieldKind::File => "file",
                },
            });
        }
        match value {
            FieldValue::Text(text) => {
                self.text.insert(field, text);
            }
            FieldValue::File(Some(attachment)) => {
                self.files.insert(field, attachment);
            }
            FieldValue::File(None) => {
                self.files.remove(&field);
            }
        }
        Ok(())
    }

    /// Text value, blank when never set.
    pub fn text(&self, field: Field) -> &str {
        self.text.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn file(&self, field: Field) -> Option<&Attachment> {
        self.files.get(&field)
    }

    /// Present and non-empty, judged by the field's kind.
    pub fn is_filled(&self, field: Field) -> bool {
        match field.kind() {
            FieldKind::Text => !self.text(field).is_empty(),
            FieldKind::File => self.files.contains_key(&field),
        }
    }

    /// Why `field` would block its step, if it would.
    pub fn field_error(&self, field: Field) -> Option<String> {
        if !self.is_filled(field) {
            return Some(field.required_message());
        }
        if field == Field::Email && !form::is_plausible_email(self.text(field)) {
            return Some(EMAIL_INVALID_MESSAGE.to_string());
        }
        None
    }

    /// All attached files in form order.
    pub fn attachments(&self) -> impl Iterator<Item = (Field, &Attachment)> {
        self.files.iter().map(|(f, a)| (*f, a))
    }

    /// True when nothing has been entered.
    pub fn is_blank(&self) -> bool {
        self.text.values().all(String::is_empty) && self.files.is_empty()
    }
}
