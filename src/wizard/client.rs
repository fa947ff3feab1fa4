//! HTTP client that posts a completed draft to the relay.

use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};

use super::draft::SubmissionDraft;
use crate::error::SubmitError;
use crate::form::Field;

pub const SUBMIT_PATH: &str = "/submit-form";
pub const ACCEPTED_FALLBACK: &str = "Form submitted successfully";

/// Longest plain-text reply surfaced to the applicant.
const MAX_TEXT_REPLY: usize = 200;

/// A relay response body, parsed according to its declared content type.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayReply {
    Json(serde_json::Value),
    Text(String),
}

impl RelayReply {
    pub fn parse(content_type: Option<&str>, body: &str) -> Self {
        let is_json = content_type.is_some_and(|ct| ct.contains("application/json"));
        if is_json {
            if let Ok(value) = serde_json::from_str(body) {
                return Self::Json(value);
            }
        }
        Self::Text(body.to_string())
    }

    /// `key` from a JSON object, or the trimmed text of a plain reply.
    fn message(&self, key: &str) -> Option<String> {
        match self {
            Self::Json(value) => value.get(key).and_then(|v| v.as_str()).map(str::to_owned),
            Self::Text(text) => {
                let text = text.trim();
                (!text.is_empty()).then(|| text.chars().take(MAX_TEXT_REPLY).collect())
            }
        }
    }
}

/// Client for the relay's `/submit-form` endpoint.
#[derive(Debug, Clone)]
pub struct RelayClient {
    client: reqwest::Client,
    endpoint: String,
}

impl RelayClient {
    /// `base_url` is the relay origin, e.g. `http://localhost:5002`.
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: format!("{}{SUBMIT_PATH}", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Every text field (blank ones included) plus every attached file.
    pub fn build_form(draft: &SubmissionDraft) -> Result<Form, SubmitError> {
        let mut form = Form::new();
        for field in Field::ALL.into_iter().filter(|f| !f.is_file()) {
            form = form.text(field.wire_name(), draft.text(field).to_string());
        }
        for (field, attachment) in draft.attachments() {
            let part = Part::bytes(attachment.bytes.clone()).file_name(attachment.file_name.clone());
            let part = match &attachment.content_type {
                Some(ct) => part.mime_str(ct)?,
                None => part,
            };
            form = form.part(field.wire_name(), part);
        }
        Ok(form)
    }

    /// POST the draft. Returns the relay's confirmation message.
    pub async fn submit(&self, draft: &SubmissionDraft) -> Result<String, SubmitError> {
        let form = Self::build_form(draft)?;
        let resp = self.client.post(&self.endpoint).multipart(form).send().await?;

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = resp.text().await?;
        let reply = RelayReply::parse(content_type.as_deref(), &body);

        if status.is_success() {
            let message = match &reply {
                RelayReply::Json(_) => reply.message("message"),
                RelayReply::Text(_) => None,
            };
            Ok(message.unwrap_or_else(|| ACCEPTED_FALLBACK.to_string()))
        } else {
            tracing::warn!(status = status.as_u16(), "Relay rejected submission");
            Err(SubmitError::Rejected {
                status: status.as_u16(),
                message: reply.message("error"),
            })
        }
    }
}
