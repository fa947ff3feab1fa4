//! Error types for the intake relay.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::form::Field;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// One failed outbound call to the messaging API.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("HTTP error calling {method}: {source}")]
    Http {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} rejected with status {status}: {description}")]
    Api {
        method: &'static str,
        status: u16,
        description: String,
    },

    #[error("Failed to read upload {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome taxonomy of one relay request.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Missing required fields: {}", join_fields(.missing))]
    Validation { missing: Vec<Field> },

    #[error("Malformed multipart body: {0}")]
    Multipart(String),

    #[error("Request body over the size limit: {0}")]
    BodyTooLarge(String),

    #[error("Notification dispatch failed: {0}")]
    Notify(#[source] DispatchError),

    #[error("{} of {attempted} document dispatches failed", .failed.len())]
    FileRelay { failed: Vec<Field>, attempted: usize },

    #[error("Upload storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::Multipart(_) => StatusCode::BAD_REQUEST,
            Self::BodyTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Notify(_) | Self::FileRelay { .. } | Self::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message returned to the caller. Upstream detail stays in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "Missing required form fields.",
            Self::Multipart(_) => "Malformed form submission.",
            Self::BodyTooLarge(_) => "Submission too large.",
            Self::Notify(_) => "Error sending message to Telegram",
            Self::FileRelay { .. } => "Error sending files to Telegram",
            Self::Storage(_) => "Internal Server Error",
        }
    }
}

impl From<MultipartError> for RelayError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::BodyTooLarge(e.body_text())
        } else {
            Self::Multipart(e.body_text())
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(serde_json::json!({ "error": self.public_message() })),
        )
            .into_response()
    }
}

/// Wizard misuse.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("Field {field} expects a {expected} value")]
    KindMismatch { field: Field, expected: &'static str },

    #[error("Field {field} is not editable on step {current}")]
    NotOnStep { field: Field, current: u8 },

    #[error("Submission is only possible from the final step (current step {current})")]
    NotAtFinalStep { current: u8 },

    #[error("Current step has {0} incomplete field(s)")]
    Incomplete(usize),
}

/// Failure to get a submission accepted by the relay.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Wizard(#[from] WizardError),

    #[error("Relay rejected submission with status {status}")]
    Rejected {
        status: u16,
        message: Option<String>,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

pub const SUBMIT_FAILED_FALLBACK: &str = "Form submission failed";
pub const UNEXPECTED_FALLBACK: &str = "An unexpected error occurred. Please try again.";

impl SubmitError {
    /// Text suitable for showing to the applicant.
    pub fn user_message(&self) -> String {
        match self {
            Self::Wizard(e) => e.to_string(),
            Self::Rejected { message, .. } => message
                .clone()
                .unwrap_or_else(|| SUBMIT_FAILED_FALLBACK.to_string()),
            Self::Transport(_) => UNEXPECTED_FALLBACK.to_string(),
        }
    }
}

fn join_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| f.wire_name())
        .collect::<Vec<_>>()
        .join(", ")
}
