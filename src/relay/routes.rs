//! HTTP endpoints for the submission relay.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use super::dispatch::{DispatchPlan, Relay, RelayReport};
use super::request;
use super::uploads::{StoredUploads, UploadStore};
use crate::error::RelayError;

pub const SUCCESS_MESSAGE: &str = "Form submitted successfully.";

/// Shared state for relay routes.
#[derive(Clone)]
pub struct RelayState {
    pub relay: Arc<Relay>,
    pub store: Arc<UploadStore>,
}

impl RelayState {
    pub fn new(relay: Relay, store: UploadStore) -> Self {
        Self {
            relay: Arc::new(relay),
            store: Arc::new(store),
        }
    }
}

/// Build the relay router. Accepts cross-origin POSTs from anywhere.
pub fn relay_routes(state: RelayState, max_body_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/submit-form", post(submit_form))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors)
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "intake-relay"
    }))
}

// ── Submission ──────────────────────────────────────────────────────────

/// POST /submit-form
///
/// Decode, validate, notify, relay documents, then delete every stored
/// upload before answering, whatever the outcome.
async fn submit_form(
    State(state): State<RelayState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected non-multipart submission");
            return RelayError::Multipart(rejection.body_text()).into_response();
        }
    };

    let mut uploads = state.store.begin();
    let outcome = relay_submission(&state, &mut multipart, &mut uploads).await;
    let cleanup = uploads.cleanup().await;
    if cleanup.failed > 0 {
        warn!(
            removed = cleanup.removed,
            failed = cleanup.failed,
            "Some uploads could not be deleted"
        );
    }

    match outcome {
        Ok(report) => {
            info!(
                documents = report.documents.len(),
                removed = cleanup.removed,
                "Form submission relayed"
            );
            (
                StatusCode::OK,
                Json(serde_json::json!({ "message": SUCCESS_MESSAGE })),
            )
                .into_response()
        }
        Err(e) => {
            match &e {
                RelayError::Validation { .. }
                | RelayError::Multipart(_)
                | RelayError::BodyTooLarge(_) => {
                    warn!(error = %e, "Submission rejected")
                }
                _ => tracing::error!(error = %e, "Submission failed"),
            }
            e.into_response()
        }
    }
}

async fn relay_submission(
    state: &RelayState,
    multipart: &mut Multipart,
    uploads: &mut StoredUploads,
) -> Result<RelayReport, RelayError> {
    let request = request::decode(multipart, &state.store, uploads).await?;
    request.validate()?;

    info!(
        documents = uploads.len(),
        "Submission decoded; notifying reviewers"
    );
    let plan = DispatchPlan::build(&request, uploads);
    state.relay.execute(&plan).await
}
