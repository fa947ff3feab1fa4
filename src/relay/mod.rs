//! Submission relay: the stateless `/submit-form` endpoint.
//!
//! A request is decoded (uploads land in a transient directory), checked for
//! the relay-required fields, summarised in one text notification, followed
//! by one document upload per attached file. Stored uploads are deleted
//! before the response is sent, whatever happened upstream.

pub mod dispatch;
pub mod request;
pub mod routes;
pub mod uploads;

pub use dispatch::{DispatchPlan, Relay, RelayReport};
pub use request::RelayRequest;
pub use routes::{RelayState, SUCCESS_MESSAGE, relay_routes};
pub use uploads::{CleanupReport, StoredUpload, StoredUploads, UploadStore};
