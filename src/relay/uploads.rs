//! Transient storage for uploaded documents.
//!
//! Files live on disk only for the duration of one request: written while
//! the multipart body is decoded, read when relayed, deleted before the
//! response goes out. [`StoredUploads`] owns every path written for a
//! request and removes them on `cleanup`, or on drop if cleanup never ran.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::UploadConfig;
use crate::error::RelayError;
use crate::form::Field;

/// Longest extension carried over from the applicant's file name.
const MAX_EXTENSION_LEN: usize = 16;

/// A document written to the upload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub field: Field,
    pub path: PathBuf,
    /// File name as given by the applicant, without directories.
    pub original_name: String,
    pub size: u64,
}

/// Result of storing one file part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    Stored,
    /// Over the per-file cap; nothing retained.
    TooLarge { limit: u64 },
    /// Zero bytes; nothing retained.
    Empty,
}

/// Counts from one cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub already_gone: usize,
    pub failed: usize,
}

/// The upload directory plus its limits.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_file_bytes: u64,
}

impl UploadStore {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            max_file_bytes: config.max_file_bytes,
        }
    }

    /// Create the upload directory if needed.
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    /// Remove files left behind by an earlier process. Returns how many were removed.
    pub async fn sweep(&self) -> std::io::Result<usize> {
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            match remove_upload(&entry.path()).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => warn!(path = %entry.path().display(), error = %e, "Failed to sweep stale upload"),
            }
        }
        Ok(removed)
    }

    /// Start tracking uploads for one request.
    pub fn begin(&self) -> StoredUploads {
        StoredUploads::default()
    }

    /// Stream one file part to disk, enforcing the per-file cap.
    ///
    /// The path is tracked in `uploads` from the moment it is created, so a
    /// failure halfway through still leaves it for cleanup.
    pub async fn write_capped<S, E>(
        &self,
        field: Field,
        original_name: &str,
        chunks: S,
        uploads: &mut StoredUploads,
    ) -> Result<StoreOutcome, RelayError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Into<RelayError>,
    {
        let path = self.dir.join(generate_name(original_name));
        let mut file = fs::File::create(&path).await?;
        uploads.files.push(StoredUpload {
            field,
            path: path.clone(),
            original_name: display_name(original_name, &path),
            size: 0,
        });

        let mut chunks = std::pin::pin!(chunks);
        let mut written: u64 = 0;
        let mut too_large = false;
        while let Some(chunk) = chunks.next().await {
            let bytes = chunk.map_err(Into::into)?;
            written += bytes.len() as u64;
            if written > self.max_file_bytes {
                too_large = true;
                break;
            }
            file.write_all(&bytes).await?;
        }
        file.flush().await?;
        drop(file);

        if too_large || written == 0 {
            uploads.discard_last().await;
            return Ok(if too_large {
                StoreOutcome::TooLarge {
                    limit: self.max_file_bytes,
                }
            } else {
                StoreOutcome::Empty
            });
        }

        if let Some(last) = uploads.files.last_mut() {
            last.size = written;
        }
        debug!(field = %field, size = written, path = %path.display(), "Upload stored");
        Ok(StoreOutcome::Stored)
    }
}

/// Every upload written during one request.
#[derive(Debug, Default)]
pub struct StoredUploads {
    files: Vec<StoredUpload>,
}

impl StoredUploads {
    pub fn get(&self, field: Field) -> Option<&StoredUpload> {
        self.files.iter().find(|u| u.field == field)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.get(field).is_some()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Delete every tracked file. Safe to call more than once.
    pub async fn cleanup(&mut self) -> CleanupReport {
        let mut report = CleanupReport::default();
        for upload in self.files.drain(..) {
            match remove_upload(&upload.path).await {
                Ok(true) => report.removed += 1,
                Ok(false) => {
                    debug!(field = %upload.field, "Upload already removed");
                    report.already_gone += 1;
                }
                Err(e) => {
                    warn!(
                        field = %upload.field,
                        path = %upload.path.display(),
                        error = %e,
                        "Failed to delete upload"
                    );
                    report.failed += 1;
                }
            }
        }
        report
    }

    async fn discard_last(&mut self) {
        if let Some(upload) = self.files.pop() {
            if let Err(e) = remove_upload(&upload.path).await {
                warn!(path = %upload.path.display(), error = %e, "Failed to delete rejected upload");
                // Keep it tracked so the request-level cleanup retries.
                self.files.push(upload);
            }
        }
    }
}

impl Drop for StoredUploads {
    fn drop(&mut self) {
        if self.files.is_empty() {
            return;
        }
        warn!(count = self.files.len(), "Uploads dropped without cleanup; removing");
        for upload in self.files.drain(..) {
            match std::fs::remove_file(&upload.path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(path = %upload.path.display(), error = %e, "Failed to delete upload"),
            }
        }
    }
}

/// Delete one file. `Ok(false)` when it was already gone.
pub async fn remove_upload(path: &Path) -> std::io::Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// `<unix-millis>-<uuid>.<ext>`, keeping a short alphanumeric extension from the original.
pub fn generate_name(original_name: &str) -> String {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| {
            !e.is_empty()
                && e.len() <= MAX_EXTENSION_LEN
                && e.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default();
    format!(
        "{}-{}{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        ext
    )
}

/// Strip directories and control characters from a client-supplied name.
fn display_name(original_name: &str, stored: &Path) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        stored
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string()
    } else {
        cleaned.to_string()
    }
}
