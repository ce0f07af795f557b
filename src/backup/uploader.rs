//! Backup upload contract.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Error type for upload operations.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read backup file: {0}")]
    Io(#[from] std::io::Error),

    #[error("upload request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to encode upload arguments: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("upload rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Uploads a local file to remote storage. Succeeds or fails; never retries.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, local_path: &Path, remote_path: &str) -> Result<(), UploadError>;
}

/// Remote path for a datastore file: `/` followed by its base name.
pub fn remote_path_for(local_path: &Path) -> String {
    let name = local_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("/{name}")
}
