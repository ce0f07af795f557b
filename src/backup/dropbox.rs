//! Dropbox backend for backups.
//!
//! Uploads the whole file in one `files/upload` call, overwriting whatever is
//! at the remote path.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

use super::uploader::{UploadError, Uploader};

/// Base URL for the Dropbox content API.
pub const DROPBOX_CONTENT_URL: &str = "https://content.dropboxapi.com";

/// Value of the `Dropbox-API-Arg` header.
#[derive(Debug, Serialize)]
struct UploadArg<'a> {
    path: &'a str,
    mode: &'static str,
    autorename: bool,
    mute: bool,
    strict_conflict: bool,
}

/// Uploads files with a Dropbox access token.
#[derive(Debug, Clone)]
pub struct DropboxUploader {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl DropboxUploader {
    pub fn new(token: impl Into<String>) -> Result<Self, UploadError> {
        Self::with_base_url(token, DROPBOX_CONTENT_URL)
    }

    /// Point the uploader at another content host (tests, proxies).
    pub fn with_base_url(
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;

        Ok(Self {
            client,
            token: token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Uploader for DropboxUploader {
    async fn upload(&self, local_path: &Path, remote_path: &str) -> Result<(), UploadError> {
        let body = tokio::fs::read(local_path).await?;
        let size = body.len();

        let arg = serde_json::to_string(&UploadArg {
            path: remote_path,
            mode: "overwrite",
            autorename: false,
            mute: true,
            strict_conflict: false,
        })?;

        let response = self
            .client
            .post(format!("{}/2/files/upload", self.base_url))
            .bearer_auth(&self.token)
            .header("Dropbox-API-Arg", arg)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(remote_path, bytes = size, "Uploaded file to Dropbox");
        Ok(())
    }
}
