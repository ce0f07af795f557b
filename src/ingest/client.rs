//! Paginated listing API client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;
use thiserror::Error;

use super::listing::{Listing, Page};
use crate::storage::error::StorageError;

/// Error type for ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("listing request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("listing API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode listing: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid client setting: {0}")]
    InvalidSetting(String),

    #[error("submit failed: {0}")]
    Storage(#[from] StorageError),
}

/// Source of listing pages, newest first.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page after cursor `after` (`None` for the first page).
    async fn fetch_page(&self, after: Option<&str>) -> Result<Page, IngestError>;
}

/// HTTP client for `/r/{subreddit}/new`.
#[derive(Debug, Clone)]
pub struct ListingClient {
    client: reqwest::Client,
    base_url: String,
    subreddit: String,
    limit: u32,
}

impl ListingClient {
    /// # Arguments
    ///
    /// * `base_url` - API host, e.g. `https://oauth.reddit.com`
    /// * `token` - Bearer token (acquired elsewhere)
    /// * `user_agent` - Sent on every request
    /// * `subreddit` - Listing to poll
    /// * `limit` - Posts per page
    pub fn new(
        base_url: impl Into<String>,
        token: &str,
        user_agent: &str,
        subreddit: impl Into<String>,
        limit: u32,
    ) -> Result<Self, IngestError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| IngestError::InvalidSetting(format!("API token: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| IngestError::InvalidSetting(format!("user agent: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            subreddit: subreddit.into(),
            limit,
        })
    }

    fn page_url(&self) -> String {
        format!("{}/r/{}/new", self.base_url, self.subreddit)
    }
}

#[async_trait]
impl PageSource for ListingClient {
    async fn fetch_page(&self, after: Option<&str>) -> Result<Page, IngestError> {
        let mut request = self
            .client
            .get(self.page_url())
            .query(&[("limit", self.limit.to_string())]);
        if let Some(after) = after {
            request = request.query(&[("after", after)]);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(IngestError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let listing: Listing = serde_json::from_str(&body)?;
        Ok(Page::from(listing))
    }
}
