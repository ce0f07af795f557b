//! Configuration parsing for the collector.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides
//! - Defaults matching the storage core's design values

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// UFO Collector: records new listing posts in SQLite and mirrors the file to Dropbox.
#[derive(Parser, Debug, Clone)]
#[command(name = "ufo-collector")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Path to the SQLite datastore file
    #[arg(long, env = "UFO_DB_PATH", default_value = "./analytics.db")]
    pub db_path: PathBuf,

    /// Capacity of the write queue (backpressure control)
    #[arg(
        long,
        env = "UFO_WRITE_QUEUE_SIZE",
        default_value_t = 200,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub write_queue_size: usize,

    /// Seconds between write queue depth reports
    #[arg(
        long,
        env = "UFO_QUEUE_REPORT_SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub queue_report_secs: u64,

    /// Seconds between datastore backups
    #[arg(
        long,
        env = "UFO_BACKUP_INTERVAL_SECS",
        default_value_t = 600,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub backup_interval_secs: u64,

    /// Dropbox access token used for backups
    #[arg(long, env = "ANALYTICS_DROPBOX_ACCESS_TOKEN", hide_env_values = true)]
    pub dropbox_token: String,

    /// Dropbox content API base URL
    #[arg(
        long,
        env = "UFO_DROPBOX_BASE_URL",
        default_value = "https://content.dropboxapi.com"
    )]
    pub dropbox_base_url: String,

    /// Bearer token for the listing API
    #[arg(long, env = "UFO_API_TOKEN", hide_env_values = true)]
    pub api_token: String,

    /// Listing API base URL
    #[arg(long, env = "UFO_API_BASE_URL", default_value = "https://oauth.reddit.com")]
    pub api_base_url: String,

    /// Subreddit to poll
    #[arg(long, env = "UFO_SUBREDDIT", default_value = "UFOs")]
    pub subreddit: String,

    /// Posts requested per page
    #[arg(long, env = "UFO_PAGE_LIMIT", default_value_t = 100)]
    pub page_limit: u32,

    /// Maximum pages fetched per poll cycle
    #[arg(long, env = "UFO_MAX_PAGES", default_value_t = 10)]
    pub max_pages: u32,

    /// Seconds between poll cycles
    #[arg(
        long,
        env = "UFO_POLL_INTERVAL_SECS",
        default_value_t = 300,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval_secs: u64,

    /// User-Agent sent to the listing API
    #[arg(long, env = "UFO_USER_AGENT", default_value = "ufo-collector/0.1")]
    pub user_agent: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "UFO_LOG_JSON")]
    pub log_json: bool,

    /// OpenTelemetry collector endpoint for metrics export (optional)
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otel_endpoint: Option<String>,
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn queue_report_interval(&self) -> Duration {
        Duration::from_secs(self.queue_report_secs)
    }

    pub fn backup_interval(&self) -> Duration {
        Duration::from_secs(self.backup_interval_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Create a configuration for testing against local endpoints.
    #[cfg(test)]
    pub fn test_config(db_path: PathBuf) -> Self {
        Self {
            db_path,
            write_queue_size: 8,
            queue_report_secs: 1,
            backup_interval_secs: 1,
            dropbox_token: "test-dropbox-token".into(),
            dropbox_base_url: "http://127.0.0.1:0".into(),
            api_token: "test-api-token".into(),
            api_base_url: "http://127.0.0.1:0".into(),
            subreddit: "test".into(),
            page_limit: 5,
            max_pages: 2,
            poll_interval_secs: 1,
            user_agent: "ufo-collector-test".into(),
            log_level: "debug".into(),
            log_json: false,
            otel_endpoint: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./analytics.db"),
            write_queue_size: 200,
            queue_report_secs: 30,
            backup_interval_secs: 600,
            dropbox_token: String::new(),
            dropbox_base_url: "https://content.dropboxapi.com".into(),
            api_token: String::new(),
            api_base_url: "https://oauth.reddit.com".into(),
            subreddit: "UFOs".into(),
            page_limit: 100,
            max_pages: 10,
            poll_interval_secs: 300,
            user_agent: "ufo-collector/0.1".into(),
            log_level: "info".into(),
            log_json: false,
            otel_endpoint: None,
        }
    }
}
