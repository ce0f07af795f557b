//! Ingestion loop: polls the listing API and submits every post.
//!
//! - [`listing`]: listing JSON wire types and post-to-record mapping
//! - [`client`]: paginated HTTP client
//! - [`poller`]: the polling loop driving the write queue

pub mod client;
pub mod listing;
pub mod poller;

pub use client::{IngestError, ListingClient, PageSource};
pub use listing::{Page, Post};
pub use poller::Poller;
