//! Polling loop feeding the write queue.
//!
//! Each cycle walks up to `max_pages` pages of the listing and submits every
//! post. Duplicates are left to the datastore's primary key. A failed fetch
//! ends the cycle early; the next cycle starts on schedule.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::client::{IngestError, PageSource};
use crate::observability::metrics::record_ingested;
use crate::storage::error::StorageError;
use crate::storage::queue::WriteQueue;

/// Drives a [`PageSource`] into a [`WriteQueue`].
pub struct Poller<S> {
    source: S,
    queue: WriteQueue,
    max_pages: u32,
    interval: Duration,
}

/// Result of one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub pages: u32,
    pub submitted: u64,
}

impl<S: PageSource> Poller<S> {
    pub fn new(source: S, queue: WriteQueue, max_pages: u32, interval: Duration) -> Self {
        Self {
            source,
            queue,
            max_pages,
            interval,
        }
    }

    /// Fetch and submit up to `max_pages` pages.
    ///
    /// Stops early on the last page or when `shutdown` is cancelled. Returns
    /// what was done so far alongside the first error.
    pub async fn poll_once(
        &self,
        shutdown: &CancellationToken,
    ) -> (CycleSummary, Result<(), IngestError>) {
        let mut summary = CycleSummary::default();
        let result = self.poll_into(&mut summary, shutdown).await;
        (summary, result)
    }

    /// One cycle, tallying into `summary` as it goes so the counts survive a
    /// cycle that is dropped mid-way.
    async fn poll_into(
        &self,
        summary: &mut CycleSummary,
        shutdown: &CancellationToken,
    ) -> Result<(), IngestError> {
        let mut after: Option<String> = None;

        while summary.pages < self.max_pages && !shutdown.is_cancelled() {
            let page = self.source.fetch_page(after.as_deref()).await?;
            summary.pages += 1;

            tracing::debug!(
                page = summary.pages,
                posts = page.posts.len(),
                "Fetched listing page"
            );

            for post in page.posts {
                self.queue.submit(post.into_record()).await?;
                summary.submitted += 1;
                record_ingested(1);
            }

            match page.after {
                Some(next) => after = Some(next),
                None => break,
            }
        }

        Ok(())
    }

    /// Poll until `shutdown` is cancelled or the write queue shuts down.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(
            max_pages = self.max_pages,
            interval_secs = self.interval.as_secs(),
            "Poller started"
        );

        loop {
            let mut summary = CycleSummary::default();
            // A producer blocked on a full queue must not outlive shutdown
            let cycle = tokio::select! {
                () = shutdown.cancelled() => None,
                result = self.poll_into(&mut summary, &shutdown) => Some(result),
            };
            let Some(result) = cycle else {
                tracing::info!(
                    pages = summary.pages,
                    submitted = summary.submitted,
                    "Poller stopping mid-cycle"
                );
                return;
            };

            match result {
                Ok(()) => tracing::info!(
                    pages = summary.pages,
                    submitted = summary.submitted,
                    "Poll cycle complete"
                ),
                Err(IngestError::Storage(StorageError::ShuttingDown)) => {
                    tracing::info!("Write queue shut down, poller stopping");
                    return;
                }
                Err(e) => tracing::warn!(
                    error = %e,
                    pages = summary.pages,
                    submitted = summary.submitted,
                    "Poll cycle failed"
                ),
            }

            tokio::select! {
                () = shutdown.cancelled() => {
                    tracing::info!("Poller stopping");
                    return;
                }
                () = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::listing::{Page, Post};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Serves canned pages keyed by cursor; records requested cursors.
    struct FakeSource {
        pages: Vec<(Option<&'static str>, Result<Page, u16>)>,
        requested: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl PageSource for FakeSource {
        async fn fetch_page(&self, after: Option<&str>) -> Result<Page, IngestError> {
            self.requested
                .lock()
                .unwrap()
                .push(after.map(str::to_string));
            let (_, page) = self
                .pages
                .iter()
                .find(|(cursor, _)| *cursor == after)
                .expect("unexpected cursor");
            page.clone().map_err(|status| IngestError::Status {
                status,
                body: String::new(),
            })
        }
    }

    fn post(id: &str) -> Post {
        Post {
            id: id.into(),
            title: String::new(),
            url: format!("https://example.com/{id}"),
            flair: None,
            num_comments: 1,
            author: "a".into(),
            created_utc: 1_690_000_000.0,
        }
    }

    fn page(ids: &[&str], after: Option<&str>) -> Page {
        Page {
            posts: ids.iter().map(|id| post(id)).collect(),
            after: after.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_follows_cursor_until_last_page() {
        let source = FakeSource {
            pages: vec![
                (None, Ok(page(&["a", "b"], Some("t3_b")))),
                (Some("t3_b"), Ok(page(&["c"], None))),
            ],
            requested: Mutex::new(Vec::new()),
        };
        let (queue, mut rx) = WriteQueue::new(10, CancellationToken::new());
        let poller = Poller::new(source, queue, 10, Duration::from_secs(60));

        let (summary, result) = poller.poll_once(&CancellationToken::new()).await;
        result.unwrap();
        assert_eq!(summary, CycleSummary { pages: 2, submitted: 3 });

        let mut ids = Vec::new();
        while let Ok(cmd) = rx.try_recv() {
            ids.push(cmd.params[0].clone());
        }
        assert_eq!(ids.len(), 3);
        assert_eq!(
            *poller.source.requested.lock().unwrap(),
            vec![None, Some("t3_b".to_string())]
        );
    }

    #[tokio::test]
    async fn test_max_pages_caps_cycle() {
        let source = FakeSource {
            pages: vec![
                (None, Ok(page(&["a"], Some("t3_a")))),
                (Some("t3_a"), Ok(page(&["b"], Some("t3_b")))),
            ],
            requested: Mutex::new(Vec::new()),
        };
        let (queue, _rx) = WriteQueue::new(10, CancellationToken::new());
        let poller = Poller::new(source, queue, 1, Duration::from_secs(60));

        let (summary, result) = poller.poll_once(&CancellationToken::new()).await;
        result.unwrap();
        assert_eq!(summary.pages, 1);
        assert_eq!(summary.submitted, 1);
    }

    #[tokio::test]
    async fn test_fetch_error_ends_cycle_with_partial_summary() {
        let source = FakeSource {
            pages: vec![
                (None, Ok(page(&["a"], Some("t3_a")))),
                (Some("t3_a"), Err(503)),
            ],
            requested: Mutex::new(Vec::new()),
        };
        let (queue, _rx) = WriteQueue::new(10, CancellationToken::new());
        let poller = Poller::new(source, queue, 10, Duration::from_secs(60));

        let (summary, result) = poller.poll_once(&CancellationToken::new()).await;
        assert!(matches!(result, Err(IngestError::Status { status: 503, .. })));
        assert_eq!(summary.submitted, 1);
    }

    #[tokio::test]
    async fn test_abandoned_cycle_keeps_partial_counts() {
        let source = FakeSource {
            pages: vec![(None, Ok(page(&["a", "b", "c"], None)))],
            requested: Mutex::new(Vec::new()),
        };
        // Room for one post; nothing drains the queue
        let (queue, _rx) = WriteQueue::new(1, CancellationToken::new());
        let poller = Poller::new(source, queue, 10, Duration::from_secs(60));

        let mut summary = CycleSummary::default();
        let shutdown = CancellationToken::new();
        let dropped = tokio::time::timeout(
            Duration::from_millis(100),
            poller.poll_into(&mut summary, &shutdown),
        )
        .await;

        assert!(dropped.is_err(), "cycle should be stuck on the full queue");
        assert_eq!(summary, CycleSummary { pages: 1, submitted: 1 });
    }

    #[tokio::test]
    async fn test_run_stops_when_queue_shuts_down() {
        let source = FakeSource {
            pages: vec![(None, Ok(page(&["a"], None)))],
            requested: Mutex::new(Vec::new()),
        };
        let queue_shutdown = CancellationToken::new();
        let (queue, _rx) = WriteQueue::new(10, queue_shutdown.clone());
        queue_shutdown.cancel();

        let poller = Poller::new(source, queue, 10, Duration::from_secs(3600));
        // Would sleep an hour if the shutdown were not observed
        tokio::time::timeout(Duration::from_secs(5), poller.run(CancellationToken::new()))
            .await
            .unwrap();
    }
}
