//! Offset pagination over a [`PageSource`]
//!
//! The cursor starts at offset 0 and advances by the page size after every
//! delivered page. It stops on the first of:
//!
//! - an empty page (a failed fetch counts as empty),
//! - a page shorter than the page size, which is delivered first,
//! - the optional page cap.
//!
//! A fixed pacing delay separates consecutive fetches. No delay precedes the
//! first fetch or follows the last one. Failed fetches are logged and never
//! retried.

use super::source::PageSource;
use super::types::Entry;
use async_trait::async_trait;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum CursorError<E> {
    #[error("page size must be at least 1")]
    InvalidPageSize,

    #[error(transparent)]
    Handler(E),
}

/// Receives pages in order as the cursor walks the source.
#[async_trait]
pub trait PageHandler: Send {
    type Error: Send;

    async fn handle_page(&mut self, page_index: usize, page: Vec<Entry>) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorStats {
    /// Non-empty pages delivered to the handler
    pub pages: usize,
    pub entries: usize,
    /// Number of fetch calls issued, including the terminal one
    pub fetches: usize,
    /// Fetches that failed and were treated as empty
    pub source_failures: usize,
}

pub struct PaginationCursor {
    source: Arc<dyn PageSource>,
    page_delay: Duration,
}

impl PaginationCursor {
    pub fn new(source: Arc<dyn PageSource>) -> Self {
        Self {
            source,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }

    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Collects every entry of the collection into memory.
    pub async fn fetch_all(
        &self,
        page_size: usize,
        max_pages: Option<usize>,
    ) -> Result<Vec<Entry>, CursorError<Infallible>> {
        struct Collect(Vec<Entry>);

        #[async_trait]
        impl PageHandler for Collect {
            type Error = Infallible;

            async fn handle_page(&mut self, _page_index: usize, page: Vec<Entry>) -> Result<(), Infallible> {
                self.0.extend(page);
                Ok(())
            }
        }

        let mut collect = Collect(Vec::new());
        self.for_each_page(page_size, max_pages, &mut collect).await?;
        Ok(collect.0)
    }

    /// Streams pages to `handler`, stopping early if it returns an error.
    pub async fn for_each_page<H: PageHandler>(
        &self,
        page_size: usize,
        max_pages: Option<usize>,
        handler: &mut H,
    ) -> Result<CursorStats, CursorError<H::Error>> {
        if page_size == 0 {
            return Err(CursorError::InvalidPageSize);
        }
        // a cap of zero means no cap
        let max_pages = max_pages.filter(|&n| n > 0);

        let mut stats = CursorStats::default();
        let mut offset = 0;

        loop {
            stats.fetches += 1;
            let mut page = match self.source.fetch_page(page_size, offset).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        source = self.source.name(),
                        offset,
                        error = %e,
                        "Page fetch failed, treating as end of collection"
                    );
                    stats.source_failures += 1;
                    Vec::new()
                }
            };

            if page.is_empty() {
                debug!(offset, "Empty page, pagination complete");
                break;
            }

            if page.len() > page_size {
                warn!(
                    requested = page_size,
                    returned = page.len(),
                    "Source returned an oversized page, truncating"
                );
                page.truncate(page_size);
            }

            let len = page.len();
            stats.pages += 1;
            stats.entries += len;
            debug!(offset, entries = len, "Page fetched");

            handler
                .handle_page(stats.pages - 1, page)
                .await
                .map_err(CursorError::Handler)?;

            if len < page_size {
                debug!(offset, entries = len, "Short page, pagination complete");
                break;
            }
            if max_pages.is_some_and(|max| stats.pages >= max) {
                info!(pages = stats.pages, "Page cap reached");
                break;
            }

            offset += page_size;
            tokio::time::sleep(self.page_delay).await;
        }

        Ok(stats)
    }
}
