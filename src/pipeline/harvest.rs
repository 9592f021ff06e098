//! The fetch-and-extract run
//!
//! Walks the catalog page by page, extracts each entry under the item
//! orchestrator, aligns the record to the header and appends it to the
//! table. Entries are handled strictly one after another. Per-entry problems
//! are counted and logged; only table failures end the run.

use super::normalize::normalize;
use super::orchestrator::{ItemOrchestrator, ItemOutcome};
use crate::catalog::{CursorError, Entry, PageHandler, PaginationCursor};
use crate::extraction::ExtractionCapability;
use crate::progress::{NoOpHandler, ProgressEvent, ProgressHandler};
use crate::table::{append_rows, initialize_table, TableError};
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error("page size must be at least 1")]
    InvalidPageSize,
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub pages: usize,
    pub fetches: usize,
    pub source_failures: usize,
    pub entries: usize,
    pub rows: usize,
    pub timed_out: usize,
    pub failed: usize,
    pub skipped: usize,
    pub elapsed: Duration,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} entries over {} pages: {} rows written, {} timed out, {} failed, {} skipped",
            self.entries, self.pages, self.rows, self.timed_out, self.failed, self.skipped
        )
    }
}

pub struct Harvester {
    cursor: PaginationCursor,
    capability: Arc<dyn ExtractionCapability>,
    orchestrator: ItemOrchestrator,
    header: Vec<String>,
    output: PathBuf,
    progress: Arc<dyn ProgressHandler>,
}

impl Harvester {
    pub fn new(
        cursor: PaginationCursor,
        capability: Arc<dyn ExtractionCapability>,
        header: Vec<String>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            cursor,
            capability,
            orchestrator: ItemOrchestrator::default(),
            header,
            output: output.into(),
            progress: Arc::new(NoOpHandler),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.orchestrator = ItemOrchestrator::new(timeout);
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressHandler>) -> Self {
        self.progress = progress;
        self
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Initializes the table, then processes every entry the cursor yields.
    pub async fn run(
        &self,
        page_size: usize,
        max_pages: Option<usize>,
    ) -> Result<RunSummary, HarvestError> {
        if page_size == 0 {
            return Err(HarvestError::InvalidPageSize);
        }
        let started = Instant::now();

        initialize_table(&self.output, &self.header)?;
        self.progress.on_progress(&ProgressEvent::RunStarted {
            source: self.cursor.source_name().to_string(),
            page_size,
            output: self.output.display().to_string(),
        });

        let mut processor = EntryProcessor {
            harvester: self,
            summary: RunSummary::default(),
        };
        let stats = self
            .cursor
            .for_each_page(page_size, max_pages, &mut processor)
            .await
            .map_err(|e| match e {
                CursorError::InvalidPageSize => HarvestError::InvalidPageSize,
                CursorError::Handler(e) => e,
            })?;

        let mut summary = processor.summary;
        summary.pages = stats.pages;
        summary.fetches = stats.fetches;
        summary.source_failures = stats.source_failures;
        summary.elapsed = started.elapsed();

        info!(
            entries = summary.entries,
            rows = summary.rows,
            timed_out = summary.timed_out,
            failed = summary.failed,
            skipped = summary.skipped,
            "{}",
            summary
        );
        self.progress.on_progress(&ProgressEvent::RunCompleted {
            entries: summary.entries,
            rows: summary.rows,
            timed_out: summary.timed_out,
            failed: summary.failed,
            skipped: summary.skipped,
            elapsed: summary.elapsed,
        });

        Ok(summary)
    }

    async fn process_entry(&self, entry: &Entry, summary: &mut RunSummary) -> Result<(), HarvestError> {
        let label = entry.label();
        summary.entries += 1;
        self.progress.on_progress(&ProgressEvent::EntryStarted {
            entry: label.clone(),
        });

        let outcome = self
            .orchestrator
            .process(entry, Arc::clone(&self.capability))
            .await;

        let (record, elapsed) = match outcome {
            ItemOutcome::Extracted { record, elapsed } => (record, elapsed),
            ItemOutcome::TimedOut { after } => {
                summary.timed_out += 1;
                self.progress
                    .on_progress(&ProgressEvent::EntryTimedOut { entry: label, after });
                return Ok(());
            }
            ItemOutcome::Failed { error } => {
                summary.failed += 1;
                self.progress
                    .on_progress(&ProgressEvent::EntryFailed { entry: label, error });
                return Ok(());
            }
        };

        let row = match normalize(&record, &self.header) {
            Ok(row) => row,
            Err(e) => {
                warn!(entry = %label, error = %e, "Row skipped");
                summary.skipped += 1;
                self.progress.on_progress(&ProgressEvent::RowSkipped {
                    entry: label,
                    reason: e.to_string(),
                });
                return Ok(());
            }
        };

        summary.rows += append_rows(&self.output, &[row])?;
        self.progress
            .on_progress(&ProgressEvent::EntryExtracted { entry: label, elapsed });
        Ok(())
    }
}

struct EntryProcessor<'a> {
    harvester: &'a Harvester,
    summary: RunSummary,
}

#[async_trait]
impl<'a> PageHandler for EntryProcessor<'a> {
    type Error = HarvestError;

    async fn handle_page(&mut self, page_index: usize, page: Vec<Entry>) -> Result<(), HarvestError> {
        self.harvester.progress.on_progress(&ProgressEvent::PageFetched {
            page_index,
            entries: page.len(),
        });

        for entry in &page {
            self.harvester
                .process_entry(entry, &mut self.summary)
                .await?;
        }
        Ok(())
    }
}
