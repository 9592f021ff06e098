//! Progress handler trait and events

use std::time::Duration;

/// Events emitted while a harvest run walks the catalog
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Run started; the table has been initialized
    RunStarted {
        source: String,
        page_size: usize,
        output: String,
    },

    /// A page was fetched and is about to be processed
    PageFetched { page_index: usize, entries: usize },

    /// Extraction of one entry started
    EntryStarted { entry: String },

    /// Extraction produced a record and its row was appended
    EntryExtracted { entry: String, elapsed: Duration },

    /// Extraction hit its deadline
    EntryTimedOut { entry: String, after: Duration },

    /// Extraction failed
    EntryFailed { entry: String, error: String },

    /// A record could not be aligned to the header
    RowSkipped { entry: String, reason: String },

    /// Run finished
    RunCompleted {
        entries: usize,
        rows: usize,
        timed_out: usize,
        failed: usize,
        skipped: usize,
        elapsed: Duration,
    },
}

/// Receives progress events during a run
pub trait ProgressHandler: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
