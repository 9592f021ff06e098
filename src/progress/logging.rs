//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info};

/// Turns progress events into tracing lines.
///
/// Timeouts and failures are already reported at `warn` where they happen,
/// so they only get a `debug` line here.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::RunStarted {
                source,
                page_size,
                output,
            } => {
                info!(source = %source, page_size, output = %output, "Starting harvest");
            }
            ProgressEvent::PageFetched {
                page_index,
                entries,
            } => {
                info!(page = page_index, entries, "Processing page");
            }
            ProgressEvent::EntryStarted { entry } => {
                info!(entry = %entry, "Processing entry");
            }
            ProgressEvent::EntryExtracted { entry, elapsed } => {
                debug!(
                    entry = %entry,
                    elapsed_ms = elapsed.as_millis(),
                    "Entry extracted"
                );
            }
            ProgressEvent::EntryTimedOut { entry, after } => {
                debug!(entry = %entry, after_secs = after.as_secs(), "Entry skipped after timeout");
            }
            ProgressEvent::EntryFailed { entry, error } => {
                debug!(entry = %entry, error = %error, "Entry skipped after failure");
            }
            ProgressEvent::RowSkipped { entry, reason } => {
                debug!(entry = %entry, reason = %reason, "Row skipped");
            }
            ProgressEvent::RunCompleted {
                entries,
                rows,
                timed_out,
                failed,
                skipped,
                elapsed,
            } => {
                info!(
                    entries,
                    rows,
                    timed_out,
                    failed,
                    skipped,
                    elapsed_ms = elapsed.as_millis(),
                    "Harvest complete"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_logging_all_events() {
        let handler = LoggingHandler;

        let events = vec![
            ProgressEvent::RunStarted {
                source: "catalog".to_string(),
                page_size: 12,
                output: "out.csv".to_string(),
            },
            ProgressEvent::PageFetched {
                page_index: 0,
                entries: 12,
            },
            ProgressEvent::EntryStarted {
                entry: "a/b (ID=1)".to_string(),
            },
            ProgressEvent::EntryExtracted {
                entry: "a/b (ID=1)".to_string(),
                elapsed: Duration::from_millis(800),
            },
            ProgressEvent::EntryTimedOut {
                entry: "a/c (ID=2)".to_string(),
                after: Duration::from_secs(60),
            },
            ProgressEvent::EntryFailed {
                entry: "a/d (ID=3)".to_string(),
                error: "backend".to_string(),
            },
            ProgressEvent::RowSkipped {
                entry: "a/e (ID=4)".to_string(),
                reason: "schema mismatch".to_string(),
            },
            ProgressEvent::RunCompleted {
                entries: 5,
                rows: 1,
                timed_out: 1,
                failed: 1,
                skipped: 1,
                elapsed: Duration::from_secs(70),
            },
        ];

        for event in events {
            handler.on_progress(&event);
        }
    }
}
