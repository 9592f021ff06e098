//! Timeout-bounded extraction of a single entry
//!
//! Each extraction runs in its own task under a hard deadline. Whatever
//! happens inside (error, panic, hang) the caller gets exactly one outcome
//! and can move on to the next entry. A timed-out task is aborted; anything
//! it already did outside the process is not undone.

use crate::catalog::Entry;
use crate::extraction::{ExtractionCapability, FeatureRecord};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

pub const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Extracted {
        record: FeatureRecord,
        elapsed: Duration,
    },
    TimedOut {
        after: Duration,
    },
    Failed {
        error: String,
    },
}

impl ItemOutcome {
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ItemOutcome::Extracted { .. } => None,
            ItemOutcome::TimedOut { .. } => Some(FailureKind::Timeout),
            ItemOutcome::Failed { .. } => Some(FailureKind::Error),
        }
    }

    pub fn into_record(self) -> Option<FeatureRecord> {
        match self {
            ItemOutcome::Extracted { record, .. } => Some(record),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ItemOrchestrator {
    timeout: Duration,
}

impl Default for ItemOrchestrator {
    fn default() -> Self {
        Self::new(DEFAULT_EXTRACTION_TIMEOUT)
    }
}

impl ItemOrchestrator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Extracts `entry`, never waiting longer than the configured timeout.
    pub async fn process(
        &self,
        entry: &Entry,
        capability: Arc<dyn ExtractionCapability>,
    ) -> ItemOutcome {
        let label = entry.label();
        let started = Instant::now();

        let owned = entry.clone();
        let mut task = tokio::spawn(async move { capability.extract(&owned).await });

        match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(Ok(Ok(record))) => {
                let elapsed = started.elapsed();
                debug!(entry = %label, elapsed_ms = elapsed.as_millis(), "Extraction complete");
                ItemOutcome::Extracted { record, elapsed }
            }
            Ok(Ok(Err(e))) => {
                warn!(entry = %label, error = %e, "Extraction failed");
                ItemOutcome::Failed {
                    error: e.to_string(),
                }
            }
            Ok(Err(join_error)) => {
                let error = if join_error.is_panic() {
                    "extraction panicked".to_string()
                } else {
                    join_error.to_string()
                };
                warn!(entry = %label, error = %error, "Extraction failed");
                ItemOutcome::Failed { error }
            }
            Err(_) => {
                task.abort();
                warn!(
                    entry = %label,
                    timeout_secs = self.timeout.as_secs(),
                    "Extraction timed out"
                );
                ItemOutcome::TimedOut {
                    after: self.timeout,
                }
            }
        }
    }
}
