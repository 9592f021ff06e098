//! Fetch, extract, normalize, append

pub mod harvest;
pub mod normalize;
pub mod orchestrator;

pub use harvest::{HarvestError, Harvester, RunSummary};
pub use normalize::{header_field_key, normalize, NormalizeError};
pub use orchestrator::{FailureKind, ItemOrchestrator, ItemOutcome, DEFAULT_EXTRACTION_TIMEOUT};
