//! Per-entry feature extraction
//!
//! [`ExtractionCapability`] is the seam between the pipeline and whatever
//! decides an entry's features. The pipeline only sees "entry in, record or
//! failure out", so its timeout and isolation rules hold for any backend.

pub mod llm;
pub mod record;

use crate::catalog::Entry;
use crate::llm::BackendError;
use async_trait::async_trait;
use thiserror::Error;

pub use llm::LlmExtractor;
pub use record::{
    cell_text, ActivationFeatureRow, FeatureRecord, FeatureSchema, FullFeatureRow,
    ACTIVATION_HEADERS, FULL_HEADERS,
};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("LLM backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("no result after {0} LLM iterations")]
    MaxIterations(usize),

    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait ExtractionCapability: Send + Sync {
    async fn extract(&self, entry: &Entry) -> Result<FeatureRecord, ExtractionError>;

    fn name(&self) -> &str;
}
