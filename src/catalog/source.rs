use super::types::Entry;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{source_name} returned HTTP {status}")]
    Unavailable { source_name: String, status: u16 },

    #[error("request to {source_name} failed: {message}")]
    Request {
        source_name: String,
        message: String,
    },

    #[error("could not decode response from {source_name}: {message}")]
    Decode {
        source_name: String,
        message: String,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// A remote collection that can be read one page at a time.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Returns at most `limit` entries starting at `offset`.
    async fn fetch_page(&self, limit: usize, offset: usize) -> Result<Vec<Entry>, CatalogError>;

    fn name(&self) -> &str;
}
