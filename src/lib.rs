//! repo-census: catalog survey of MCP server repositories
//!
//! Pages through a remote repository catalog, extracts a fixed set of
//! features for every entry and appends them to a CSV table.
//!
//! # Pipeline
//!
//! - [`catalog`]: entries, page sources and the [`catalog::PaginationCursor`]
//! - [`extraction`]: the [`extraction::ExtractionCapability`] seam, feature
//!   records and the LLM-backed extractor
//! - [`pipeline`]: per-entry timeout isolation, header alignment and the
//!   [`pipeline::Harvester`] that wires a run together
//! - [`table`]: CSV initialization and appends
//!
//! # Example
//!
//! ```no_run
//! use repo_census::catalog::{HttpCatalog, PaginationCursor};
//! use repo_census::config::CensusConfig;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CensusConfig::default();
//! let cursor = PaginationCursor::new(Arc::new(config.catalog()?));
//! let entries = cursor.fetch_all(config.page_size, Some(1)).await?;
//! println!("{} entries on the first page", entries.len());
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod extraction;
pub mod llm;
pub mod pipeline;
pub mod progress;
pub mod table;
pub mod tools;
pub mod util;

pub use catalog::{Entry, EntryId, HttpCatalog, PageSource, PaginationCursor};
pub use config::{CensusConfig, ConfigError};
pub use extraction::{ExtractionCapability, ExtractionError, FeatureRecord, FeatureSchema};
pub use pipeline::{HarvestError, Harvester, ItemOrchestrator, RunSummary};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
