//! Run configuration
//!
//! Settings load from environment variables with fallback defaults. The CLI
//! overrides individual fields afterwards; components receive the values they
//! need through their constructors and never read the environment themselves.
//!
//! # Environment Variables
//!
//! - `REPO_CENSUS_CATALOG_URL`: catalog base URL
//! - `REPO_CENSUS_SEARCH_URL`: search base URL
//! - `REPO_CENSUS_CATALOG_SORT`: catalog sort field - default: "stars"
//! - `REPO_CENSUS_CATALOG_ORDER`: "asc" or "desc" - default: "desc"
//! - `REPO_CENSUS_PAGE_SIZE`: entries per page - default: "12"
//! - `REPO_CENSUS_MAX_PAGES`: page cap - default: unset (no cap)
//! - `REPO_CENSUS_PAGE_DELAY_MS`: pause between page fetches - default: "200"
//! - `REPO_CENSUS_HTTP_TIMEOUT_MS`: per-request HTTP timeout - default: "4500"
//! - `REPO_CENSUS_EXTRACTION_TIMEOUT`: per-entry deadline in seconds - default: "60"
//! - `REPO_CENSUS_OUTPUT`: output table path - default: "mcp_repos.csv"
//! - `REPO_CENSUS_PROVIDER`: LLM provider - default: "openai"
//! - `REPO_CENSUS_MODEL`: LLM model - default: "gpt-4.1"
//! - `REPO_CENSUS_MAX_ITERATIONS`: LLM turns per entry - default: "8"
//! - `REPO_CENSUS_ALLOW_SERVER_PROBE`: let the model start MCP servers to list
//!   their tools - default: "false"
//! - `REPO_CENSUS_LOG_LEVEL`: logging level - default: "info"
//! - `GITHUB_TOKEN`: GitHub API token - default: unset
//!
//! Provider credentials (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, ...) are read
//! by the genai library.

use crate::catalog::{CatalogError, HttpCatalog};
use crate::llm::GenAIClient;
use genai::adapter::AdapterKind;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CATALOG_URL: &str = "https://catalog-service-y1zj.onrender.com/api/repos";
pub const DEFAULT_SEARCH_URL: &str = "https://catalog-service-y1zj.onrender.com/api/search";
pub const DEFAULT_PAGE_SIZE: usize = 12;
const DEFAULT_PAGE_DELAY_MS: u64 = 200;
const DEFAULT_HTTP_TIMEOUT_MS: u64 = 4500;
const DEFAULT_EXTRACTION_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CATALOG_SORT: &str = "stars";
const DEFAULT_CATALOG_ORDER: &str = "desc";
const DEFAULT_OUTPUT: &str = "mcp_repos.csv";
const DEFAULT_PROVIDER: &str = "openai";
const DEFAULT_MODEL: &str = "gpt-4.1";
const DEFAULT_MAX_ITERATIONS: usize = 8;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Upper bound on an LLM call; keeps a single turn inside the entry deadline.
const LLM_REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid provider: {0}")]
    InvalidProvider(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Clone)]
pub struct CensusConfig {
    pub catalog_url: String,
    pub search_url: String,
    pub catalog_sort: String,
    pub catalog_order: String,
    pub page_size: usize,
    pub max_pages: Option<usize>,
    pub page_delay: Duration,
    pub http_timeout: Duration,
    pub extraction_timeout: Duration,
    pub output: PathBuf,
    pub provider: String,
    pub model: String,
    pub max_iterations: usize,
    /// Offer the model the stdio `list_server_tools` probe
    pub allow_server_probe: bool,
    pub log_level: String,
    pub github_token: Option<String>,
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

impl Default for CensusConfig {
    fn default() -> Self {
        Self {
            catalog_url: env_string("REPO_CENSUS_CATALOG_URL")
                .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string()),
            search_url: env_string("REPO_CENSUS_SEARCH_URL")
                .unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string()),
            catalog_sort: env_string("REPO_CENSUS_CATALOG_SORT")
                .unwrap_or_else(|| DEFAULT_CATALOG_SORT.to_string()),
            catalog_order: env_string("REPO_CENSUS_CATALOG_ORDER")
                .unwrap_or_else(|| DEFAULT_CATALOG_ORDER.to_string())
                .to_lowercase(),
            page_size: env_parse("REPO_CENSUS_PAGE_SIZE").unwrap_or(DEFAULT_PAGE_SIZE),
            max_pages: env_parse("REPO_CENSUS_MAX_PAGES"),
            page_delay: Duration::from_millis(
                env_parse("REPO_CENSUS_PAGE_DELAY_MS").unwrap_or(DEFAULT_PAGE_DELAY_MS),
            ),
            http_timeout: Duration::from_millis(
                env_parse("REPO_CENSUS_HTTP_TIMEOUT_MS").unwrap_or(DEFAULT_HTTP_TIMEOUT_MS),
            ),
            extraction_timeout: Duration::from_secs(
                env_parse("REPO_CENSUS_EXTRACTION_TIMEOUT")
                    .unwrap_or(DEFAULT_EXTRACTION_TIMEOUT_SECS),
            ),
            output: env_string("REPO_CENSUS_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            provider: env_string("REPO_CENSUS_PROVIDER")
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string())
                .to_lowercase(),
            model: env_string("REPO_CENSUS_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_iterations: env_parse("REPO_CENSUS_MAX_ITERATIONS")
                .unwrap_or(DEFAULT_MAX_ITERATIONS),
            allow_server_probe: env_flag("REPO_CENSUS_ALLOW_SERVER_PROBE"),
            log_level: env::var("REPO_CENSUS_LOG_LEVEL")
                .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
                .to_lowercase(),
            github_token: env_string("GITHUB_TOKEN"),
        }
    }
}

impl CensusConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=1000).contains(&self.page_size) {
            return Err(ConfigError::ValidationFailed(format!(
                "Page size must be between 1 and 1000, got {}",
                self.page_size
            )));
        }

        let timeout = self.extraction_timeout.as_secs();
        if !(1..=3600).contains(&timeout) {
            return Err(ConfigError::ValidationFailed(format!(
                "Extraction timeout must be between 1 and 3600 seconds, got {}",
                timeout
            )));
        }

        if self.http_timeout.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "HTTP timeout must be greater than zero".to_string(),
            ));
        }

        if self.max_iterations == 0 {
            return Err(ConfigError::ValidationFailed(
                "Max iterations must be at least 1".to_string(),
            ));
        }

        for (name, url) in [("catalog", &self.catalog_url), ("search", &self.search_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::ValidationFailed(format!(
                    "The {} URL must be http(s), got {}",
                    name, url
                )));
            }
        }

        if !matches!(self.catalog_order.as_str(), "asc" | "desc") {
            return Err(ConfigError::ValidationFailed(format!(
                "Catalog order must be asc or desc, got {}",
                self.catalog_order
            )));
        }

        self.adapter_kind()?;

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(ConfigError::ValidationFailed(format!(
                "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                self.log_level
            ))),
        }
    }

    pub fn adapter_kind(&self) -> Result<AdapterKind, ConfigError> {
        AdapterKind::from_lower_str(&self.provider)
            .ok_or_else(|| ConfigError::InvalidProvider(self.provider.clone()))
    }

    pub fn catalog(&self) -> Result<HttpCatalog, ConfigError> {
        Ok(
            HttpCatalog::new(&self.catalog_url, &self.search_url, self.http_timeout)?
                .with_ordering(&self.catalog_sort, &self.catalog_order),
        )
    }

    pub fn create_llm_client(&self) -> Result<GenAIClient, ConfigError> {
        let timeout = LLM_REQUEST_TIMEOUT.min(self.extraction_timeout);
        Ok(GenAIClient::new(
            self.adapter_kind()?,
            self.model.clone(),
            timeout,
        ))
    }
}

impl fmt::Display for CensusConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Repo Census Configuration:")?;
        writeln!(f, "  Catalog: {}", self.catalog_url)?;
        writeln!(f, "  Search: {}", self.search_url)?;
        writeln!(
            f,
            "  Ordering: {} {}",
            self.catalog_sort, self.catalog_order
        )?;
        writeln!(f, "  Page Size: {}", self.page_size)?;
        match self.max_pages {
            Some(max) => writeln!(f, "  Max Pages: {}", max)?,
            None => writeln!(f, "  Max Pages: unlimited")?,
        }
        writeln!(f, "  Page Delay: {}ms", self.page_delay.as_millis())?;
        writeln!(f, "  HTTP Timeout: {}ms", self.http_timeout.as_millis())?;
        writeln!(f, "  Extraction Timeout: {}s", self.extraction_timeout.as_secs())?;
        writeln!(f, "  Output: {}", self.output.display())?;
        writeln!(f, "  Provider: {}", self.provider)?;
        writeln!(f, "  Model: {}", self.model)?;
        writeln!(f, "  Max Iterations: {}", self.max_iterations)?;
        writeln!(
            f,
            "  Server Probe: {}",
            if self.allow_server_probe { "allowed" } else { "disabled" }
        )?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(
            f,
            "  GitHub Token: {}",
            if self.github_token.is_some() { "set" } else { "unset" }
        )?;
        Ok(())
    }
}
