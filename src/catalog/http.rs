//! HTTP client for the repository catalog service

use super::source::{CatalogError, PageSource};
use super::types::{Entry, EntryId, SearchResults};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

const SOURCE_NAME: &str = "catalog";

/// Catalog service client.
///
/// Holds one pooled `reqwest::Client`; cloning shares it.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: reqwest::Client,
    catalog_url: String,
    search_url: String,
    sort: String,
    order: String,
}

impl HttpCatalog {
    pub fn new(
        catalog_url: impl Into<String>,
        search_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("repo-census/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CatalogError::Client(e.to_string()))?;

        Ok(Self {
            client,
            catalog_url: catalog_url.into().trim_end_matches('/').to_string(),
            search_url: search_url.into(),
            sort: "stars".to_string(),
            order: "desc".to_string(),
        })
    }

    /// Overrides the `sort`/`order` query parameters (default: stars, desc).
    pub fn with_ordering(mut self, sort: impl Into<String>, order: impl Into<String>) -> Self {
        self.sort = sort.into();
        self.order = order.into();
        self
    }

    pub fn catalog_url(&self) -> &str {
        &self.catalog_url
    }

    /// Fetches one entry's full record. Any failure degrades to `None`.
    pub async fn get_entry(&self, id: &EntryId) -> Option<serde_json::Value> {
        match self.try_get_entry(id).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(entry = %id, error = %e, "Catalog entry lookup failed");
                None
            }
        }
    }

    async fn try_get_entry(&self, id: &EntryId) -> Result<serde_json::Value, CatalogError> {
        let url = format!("{}/{}", self.catalog_url, id);
        debug!(url = %url, "Fetching catalog entry");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(request_error)?;
        if response.status() != StatusCode::OK {
            return Err(CatalogError::Unavailable {
                source_name: SOURCE_NAME.to_string(),
                status: response.status().as_u16(),
            });
        }
        response.json().await.map_err(decode_error)
    }

    /// Full-text search. Failures yield an empty result list for the same URL.
    pub async fn search(&self, query: &str) -> SearchResults {
        let url = format!("{}?q={}", self.search_url, query);
        match self.try_search(query).await {
            Ok(results) => SearchResults { url, results },
            Err(e) => {
                warn!(query, error = %e, "Catalog search failed");
                SearchResults::empty(url)
            }
        }
    }

    async fn try_search(&self, query: &str) -> Result<Vec<serde_json::Value>, CatalogError> {
        let response = self
            .client
            .get(&self.search_url)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(request_error)?;
        if response.status() != StatusCode::OK {
            return Err(CatalogError::Unavailable {
                source_name: SOURCE_NAME.to_string(),
                status: response.status().as_u16(),
            });
        }
        response.json().await.map_err(decode_error)
    }
}

#[async_trait]
impl PageSource for HttpCatalog {
    async fn fetch_page(&self, limit: usize, offset: usize) -> Result<Vec<Entry>, CatalogError> {
        debug!(limit, offset, "Fetching catalog page");

        let response = self
            .client
            .get(&self.catalog_url)
            .query(&[
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
                ("sort", self.sort.clone()),
                ("order", self.order.clone()),
            ])
            .send()
            .await
            .map_err(request_error)?;

        if response.status() != StatusCode::OK {
            return Err(CatalogError::Unavailable {
                source_name: SOURCE_NAME.to_string(),
                status: response.status().as_u16(),
            });
        }

        response.json().await.map_err(decode_error)
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

fn request_error(e: reqwest::Error) -> CatalogError {
    CatalogError::Request {
        source_name: SOURCE_NAME.to_string(),
        message: e.to_string(),
    }
}

fn decode_error(e: reqwest::Error) -> CatalogError {
    CatalogError::Decode {
        source_name: SOURCE_NAME.to_string(),
        message: e.to_string(),
    }
}
