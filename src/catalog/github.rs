//! GitHub repository search as a paged source

use super::source::{CatalogError, PageSource};
use super::types::Entry;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const SOURCE_NAME: &str = "github";
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";
/// GitHub caps `per_page` for search at 100.
const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<GithubRepo>,
}

#[derive(Debug, Deserialize)]
struct GithubRepo {
    id: u64,
    full_name: String,
    #[serde(default)]
    stargazers_count: u64,
    html_url: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    forks_count: Option<u64>,
}

impl From<GithubRepo> for Entry {
    fn from(repo: GithubRepo) -> Self {
        let mut entry = Entry::new(repo.id)
            .with_full_name(repo.full_name)
            .with_stars(repo.stargazers_count)
            .with_url(repo.html_url);
        if let Some(description) = repo.description {
            entry
                .extra
                .insert("description".to_string(), description.into());
        }
        if let Some(forks) = repo.forks_count {
            entry.extra.insert("forks".to_string(), forks.into());
        }
        entry
    }
}

/// Repositories matching a search query, most-starred first.
///
/// GitHub serves at most 100 results per request; larger cursor pages are
/// assembled from several requests.
#[derive(Debug, Clone)]
pub struct GithubSearchSource {
    client: reqwest::Client,
    api_base: String,
    query: String,
    token: Option<String>,
}

impl GithubSearchSource {
    pub fn new(
        query: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("repo-census/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CatalogError::Client(e.to_string()))?;

        Ok(Self {
            client,
            api_base: DEFAULT_GITHUB_API.to_string(),
            query: query.into(),
            token,
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch_search_page(&self, per_page: usize, page: usize) -> Result<Vec<Entry>, CatalogError> {
        debug!(query = %self.query, per_page, page, "Fetching GitHub search page");

        let mut request = self
            .client
            .get(format!("{}/search/repositories", self.api_base))
            .header(ACCEPT, "application/vnd.github+json")
            .query(&[
                ("q", self.query.clone()),
                ("sort", "stars".to_string()),
                ("order", "desc".to_string()),
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
            ]);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request.send().await.map_err(|e| CatalogError::Request {
            source_name: SOURCE_NAME.to_string(),
            message: e.to_string(),
        })?;
        if response.status() != StatusCode::OK {
            return Err(CatalogError::Unavailable {
                source_name: SOURCE_NAME.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body: SearchResponse = response.json().await.map_err(|e| CatalogError::Decode {
            source_name: SOURCE_NAME.to_string(),
            message: e.to_string(),
        })?;
        Ok(body.items.into_iter().map(Entry::from).collect())
    }
}

/// 1-based page number for an offset/limit pair.
fn page_number(limit: usize, offset: usize) -> usize {
    offset / limit.max(1) + 1
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// Largest GitHub page size that divides both `limit` and `offset`, so a
/// cursor page is always made of whole GitHub pages.
fn search_page_size(limit: usize, offset: usize) -> usize {
    let step = gcd(limit.max(1), offset);
    (1..=step.min(MAX_PER_PAGE))
        .rev()
        .find(|size| step % size == 0)
        .unwrap_or(1)
}

#[async_trait]
impl PageSource for GithubSearchSource {
    /// Pages larger than GitHub's cap are assembled from several search
    /// requests. A failure after the first request returns what was already
    /// collected, which the cursor sees as a short page.
    async fn fetch_page(&self, limit: usize, offset: usize) -> Result<Vec<Entry>, CatalogError> {
        let per_page = search_page_size(limit, offset);
        let mut page = page_number(per_page, offset);
        let mut entries = Vec::with_capacity(limit);

        while entries.len() < limit {
            let batch = match self.fetch_search_page(per_page, page).await {
                Ok(batch) => batch,
                Err(e) if !entries.is_empty() => {
                    warn!(
                        query = %self.query,
                        page,
                        collected = entries.len(),
                        error = %e,
                        "GitHub search page failed, returning partial page"
                    );
                    break;
                }
                Err(e) => return Err(e),
            };
            let exhausted = batch.len() < per_page;
            entries.extend(batch);
            if exhausted {
                break;
            }
            page += 1;
        }

        entries.truncate(limit);
        Ok(entries)
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}
