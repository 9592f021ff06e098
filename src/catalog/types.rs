//! Catalog entry types

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque identifier of a catalog entry.
///
/// The catalog serves numeric ids, other sources may use strings; both are
/// kept as their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for EntryId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for EntryId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(serde_json::Number),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => EntryId(n.to_string()),
            RawId::Text(s) => EntryId(s),
        })
    }
}

/// One catalog item as returned by a page fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: EntryId,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub stars: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    /// Remaining source metadata, untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Entry {
    pub fn new(id: impl Into<EntryId>) -> Self {
        Self {
            id: id.into(),
            full_name: None,
            stars: None,
            url: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn with_stars(mut self, stars: u64) -> Self {
        self.stars = Some(stars);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Human-readable label for log lines: full name when known, id otherwise.
    pub fn label(&self) -> String {
        match &self.full_name {
            Some(name) => format!("{} (ID={})", name, self.id),
            None => format!("ID={}", self.id),
        }
    }

    /// `owner/name` repository reference, derived from the full name or the URL.
    pub fn repo_ref(&self) -> Option<String> {
        if let Some(name) = self.full_name.as_deref().filter(|n| n.contains('/')) {
            return Some(name.to_string());
        }
        let url = self.url.as_deref()?;
        let path = url
            .trim_end_matches('/')
            .trim_end_matches(".git")
            .strip_prefix("https://github.com/")?;
        let mut parts = path.splitn(3, '/');
        match (parts.next(), parts.next()) {
            (Some(owner), Some(name)) if !owner.is_empty() && !name.is_empty() => {
                Some(format!("{}/{}", owner, name))
            }
            _ => None,
        }
    }
}

/// Search response wrapped with the query URL that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub url: String,
    pub results: Vec<serde_json::Value>,
}

impl SearchResults {
    pub fn empty(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            results: Vec::new(),
        }
    }
}
