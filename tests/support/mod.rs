#![allow(dead_code)]

use async_trait::async_trait;
use repo_census::catalog::{CatalogError, Entry, PageSource};
use repo_census::extraction::{ExtractionCapability, ExtractionError, FeatureRecord};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory collection of `n` entries, ids 0..n, counting fetch calls.
pub struct CountingSource {
    entries: Vec<Entry>,
    fetches: AtomicUsize,
    requests: Mutex<Vec<(usize, usize)>>,
}

impl CountingSource {
    pub fn new(n: u64) -> Self {
        Self {
            entries: (0..n)
                .map(|i| Entry::new(i).with_full_name(format!("acme/repo-{}", i)))
                .collect(),
            fetches: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// `(limit, offset)` of every fetch, in call order
    pub fn requests(&self) -> Vec<(usize, usize)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for CountingSource {
    async fn fetch_page(&self, limit: usize, offset: usize) -> Result<Vec<Entry>, CatalogError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push((limit, offset));
        Ok(self.entries.iter().skip(offset).take(limit).cloned().collect())
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Returns pre-built pages in order regardless of the requested offset.
pub struct ScriptedSource {
    pages: Mutex<Vec<Result<Vec<Entry>, u16>>>,
    fetches: AtomicUsize,
}

impl ScriptedSource {
    /// Each item is a page length; ids continue across pages.
    pub fn with_page_lengths(lengths: &[usize]) -> Self {
        let mut next = 0u64;
        let pages = lengths
            .iter()
            .map(|&len| {
                let page = (next..next + len as u64).map(Entry::new).collect();
                next += len as u64;
                Ok(page)
            })
            .collect();
        Self::from_pages(pages)
    }

    /// `Err(status)` items simulate a failed fetch.
    pub fn from_pages(pages: Vec<Result<Vec<Entry>, u16>>) -> Self {
        let mut pages = pages;
        pages.reverse();
        Self {
            pages: Mutex::new(pages),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch_page(&self, _limit: usize, _offset: usize) -> Result<Vec<Entry>, CatalogError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.pages.lock().unwrap().pop() {
            Some(Ok(page)) => Ok(page),
            Some(Err(status)) => Err(CatalogError::Unavailable {
                source_name: "scripted".to_string(),
                status,
            }),
            None => Ok(Vec::new()),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Extracts `repo_name` from the entry id, with per-id misbehavior.
#[derive(Default)]
pub struct StubCapability {
    hang: HashSet<String>,
    fail: HashSet<String>,
    calls: AtomicUsize,
}

impl StubCapability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hanging_on(mut self, id: &str) -> Self {
        self.hang.insert(id.to_string());
        self
    }

    pub fn failing_on(mut self, id: &str) -> Self {
        self.fail.insert(id.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractionCapability for StubCapability {
    async fn extract(&self, entry: &Entry) -> Result<FeatureRecord, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let id = entry.id.as_str();
        if self.hang.contains(id) {
            std::future::pending::<()>().await;
        }
        if self.fail.contains(id) {
            return Err(ExtractionError::Other(format!("stub failure for {}", id)));
        }

        let mut map = BTreeMap::new();
        map.insert("repo_name".to_string(), format!("repo-{}", id));
        map.insert("docker".to_string(), "no".to_string());
        map.insert("npx".to_string(), "yes".to_string());
        Ok(FeatureRecord::Map(map))
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Parsed table: header plus data rows.
pub fn read_table(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .unwrap();
    let header = reader
        .headers()
        .unwrap()
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    (header, rows)
}

/// Shared buffer that a tracing subscriber can write log lines into.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Installs a plain-text subscriber for the current thread.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let capture = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || capture.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
