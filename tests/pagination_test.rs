//! Pagination cursor behavior against in-memory sources
//!
//! Walks collections of various sizes and checks ordering, termination and
//! the page cap without any network.

mod support;

use repo_census::catalog::{Entry, PaginationCursor};
use std::sync::Arc;
use std::time::Duration;
use support::{CountingSource, ScriptedSource};
use yare::parameterized;

fn ids(entries: &[Entry]) -> Vec<String> {
    entries.iter().map(|e| e.id.to_string()).collect()
}

fn expected_ids(n: u64) -> Vec<String> {
    (0..n).map(|i| i.to_string()).collect()
}

#[parameterized(
    empty = { 0, 12, 1 },
    single = { 1, 12, 1 },
    under_one_page = { 11, 12, 1 },
    exactly_one_page = { 12, 12, 2 },
    one_over = { 13, 12, 2 },
    two_full_one_short = { 29, 12, 3 },
    three_full = { 36, 12, 4 },
    page_size_one = { 3, 1, 4 },
    page_size_seven = { 20, 7, 3 },
)]
fn test_every_entry_delivered_once_in_order(total: u64, page_size: usize, fetches: usize) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap();

    runtime.block_on(async {
        let source = Arc::new(CountingSource::new(total));
        let cursor = PaginationCursor::new(source.clone()).with_page_delay(Duration::ZERO);

        let entries = cursor.fetch_all(page_size, None).await.unwrap();

        assert_eq!(ids(&entries), expected_ids(total));
        assert_eq!(source.fetches(), fetches);
    });
}

#[tokio::test]
async fn test_offsets_advance_by_page_size() {
    let source = Arc::new(CountingSource::new(29));
    let cursor = PaginationCursor::new(source.clone()).with_page_delay(Duration::ZERO);

    cursor.fetch_all(12, None).await.unwrap();

    assert_eq!(source.requests(), vec![(12, 0), (12, 12), (12, 24)]);
}

#[tokio::test]
async fn test_short_page_is_always_last() {
    // a full page after the short one must never be requested
    let source = Arc::new(ScriptedSource::with_page_lengths(&[12, 5, 12]));
    let cursor = PaginationCursor::new(source.clone()).with_page_delay(Duration::ZERO);

    let entries = cursor.fetch_all(12, None).await.unwrap();

    assert_eq!(entries.len(), 17);
    assert_eq!(source.fetches(), 2);
}

#[parameterized(
    one_page = { 1, 12 },
    two_pages = { 2, 24 },
    cap_beyond_collection = { 10, 40 },
)]
fn test_page_cap(max_pages: usize, expected: usize) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    runtime.block_on(async {
        let source = Arc::new(CountingSource::new(40));
        let cursor = PaginationCursor::new(source).with_page_delay(Duration::ZERO);

        let entries = cursor.fetch_all(12, Some(max_pages)).await.unwrap();
        assert_eq!(entries.len(), expected);
    });
}

#[tokio::test]
async fn test_failed_fetch_ends_pagination() {
    let page = (0..12u64).map(Entry::new).collect();
    let source = Arc::new(ScriptedSource::from_pages(vec![
        Ok(page),
        Err(503),
        Ok(vec![Entry::new(99u64)]),
    ]));
    let cursor = PaginationCursor::new(source.clone()).with_page_delay(Duration::ZERO);

    let entries = cursor.fetch_all(12, None).await.unwrap();

    assert_eq!(entries.len(), 12);
    assert_eq!(source.fetches(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_delay_only_between_fetches() {
    let source = Arc::new(CountingSource::new(29));
    let cursor = PaginationCursor::new(source).with_page_delay(Duration::from_secs(1));

    let started = tokio::time::Instant::now();
    cursor.fetch_all(12, None).await.unwrap();

    // three fetches, two gaps
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(2));
    assert!(elapsed < Duration::from_secs(3));
}

#[tokio::test]
async fn test_zero_page_size_is_rejected() {
    let source = Arc::new(CountingSource::new(5));
    let cursor = PaginationCursor::new(source.clone());

    assert!(cursor.fetch_all(0, None).await.is_err());
    assert_eq!(source.fetches(), 0);
}
