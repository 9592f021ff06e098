//! HTTP catalog and GitHub search sources against a local server

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use repo_census::catalog::{
    CatalogError, EntryId, GithubSearchSource, HttpCatalog, PageSource, PaginationCursor,
};
use repo_census::config::CensusConfig;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

const TOTAL: usize = 29;

type Requests = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn param(params: &HashMap<String, String>, key: &str) -> usize {
    params.get(key).and_then(|v| v.parse().ok()).unwrap_or(0)
}

async fn list_repos(
    State(requests): State<Requests>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let limit = param(&params, "limit");
    let offset = param(&params, "offset");
    requests.lock().unwrap().push(params);

    let page: Vec<Value> = (offset..TOTAL.min(offset + limit))
        .map(|i| {
            json!({
                "id": i,
                "fullName": format!("acme/server-{}", i),
                "stars": 1000 - i,
                "url": format!("https://github.com/acme/server-{}", i),
                "license": "MIT"
            })
        })
        .collect();
    Json(Value::Array(page))
}

async fn get_repo(Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    if id == "7" {
        Ok(Json(json!({"id": 7, "fullName": "acme/server-7", "tools": ["read", "write"]})))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn search(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let q = params.get("q").cloned().unwrap_or_default();
    Json(json!([{"fullName": format!("acme/{}", q)}]))
}

fn github_page(requests: &Requests, params: HashMap<String, String>, total: usize) -> Json<Value> {
    let per_page = param(&params, "per_page");
    let page = param(&params, "page");
    requests.lock().unwrap().push(params);

    let start = page.saturating_sub(1) * per_page;
    let items: Vec<Value> = (start..total.min(start + per_page))
        .map(|i| {
            json!({
                "id": 5000 + i,
                "full_name": format!("octo/mcp-{}", i),
                "stargazers_count": 9000 - i,
                "html_url": format!("https://github.com/octo/mcp-{}", i),
                "description": null
            })
        })
        .collect();
    Json(json!({"total_count": total, "items": items}))
}

async fn github_search(
    State(requests): State<Requests>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    github_page(&requests, params, TOTAL)
}

/// GitHub search over `total` repositories, honouring `per_page` up to 100.
async fn start_github_server(total: usize) -> (String, Requests) {
    let requests = Requests::default();
    let router = Router::new()
        .route(
            "/search/repositories",
            get(
                move |State(requests): State<Requests>,
                      Query(params): Query<HashMap<String, String>>| async move {
                    if param(&params, "per_page") > 100 {
                        return Err(StatusCode::UNPROCESSABLE_ENTITY);
                    }
                    Ok(github_page(&requests, params, total))
                },
            ),
        )
        .with_state(requests.clone());
    (serve(router).await, requests)
}

async fn start_server() -> (String, Requests) {
    let requests = Requests::default();
    let router = Router::new()
        .route("/api/repos", get(list_repos))
        .route("/api/repos/:id", get(get_repo))
        .route("/api/search", get(search))
        .route("/broken/repos", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/search/repositories", get(github_search))
        .with_state(requests.clone());
    (serve(router).await, requests)
}

fn catalog(base: &str) -> HttpCatalog {
    HttpCatalog::new(
        format!("{}/api/repos", base),
        format!("{}/api/search", base),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn test_catalog_pages_with_query_parameters() {
    let (base, requests) = start_server().await;
    let cursor =
        PaginationCursor::new(Arc::new(catalog(&base))).with_page_delay(Duration::ZERO);

    let entries = cursor.fetch_all(12, None).await.unwrap();

    assert_eq!(entries.len(), TOTAL);
    assert_eq!(entries[0].repo_ref().as_deref(), Some("acme/server-0"));
    assert_eq!(entries[28].stars, Some(972));
    assert_eq!(entries[3].extra["license"], "MIT");

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 3);
    let offsets: Vec<&str> = requests.iter().map(|r| r["offset"].as_str()).collect();
    assert_eq!(offsets, vec!["0", "12", "24"]);
    for request in requests.iter() {
        assert_eq!(request["limit"], "12");
        assert_eq!(request["sort"], "stars");
        assert_eq!(request["order"], "desc");
    }
}

#[tokio::test]
async fn test_custom_ordering() {
    let (base, requests) = start_server().await;
    let catalog = catalog(&base).with_ordering("updated", "asc");

    catalog.fetch_page(5, 0).await.unwrap();

    let requests = requests.lock().unwrap();
    assert_eq!(requests[0]["sort"], "updated");
    assert_eq!(requests[0]["order"], "asc");
}

#[tokio::test]
async fn test_configured_ordering_reaches_requests() {
    let (base, requests) = start_server().await;
    let config = CensusConfig {
        catalog_url: format!("{}/api/repos", base),
        search_url: format!("{}/api/search", base),
        catalog_sort: "updated".to_string(),
        catalog_order: "asc".to_string(),
        ..CensusConfig::default()
    };
    let cursor =
        PaginationCursor::new(Arc::new(config.catalog().unwrap())).with_page_delay(Duration::ZERO);

    let entries = cursor.fetch_all(12, Some(2)).await.unwrap();

    assert_eq!(entries.len(), 24);
    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    for request in requests.iter() {
        assert_eq!(request["sort"], "updated");
        assert_eq!(request["order"], "asc");
    }
}

#[tokio::test]
async fn test_server_error_is_unavailable() {
    let (base, _) = start_server().await;
    let broken = HttpCatalog::new(
        format!("{}/broken/repos", base),
        format!("{}/api/search", base),
        Duration::from_secs(5),
    )
    .unwrap();

    let result = broken.fetch_page(12, 0).await;
    assert!(matches!(
        result,
        Err(CatalogError::Unavailable { status: 500, .. })
    ));

    // the cursor treats it as the end of the collection
    let cursor = PaginationCursor::new(Arc::new(broken)).with_page_delay(Duration::ZERO);
    assert!(cursor.fetch_all(12, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_entry() {
    let (base, _) = start_server().await;
    let catalog = catalog(&base);

    let found = catalog.get_entry(&EntryId::from(7)).await.unwrap();
    assert_eq!(found["tools"], json!(["read", "write"]));

    assert!(catalog.get_entry(&EntryId::from(8)).await.is_none());
}

#[tokio::test]
async fn test_search() {
    let (base, _) = start_server().await;

    let results = catalog(&base).search("files").await;
    assert_eq!(results.url, format!("{}/api/search?q=files", base));
    assert_eq!(results.results, vec![json!({"fullName": "acme/files"})]);
}

#[tokio::test]
async fn test_search_failure_yields_empty_results() {
    let (base, _) = start_server().await;
    let catalog = HttpCatalog::new(
        format!("{}/api/repos", base),
        format!("{}/missing", base),
        Duration::from_secs(5),
    )
    .unwrap();

    let results = catalog.search("files").await;
    assert_eq!(results.url, format!("{}/missing?q=files", base));
    assert!(results.results.is_empty());
}

#[tokio::test]
async fn test_github_search_pages() {
    let (base, requests) = start_server().await;
    let source = GithubSearchSource::new("topic:mcp", None, Duration::from_secs(5))
        .unwrap()
        .with_api_base(base);
    let cursor = PaginationCursor::new(Arc::new(source)).with_page_delay(Duration::ZERO);

    let entries = cursor.fetch_all(12, None).await.unwrap();

    assert_eq!(entries.len(), TOTAL);
    assert_eq!(entries[0].id.as_str(), "5000");
    assert_eq!(entries[13].repo_ref().as_deref(), Some("octo/mcp-13"));

    let requests = requests.lock().unwrap();
    let pages: Vec<&str> = requests.iter().map(|r| r["page"].as_str()).collect();
    assert_eq!(pages, vec!["1", "2", "3"]);
    assert!(requests.iter().all(|r| r["q"] == "topic:mcp"));
}

#[tokio::test]
async fn test_github_pages_larger_than_search_cap() {
    let (base, requests) = start_github_server(250).await;
    let source = GithubSearchSource::new("topic:mcp", None, Duration::from_secs(5))
        .unwrap()
        .with_api_base(base);
    let cursor = PaginationCursor::new(Arc::new(source)).with_page_delay(Duration::ZERO);

    let entries = cursor.fetch_all(150, None).await.unwrap();

    assert_eq!(entries.len(), 250);
    let ids: Vec<String> = entries.iter().map(|e| e.id.to_string()).collect();
    let expected: Vec<String> = (5000..5250).map(|i: usize| i.to_string()).collect();
    assert_eq!(ids, expected);

    let requests = requests.lock().unwrap();
    assert!(requests.iter().all(|r| param(r, "per_page") <= 100));
}
