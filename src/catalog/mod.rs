//! Remote catalog access: entry types, page sources and the pagination cursor

pub mod cursor;
pub mod github;
pub mod http;
pub mod source;
pub mod types;

pub use cursor::{CursorError, CursorStats, PageHandler, PaginationCursor, DEFAULT_PAGE_DELAY};
pub use github::{GithubSearchSource, DEFAULT_GITHUB_API};
pub use http::HttpCatalog;
pub use source::{CatalogError, PageSource};
pub use types::{Entry, EntryId, SearchResults};
