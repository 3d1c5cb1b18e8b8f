//! Remote catalog client.
//!
//! The remote API is paginated, rate limited and has poor text search. This
//! module only issues requests and maps responses; caching and search live
//! elsewhere.

mod prh;
pub(crate) mod wire;

pub use prh::{cover_url, PrhClient, PrhConfig, DEFAULT_COVER_BASE_URL};

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::records::{Author, CatalogRecord, Title};

/// Errors that can occur when talking to the remote catalog.
#[derive(Debug, Error)]
pub enum RemoteCatalogError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limit exceeded (HTTP 429).
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimited,

    /// Record not found (HTTP 404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned an error status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl RemoteCatalogError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, RemoteCatalogError::RateLimited)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteCatalogError::NotFound(_))
    }

    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RemoteCatalogError::Http(_) => "http_error",
            RemoteCatalogError::RateLimited => "rate_limited",
            RemoteCatalogError::NotFound(_) => "not_found",
            RemoteCatalogError::Api { .. } => "api_error",
            RemoteCatalogError::Parse(_) => "parse_error",
        }
    }
}

/// One page of records plus the total count, when the API reported one.
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePage<T> {
    pub total_count: Option<usize>,
    pub records: Vec<T>,
}

/// Server-side author ordering supported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteAuthorSort {
    LastName,
}

/// `GET authors?offset,limit,lastNameInitial?,sort?`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorListRequest {
    pub offset: usize,
    pub limit: usize,
    pub last_name_initial: Option<char>,
    pub sort: Option<RemoteAuthorSort>,
}

impl AuthorListRequest {
    pub fn range(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit,
            ..Default::default()
        }
    }
}

/// `GET titles?offset,limit,title?,author?,format?`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleListRequest {
    pub offset: usize,
    pub limit: usize,
    pub title: Option<String>,
    pub author: Option<String>,
    pub format: Option<String>,
}

impl TitleListRequest {
    pub fn range(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit,
            ..Default::default()
        }
    }
}

/// Read-only access to the remote catalog.
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// List a window of authors.
    async fn list_authors(
        &self,
        request: &AuthorListRequest,
    ) -> Result<RemotePage<Author>, RemoteCatalogError>;

    /// List a window of titles.
    async fn list_titles(
        &self,
        request: &TitleListRequest,
    ) -> Result<RemotePage<Title>, RemoteCatalogError>;

    /// Get one author by catalog id.
    async fn get_author(&self, id: &str) -> Result<Author, RemoteCatalogError>;

    /// Get one title by ISBN.
    async fn get_title(&self, isbn: &str) -> Result<Title, RemoteCatalogError>;

    /// List a window of the titles written by one author.
    async fn titles_for_author(
        &self,
        author_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<RemotePage<Title>, RemoteCatalogError>;
}

/// Records that can be fetched from the remote catalog by absolute offset.
pub trait Fetchable: CatalogRecord {
    fn fetch_range<'a>(
        remote: &'a dyn RemoteCatalog,
        offset: usize,
        limit: usize,
    ) -> BoxFuture<'a, Result<RemotePage<Self>, RemoteCatalogError>>;
}

impl Fetchable for Author {
    fn fetch_range<'a>(
        remote: &'a dyn RemoteCatalog,
        offset: usize,
        limit: usize,
    ) -> BoxFuture<'a, Result<RemotePage<Self>, RemoteCatalogError>> {
        Box::pin(async move {
            remote
                .list_authors(&AuthorListRequest::range(offset, limit))
                .await
        })
    }
}

impl Fetchable for Title {
    fn fetch_range<'a>(
        remote: &'a dyn RemoteCatalog,
        offset: usize,
        limit: usize,
    ) -> BoxFuture<'a, Result<RemotePage<Self>, RemoteCatalogError>> {
        Box::pin(async move {
            remote
                .list_titles(&TitleListRequest::range(offset, limit))
                .await
        })
    }
}
