//! Mock remote catalog for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::time::Instant;

use crate::records::{Author, Title};
use crate::remote::{
    AuthorListRequest, RemoteAuthorSort, RemoteCatalog, RemoteCatalogError, RemotePage,
    TitleListRequest,
};

/// A recorded request for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Endpoint name: "authors", "titles", "author", "title" or "author_titles".
    pub endpoint: &'static str,
    /// Record id for single-record endpoints.
    pub key: Option<String>,
    pub offset: usize,
    pub limit: usize,
    /// When the request was received.
    pub issued_at: Instant,
    /// When the response was returned, if it has been.
    pub completed_at: Option<Instant>,
}

/// Mock implementation of the RemoteCatalog trait.
///
/// Provides controllable behavior for testing:
/// - Serve in-memory authors and titles by offset
/// - Record every request with issue and completion timestamps
/// - Fail the next request, or every list request at a given offset
/// - Delay every response
///
/// # Example
///
/// ```rust,ignore
/// use bookshelf_core::testing::{fixtures, MockRemoteCatalog};
///
/// let remote = MockRemoteCatalog::new();
/// remote.set_titles(fixtures::numbered_titles(1200));
/// remote.fail_at_offset(500, RemoteCatalogError::RateLimited);
///
/// // Use in a CatalogSession...
///
/// let offsets: Vec<_> = remote.recorded_requests().iter().map(|r| r.offset).collect();
/// ```
#[derive(Debug)]
pub struct MockRemoteCatalog {
    authors: Arc<RwLock<Vec<Author>>>,
    titles: Arc<RwLock<Vec<Title>>>,
    /// Recorded requests in arrival order.
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
    /// If set, the next request will fail with this error.
    next_error: Arc<RwLock<Option<RemoteCatalogError>>>,
    /// List requests starting at these offsets fail until cleared.
    failures: Arc<RwLock<HashMap<usize, RemoteCatalogError>>>,
    /// Simulated response latency.
    latency: Arc<RwLock<Duration>>,
    /// Whether list responses carry the total record count.
    report_total: Arc<RwLock<bool>>,
}

impl Default for MockRemoteCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRemoteCatalog {
    /// Create an empty mock catalog.
    pub fn new() -> Self {
        Self {
            authors: Arc::new(RwLock::new(Vec::new())),
            titles: Arc::new(RwLock::new(Vec::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            failures: Arc::new(RwLock::new(HashMap::new())),
            latency: Arc::new(RwLock::new(Duration::ZERO)),
            report_total: Arc::new(RwLock::new(true)),
        }
    }

    /// Replace the served authors.
    pub fn set_authors(&self, authors: Vec<Author>) {
        *write(&self.authors) = authors;
    }

    /// Replace the served titles.
    pub fn set_titles(&self, titles: Vec<Title>) {
        *write(&self.titles) = titles;
    }

    /// Get all recorded requests.
    pub fn recorded_requests(&self) -> Vec<RecordedRequest> {
        read(&self.requests).clone()
    }

    /// Recorded requests for one endpoint.
    pub fn requests_for(&self, endpoint: &str) -> Vec<RecordedRequest> {
        read(&self.requests)
            .iter()
            .filter(|r| r.endpoint == endpoint)
            .cloned()
            .collect()
    }

    /// Number of requests received.
    pub fn request_count(&self) -> usize {
        read(&self.requests).len()
    }

    /// Clear recorded requests.
    pub fn clear_recorded(&self) {
        write(&self.requests).clear();
    }

    /// Configure the next request to fail with the given error.
    pub fn set_next_error(&self, error: RemoteCatalogError) {
        *write(&self.next_error) = Some(error);
    }

    /// Make every list request starting at `offset` fail.
    pub fn fail_at_offset(&self, offset: usize, error: RemoteCatalogError) {
        write(&self.failures).insert(offset, error);
    }

    /// Remove all per-offset failures.
    pub fn clear_failures(&self) {
        write(&self.failures).clear();
    }

    /// Set the simulated response latency.
    pub fn set_latency(&self, latency: Duration) {
        *write(&self.latency) = latency;
    }

    /// Choose whether list responses carry the total record count.
    pub fn set_report_total(&self, report: bool) {
        *write(&self.report_total) = report;
    }

    fn record(&self, endpoint: &'static str, key: Option<&str>, offset: usize, limit: usize) -> usize {
        let mut requests = write(&self.requests);
        requests.push(RecordedRequest {
            endpoint,
            key: key.map(str::to_string),
            offset,
            limit,
            issued_at: Instant::now(),
            completed_at: None,
        });
        requests.len() - 1
    }

    fn complete(&self, index: usize) {
        if let Some(request) = write(&self.requests).get_mut(index) {
            request.completed_at = Some(Instant::now());
        }
    }

    /// Record the request, wait for the latency and pick any injected error.
    async fn begin(
        &self,
        endpoint: &'static str,
        key: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> (usize, Option<RemoteCatalogError>) {
        let index = self.record(endpoint, key, offset, limit);

        let latency = *read(&self.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let error = write(&self.next_error).take().or_else(|| {
            if key.is_some() {
                return None;
            }
            read(&self.failures).get(&offset).map(replicate)
        });
        (index, error)
    }

    fn page<T: Clone>(&self, matching: Vec<T>, offset: usize, limit: usize) -> RemotePage<T> {
        let total = matching.len();
        let records = matching.into_iter().skip(offset).take(limit).collect();
        RemotePage {
            total_count: if *read(&self.report_total) { Some(total) } else { None },
            records,
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Rebuild an error so a stored failure can be returned more than once.
fn replicate(error: &RemoteCatalogError) -> RemoteCatalogError {
    match error {
        RemoteCatalogError::RateLimited => RemoteCatalogError::RateLimited,
        RemoteCatalogError::NotFound(what) => RemoteCatalogError::NotFound(what.clone()),
        RemoteCatalogError::Api { status, message } => RemoteCatalogError::Api {
            status: *status,
            message: message.clone(),
        },
        RemoteCatalogError::Parse(message) => RemoteCatalogError::Parse(message.clone()),
        RemoteCatalogError::Http(e) => RemoteCatalogError::Api {
            status: 500,
            message: e.to_string(),
        },
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl RemoteCatalog for MockRemoteCatalog {
    async fn list_authors(
        &self,
        request: &AuthorListRequest,
    ) -> Result<RemotePage<Author>, RemoteCatalogError> {
        let (index, error) = self
            .begin("authors", None, request.offset, request.limit)
            .await;
        if let Some(e) = error {
            self.complete(index);
            return Err(e);
        }

        let mut matching: Vec<Author> = read(&self.authors)
            .iter()
            .filter(|a| match request.last_name_initial {
                Some(initial) => a.last_name_initial() == Some(initial.to_ascii_uppercase()),
                None => true,
            })
            .cloned()
            .collect();
        if let Some(RemoteAuthorSort::LastName) = request.sort {
            matching.sort_by(|a, b| a.last_name_lc().cmp(b.last_name_lc()));
        }

        let page = self.page(matching, request.offset, request.limit);
        self.complete(index);
        Ok(page)
    }

    async fn list_titles(
        &self,
        request: &TitleListRequest,
    ) -> Result<RemotePage<Title>, RemoteCatalogError> {
        let (index, error) = self
            .begin("titles", None, request.offset, request.limit)
            .await;
        if let Some(e) = error {
            self.complete(index);
            return Err(e);
        }

        let matching: Vec<Title> = read(&self.titles)
            .iter()
            .filter(|t| {
                request
                    .title
                    .as_deref()
                    .map_or(true, |q| contains_ci(t.title_full(), q))
                    && request
                        .author
                        .as_deref()
                        .map_or(true, |q| contains_ci(t.author_display_name(), q))
                    && request
                        .format
                        .as_deref()
                        .map_or(true, |q| t.format_code().eq_ignore_ascii_case(q))
            })
            .cloned()
            .collect();

        let page = self.page(matching, request.offset, request.limit);
        self.complete(index);
        Ok(page)
    }

    async fn get_author(&self, id: &str) -> Result<Author, RemoteCatalogError> {
        let (index, error) = self.begin("author", Some(id), 0, 1).await;
        let result = match error {
            Some(e) => Err(e),
            None => read(&self.authors)
                .iter()
                .find(|a| a.id() == id)
                .cloned()
                .ok_or_else(|| RemoteCatalogError::NotFound(format!("author {}", id))),
        };
        self.complete(index);
        result
    }

    async fn get_title(&self, isbn: &str) -> Result<Title, RemoteCatalogError> {
        let (index, error) = self.begin("title", Some(isbn), 0, 1).await;
        let result = match error {
            Some(e) => Err(e),
            None => read(&self.titles)
                .iter()
                .find(|t| t.isbn() == isbn)
                .cloned()
                .ok_or_else(|| RemoteCatalogError::NotFound(format!("title {}", isbn))),
        };
        self.complete(index);
        result
    }

    async fn titles_for_author(
        &self,
        author_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<RemotePage<Title>, RemoteCatalogError> {
        let (index, error) = self
            .begin("author_titles", Some(author_id), offset, limit)
            .await;
        if let Some(e) = error {
            self.complete(index);
            return Err(e);
        }

        let author = read(&self.authors).iter().find(|a| a.id() == author_id).cloned();
        let result = match author {
            Some(author) => {
                let matching: Vec<Title> = read(&self.titles)
                    .iter()
                    .filter(|t| contains_ci(t.author_display_name(), author.display_name()))
                    .cloned()
                    .collect();
                Ok(self.page(matching, offset, limit))
            }
            None => Err(RemoteCatalogError::NotFound(format!("author {}", author_id))),
        };
        self.complete(index);
        result
    }
}
