//! Catalog session.
//!
//! One explicitly constructed object owning the cache store and the
//! subsystems that share it. Consumers hold an `Arc<CatalogSession>` and
//! drop it at the end of the session; there is no global instance.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::{CacheEvent, CacheStore, LoadState, ShelfStats};
use crate::config::{Config, LoaderConfig};
use crate::error::CatalogError;
use crate::loader::{BulkLoader, BulkOutcome, PageLoader};
use crate::records::{Author, CatalogKind, Title};
use crate::remote::{
    cover_url, PrhClient, RemoteCatalog, RemoteCatalogError, RemotePage, DEFAULT_COVER_BASE_URL,
};
use crate::search::{
    lucky_offset, AuthorQuery, AuthorSortField, SearchEngine, SortState, SortedPage, TitleQuery,
    TitleSortField,
};

/// Status of both collections, for progress reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogStatus {
    pub authors: ShelfStats,
    pub titles: ShelfStats,
}

/// The cache and search engine for one session.
pub struct CatalogSession {
    store: Arc<CacheStore>,
    remote: Arc<dyn RemoteCatalog>,
    bulk: BulkLoader,
    pages: PageLoader,
    search: SearchEngine,
    config: LoaderConfig,
    cover_base_url: String,
}

impl CatalogSession {
    /// Create a session with an empty cache over `remote`.
    pub fn new(remote: Arc<dyn RemoteCatalog>, config: LoaderConfig) -> Self {
        let store = Arc::new(CacheStore::new());
        let bulk = BulkLoader::new(store.clone(), remote.clone(), config.clone());
        let pages = PageLoader::new(store.clone(), remote.clone());
        let search = SearchEngine::new(store.clone(), bulk.clone());

        Self {
            store,
            remote,
            bulk,
            pages,
            search,
            config,
            cover_base_url: DEFAULT_COVER_BASE_URL.to_string(),
        }
    }

    /// Create a session talking to the PRH API.
    pub fn from_config(config: &Config) -> Result<Self, RemoteCatalogError> {
        let client = PrhClient::new(config.remote.clone())?;
        Ok(Self::new(Arc::new(client), config.loader.clone())
            .with_cover_base_url(config.remote.cover_base_url.clone()))
    }

    pub fn with_cover_base_url(mut self, url: impl Into<String>) -> Self {
        self.cover_base_url = url.into();
        self
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    pub fn loader_config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Subscribe to cache mutation events.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.store.subscribe()
    }

    pub fn status(&self) -> CatalogStatus {
        CatalogStatus {
            authors: self.store.stats::<Author>(),
            titles: self.store.stats::<Title>(),
        }
    }

    // =========================================================================
    // Paging
    // =========================================================================

    pub async fn author_page(&self, page: usize, page_size: usize) -> Result<Vec<Author>, CatalogError> {
        self.pages.load_page::<Author>(page, page_size).await
    }

    pub async fn title_page(&self, page: usize, page_size: usize) -> Result<Vec<Title>, CatalogError> {
        self.pages.load_page::<Title>(page, page_size).await
    }

    /// A uniformly random title, fetched through the page loader.
    ///
    /// `None` when the catalog is empty or the picked offset lies past the
    /// real end of a catalog whose size was not known yet.
    pub async fn feeling_lucky(&self) -> Result<Option<Title>, CatalogError> {
        let offset = {
            let mut rng = rand::thread_rng();
            lucky_offset(
                &mut rng,
                self.store.total_count::<Title>(),
                self.config.lucky_fallback_ceiling,
            )
        };
        let Some(offset) = offset else {
            return Ok(None);
        };

        debug!("Feeling lucky: title offset {}", offset);
        let mut page = self.pages.load_page::<Title>(offset, 1).await?;
        Ok(page.pop())
    }

    // =========================================================================
    // Search and sort
    // =========================================================================

    pub async fn search_authors(&self, query: &AuthorQuery) -> Result<Vec<Author>, CatalogError> {
        self.search.search_authors(query).await
    }

    pub async fn search_titles(&self, query: &TitleQuery) -> Result<Vec<Title>, CatalogError> {
        self.search.search_titles(query).await
    }

    pub async fn browse_authors(
        &self,
        sort: SortState<AuthorSortField>,
        page: usize,
        page_size: usize,
    ) -> Result<SortedPage<Author, AuthorSortField>, CatalogError> {
        self.search.sorted_page(sort, page, page_size).await
    }

    pub async fn browse_titles(
        &self,
        sort: SortState<TitleSortField>,
        page: usize,
        page_size: usize,
    ) -> Result<SortedPage<Title, TitleSortField>, CatalogError> {
        self.search.sorted_page(sort, page, page_size).await
    }

    // =========================================================================
    // Single records
    // =========================================================================

    /// One author, from the cache when resident, otherwise from the remote.
    pub async fn author(&self, id: &str) -> Result<Author, CatalogError> {
        if let Some(author) = self.store.find::<Author>(|a| a.id() == id) {
            return Ok(author);
        }
        self.remote
            .get_author(id)
            .await
            .map_err(CatalogError::from_lookup)
    }

    /// One title, from the cache when resident, otherwise from the remote.
    pub async fn title(&self, isbn: &str) -> Result<Title, CatalogError> {
        let isbn = isbn.trim();
        if let Some(title) = self.store.find::<Title>(|t| t.isbn() == isbn) {
            return Ok(title);
        }
        self.remote
            .get_title(isbn)
            .await
            .map_err(CatalogError::from_lookup)
    }

    /// A window of the titles written by one author. Not cached.
    pub async fn titles_by_author(
        &self,
        author_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<RemotePage<Title>, CatalogError> {
        self.remote
            .titles_for_author(author_id, offset, limit)
            .await
            .map_err(CatalogError::from_lookup)
    }

    pub fn cover_url(&self, isbn: &str) -> String {
        cover_url(&self.cover_base_url, isbn)
    }

    // =========================================================================
    // Bulk loading
    // =========================================================================

    /// Run a bulk load to completion (or report why none was needed).
    pub async fn bulk_load(&self, kind: CatalogKind) -> BulkOutcome {
        match kind {
            CatalogKind::Authors => self.bulk.load::<Author>().await,
            CatalogKind::Titles => self.bulk.load::<Title>().await,
        }
    }

    /// Start a bulk load in the background.
    pub fn preload(&self, kind: CatalogKind) -> JoinHandle<BulkOutcome> {
        self.bulk.spawn_kind(kind)
    }

    /// Wait until no bulk load is running for `kind`.
    pub async fn wait_until_settled(&self, kind: CatalogKind) -> LoadState {
        match kind {
            CatalogKind::Authors => self.bulk.wait_until_settled::<Author>().await,
            CatalogKind::Titles => self.bulk.wait_until_settled::<Title>().await,
        }
    }
}
