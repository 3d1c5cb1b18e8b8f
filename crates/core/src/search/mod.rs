//! Search, filter and sort over the local cache.
//!
//! Queries only ever run against a dense collection. When a collection is
//! not dense yet the engine runs (or waits for) a bulk load first, so a
//! result is never silently computed over a partial cache.

mod query;
mod sort;

pub use query::{AuthorMatcher, AuthorQuery, Keyword, TitleQuery};
pub use sort::{
    sort_records, AuthorSortField, SortDirection, SortField, SortKey, SortState, SortedView,
    SortedViews, TitleSortField,
};

use std::sync::Arc;

use rand::Rng;
use tracing::debug;

use crate::cache::CacheStore;
use crate::error::CatalogError;
use crate::loader::BulkLoader;
use crate::metrics::{SEARCH_DURATION, SORTED_VIEWS};
use crate::records::{Author, CatalogRecord, Title};
use crate::remote::Fetchable;

/// One page of a sorted listing.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SortedPage<T, F> {
    pub records: Vec<T>,
    pub total_count: usize,
    pub page: usize,
    pub page_size: usize,
    pub sort: SortState<F>,
}

/// Search and sort engine over a shared [`CacheStore`].
pub struct SearchEngine {
    store: Arc<CacheStore>,
    bulk: BulkLoader,
    views: SortedViews,
}

impl SearchEngine {
    pub fn new(store: Arc<CacheStore>, bulk: BulkLoader) -> Self {
        Self {
            store,
            bulk,
            views: SortedViews::new(),
        }
    }

    /// Authors whose first and last names start with the given prefixes.
    pub async fn search_authors(&self, query: &AuthorQuery) -> Result<Vec<Author>, CatalogError> {
        self.bulk.ensure_loaded::<Author>().await?;

        let timer = SEARCH_DURATION
            .with_label_values(&[Author::KIND.as_str()])
            .start_timer();
        let matcher = query.matcher();
        let authors = self.store.snapshot::<Author>();
        let results: Vec<Author> = authors
            .iter()
            .filter(|a| matcher.matches(a))
            .cloned()
            .collect();
        timer.observe_duration();

        debug!("Author search {:?}: {} result(s)", query, results.len());
        Ok(results)
    }

    /// Titles matching every supplied criterion.
    ///
    /// Filters apply in order: keyword, author, format, non-book exclusion.
    /// The author criterion first resolves matching authors, then keeps the
    /// titles whose author display name contains one of theirs.
    pub async fn search_titles(&self, query: &TitleQuery) -> Result<Vec<Title>, CatalogError> {
        let author_matcher = query.author_matcher();

        self.bulk.ensure_loaded::<Title>().await?;
        if author_matcher.is_some() {
            self.bulk.ensure_loaded::<Author>().await?;
        }

        let timer = SEARCH_DURATION
            .with_label_values(&[Title::KIND.as_str()])
            .start_timer();

        let keyword = query.parsed_keyword();
        let resolved_authors: Option<Vec<String>> = author_matcher.map(|matcher| {
            self.store
                .snapshot::<Author>()
                .iter()
                .filter(|a| matcher.matches(a))
                .map(|a| a.display_name().to_lowercase())
                .filter(|name| !name.is_empty())
                .collect()
        });
        let format = query.format_code();

        let titles = self.store.snapshot::<Title>();
        let results: Vec<Title> = titles
            .iter()
            .filter(|t| keyword.as_ref().map_or(true, |k| k.matches(t)))
            .filter(|t| {
                resolved_authors.as_ref().map_or(true, |names| {
                    let author = t.author_display_name().to_lowercase();
                    names.iter().any(|name| author.contains(name.as_str()))
                })
            })
            .filter(|t| format.as_deref().map_or(true, |f| t.format_code() == f))
            .filter(|t| !(query.exclude_non_books && t.is_non_book()))
            .cloned()
            .collect();
        timer.observe_duration();

        debug!("Title search {:?}: {} result(s)", query, results.len());
        Ok(results)
    }

    /// One page of the collection in the requested order.
    ///
    /// The sorted view is memoized and rebuilt only when the collection is
    /// written to or the sort changes.
    pub async fn sorted_page<F>(
        &self,
        sort: SortState<F>,
        page: usize,
        page_size: usize,
    ) -> Result<SortedPage<F::Record, F>, CatalogError>
    where
        F: SortField,
        F::Record: Fetchable,
    {
        self.bulk.ensure_loaded::<F::Record>().await?;

        let kind = <F::Record as CatalogRecord>::KIND;
        let generation = self.store.generation::<F::Record>();
        let (sorted, reused) = self
            .views
            .get_or_build(generation, sort, || self.store.snapshot::<F::Record>());
        SORTED_VIEWS
            .with_label_values(&[kind.as_str(), if reused { "hit" } else { "rebuild" }])
            .inc();

        let start = page.saturating_mul(page_size).min(sorted.len());
        let end = start.saturating_add(page_size).min(sorted.len());

        Ok(SortedPage {
            records: sorted[start..end].to_vec(),
            total_count: sorted.len(),
            page,
            page_size,
            sort,
        })
    }
}

/// Pick a uniformly random offset for "feeling lucky".
///
/// Uses the known total, or `fallback_ceiling` when no total is known yet.
/// Returns `None` for an empty collection.
pub fn lucky_offset<R: Rng>(
    rng: &mut R,
    total_count: Option<usize>,
    fallback_ceiling: usize,
) -> Option<usize> {
    let ceiling = total_count.unwrap_or(fallback_ceiling);
    if ceiling == 0 {
        return None;
    }
    Some(rng.gen_range(0..ceiling))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoaderConfig;
    use crate::remote::RemoteCatalogError;
    use crate::testing::{fixtures, MockRemoteCatalog};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn engine(
        authors: Vec<Author>,
        titles: Vec<Title>,
    ) -> (Arc<CacheStore>, Arc<MockRemoteCatalog>, SearchEngine) {
        let store = Arc::new(CacheStore::new());
        let remote = Arc::new(MockRemoteCatalog::new());
        remote.set_authors(authors);
        remote.set_titles(titles);
        let config = LoaderConfig {
            batch_size: 100,
            batch_delay_ms: 0,
            ..Default::default()
        };
        let bulk = BulkLoader::new(store.clone(), remote.clone(), config);
        (store.clone(), remote, SearchEngine::new(store, bulk))
    }

    fn name_fixture() -> Vec<Author> {
        vec![
            fixtures::author("1", "Anne", "Brontë"),
            fixtures::author("2", "Anne", "Tyler"),
            fixtures::author("3", "Andrew", "Bright"),
            fixtures::author("4", "Charlotte", "Brontë"),
            fixtures::author("5", "Annie", "Proulx"),
            fixtures::author("6", "Bea", "Annsley"),
        ]
    }

    #[tokio::test]
    async fn test_search_triggers_bulk_load() {
        let (store, remote, engine) = engine(name_fixture(), Vec::new());
        assert!(!store.is_dense::<Author>());

        let results = engine.search_authors(&AuthorQuery::default()).await.unwrap();

        assert_eq!(results.len(), 6);
        assert!(store.is_dense::<Author>());
        assert_eq!(remote.requests_for("authors").len(), 1);
    }

    #[tokio::test]
    async fn test_author_search_is_intersection() {
        let (_store, _remote, engine) = engine(name_fixture(), Vec::new());

        let first_only = engine
            .search_authors(&AuthorQuery::new(Some("an"), None))
            .await
            .unwrap();
        let last_only = engine
            .search_authors(&AuthorQuery::new(None, Some("br")))
            .await
            .unwrap();
        let both = engine
            .search_authors(&AuthorQuery::new(Some("an"), Some("br")))
            .await
            .unwrap();

        let ids = |authors: &[Author]| authors.iter().map(|a| a.id().to_string()).collect::<Vec<_>>();
        assert_eq!(ids(&first_only), vec!["1", "2", "3", "5"]);
        assert_eq!(ids(&last_only), vec!["1", "3", "4"]);
        let expected: Vec<String> = ids(&first_only)
            .into_iter()
            .filter(|id| ids(&last_only).contains(id))
            .collect();
        assert_eq!(ids(&both), expected);
    }

    fn title_fixture() -> Vec<Title> {
        vec![
            fixtures::title("9780000000001", "Numbers", "Anne Tyler"),
            fixtures::title("9781111111111", "Volume 9780000000001", "Anne Tyler"),
            fixtures::title("9782222222222", "The Shipping News", "Annie Proulx"),
            fixtures::priced_title("9783333333333", "Shipping Songs", "MU", Some("9.99")),
            fixtures::priced_title("9784444444444", "Shipping Puzzle", "PZ", None),
        ]
    }

    #[tokio::test]
    async fn test_numeric_keyword_is_exact_isbn() {
        let (_store, _remote, engine) = engine(Vec::new(), title_fixture());

        let results = engine
            .search_titles(&TitleQuery::keyword("9780000000001"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].isbn(), "9780000000001");
    }

    #[tokio::test]
    async fn test_text_keyword_with_exclusion() {
        let (_store, _remote, engine) = engine(Vec::new(), title_fixture());

        let all = engine.search_titles(&TitleQuery::keyword("shipping")).await.unwrap();
        assert_eq!(all.len(), 3);

        let books = engine
            .search_titles(&TitleQuery {
                keyword: Some("shipping".to_string()),
                exclude_non_books: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].isbn(), "9782222222222");
    }

    #[tokio::test]
    async fn test_author_criterion_resolves_authors_first() {
        let (store, _remote, engine) = engine(name_fixture(), title_fixture());

        let results = engine
            .search_titles(&TitleQuery {
                author: Some("tyler".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(store.is_dense::<Author>());
        let isbns: Vec<_> = results.iter().map(|t| t.isbn()).collect();
        assert_eq!(isbns, vec!["9780000000001", "9781111111111"]);

        let results = engine
            .search_titles(&TitleQuery {
                author: Some("Annie Proulx".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(results.len(), 1);

        // No author resolves, so no title matches.
        let results = engine
            .search_titles(&TitleQuery {
                author: Some("Nobody".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_format_is_case_insensitive() {
        let (_store, _remote, engine) = engine(Vec::new(), title_fixture());
        let results = engine
            .search_titles(&TitleQuery {
                format: Some("mu".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].format_code(), "MU");
    }

    #[tokio::test]
    async fn test_search_over_incomplete_catalog_fails() {
        let (_store, remote, engine) = engine(Vec::new(), fixtures::numbered_titles(250));
        remote.fail_at_offset(100, RemoteCatalogError::RateLimited);

        let err = engine.search_titles(&TitleQuery::keyword("title")).await.unwrap_err();
        assert!(matches!(err, CatalogError::CatalogIncomplete { missing: 100, .. }));
    }

    #[tokio::test]
    async fn test_sorted_page_is_memoized() {
        let titles = vec![
            fixtures::priced_title("1", "Ten", "TR", Some("10.00")),
            fixtures::priced_title("2", "Two", "TR", Some("2.00")),
            fixtures::priced_title("3", "Thirty", "TR", Some("30.00")),
        ];
        let (_store, remote, engine) = engine(Vec::new(), titles);
        let sort = SortState::ascending(TitleSortField::Price);

        let page = engine.sorted_page(sort, 0, 2).await.unwrap();
        let prices: Vec<_> = page.records.iter().map(|t| t.price_usd()).collect();
        assert_eq!(prices, vec![Some("2.00"), Some("10.00")]);
        assert_eq!(page.total_count, 3);

        let page = engine.sorted_page(sort, 1, 2).await.unwrap();
        assert_eq!(page.records[0].price_usd(), Some("30.00"));

        let page = engine
            .sorted_page(sort.select(TitleSortField::Price), 0, 3)
            .await
            .unwrap();
        let prices: Vec<_> = page.records.iter().map(|t| t.price_usd()).collect();
        assert_eq!(prices, vec![Some("30.00"), Some("10.00"), Some("2.00")]);
        assert_eq!(remote.request_count(), 1);
    }

    #[test]
    fn test_lucky_offset_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let offset = lucky_offset(&mut rng, Some(5), 10_000).unwrap();
            assert!(offset < 5);
        }
        for _ in 0..100 {
            let offset = lucky_offset(&mut rng, None, 20).unwrap();
            assert!(offset < 20);
        }
        assert_eq!(lucky_offset(&mut rng, Some(0), 20), None);
    }
}
