//! On-demand page loader.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheStore, Shelved};
use crate::error::CatalogError;
use crate::metrics::PAGE_LOADS;
use crate::remote::{Fetchable, RemoteCatalog};

/// Serves single pages from the sparse cache, fetching only what is missing.
///
/// Independent of the bulk loader: it never waits for or starts a bulk run,
/// and both may write to the store at the same time.
#[derive(Clone)]
pub struct PageLoader {
    store: Arc<CacheStore>,
    remote: Arc<dyn RemoteCatalog>,
}

impl PageLoader {
    pub fn new(store: Arc<CacheStore>, remote: Arc<dyn RemoteCatalog>) -> Self {
        Self { store, remote }
    }

    /// Load page `page_index` (0-based) of `page_size` records.
    ///
    /// Returns from the cache when the whole window is resident. Otherwise
    /// issues exactly one request for the window and writes the result back.
    /// A failed request leaves the store untouched.
    pub async fn load_page<T>(&self, page_index: usize, page_size: usize) -> Result<Vec<T>, CatalogError>
    where
        T: Shelved + Fetchable,
    {
        let kind = T::KIND;
        if page_size == 0 {
            return Ok(Vec::new());
        }
        let Some(offset) = page_index.checked_mul(page_size) else {
            PAGE_LOADS.with_label_values(&[kind.as_str(), "out_of_range"]).inc();
            return Ok(Vec::new());
        };

        let count = match self.store.total_count::<T>() {
            Some(total) if offset >= total => {
                debug!("{} page at offset {} is past the end ({})", kind, offset, total);
                PAGE_LOADS.with_label_values(&[kind.as_str(), "out_of_range"]).inc();
                return Ok(Vec::new());
            }
            Some(total) => page_size.min(total - offset),
            None => page_size,
        };

        if self.store.is_resident::<T>(offset, count) {
            PAGE_LOADS.with_label_values(&[kind.as_str(), "cache"]).inc();
            return Ok(self.store.read_range::<T>(offset, count));
        }

        debug!("Fetching {} [{}, {})", kind, offset, offset.saturating_add(count));
        let page = match T::fetch_range(self.remote.as_ref(), offset, count).await {
            Ok(page) => page,
            Err(e) => {
                PAGE_LOADS.with_label_values(&[kind.as_str(), "failed"]).inc();
                return Err(CatalogError::PageFetchFailed {
                    kind,
                    offset,
                    limit: count,
                    source: e,
                });
            }
        };
        PAGE_LOADS.with_label_values(&[kind.as_str(), "remote"]).inc();

        let mut records = page.records;
        records.truncate(count);
        match page.total_count {
            Some(total) => self.store.set_total_count::<T>(total),
            // Short page without a count: the collection ends here. An empty
            // page past offset 0 only bounds the end from above.
            None if records.len() < count && (offset == 0 || !records.is_empty()) => {
                self.store.set_total_count::<T>(offset + records.len())
            }
            None => {}
        }

        if let Some(total) = self.store.total_count::<T>() {
            if offset >= total {
                debug!("{} page at offset {} is past the end ({})", kind, offset, total);
                return Ok(Vec::new());
            }
        }
        self.store.write_records(offset, records.clone());

        Ok(records)
    }
}
