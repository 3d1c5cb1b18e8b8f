//! Bulk loader.
//!
//! Fills a collection end to end with a strictly sequential chain of
//! fixed-size batch requests, pausing between requests to stay under the
//! remote rate limit.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::cache::{BulkProgress, CacheStore, LoadState, Shelved};
use crate::config::LoaderConfig;
use crate::error::CatalogError;
use crate::metrics::BULK_BATCHES;
use crate::records::{Author, CatalogKind, Title};
use crate::remote::{Fetchable, RemoteCatalog};

/// Result of one bulk run.
#[derive(Debug)]
pub struct BulkReport {
    pub kind: CatalogKind,
    /// Batches whose request succeeded.
    pub batches_loaded: usize,
    /// Batches skipped because their range was already resident.
    pub batches_skipped: usize,
    /// One `BatchFetchFailed` per failed batch, in batch order.
    pub failures: Vec<CatalogError>,
    pub records_loaded: usize,
    pub total_count: Option<usize>,
    /// Whether the collection was marked dense at the end of the run.
    pub dense: bool,
}

impl BulkReport {
    fn new(kind: CatalogKind) -> Self {
        Self {
            kind,
            batches_loaded: 0,
            batches_skipped: 0,
            failures: Vec::new(),
            records_loaded: 0,
            total_count: None,
            dense: false,
        }
    }

    pub fn batches_failed(&self) -> usize {
        self.failures.len()
    }
}

/// What a call to [`BulkLoader::load`] did.
#[derive(Debug)]
pub enum BulkOutcome {
    /// The collection was already dense; nothing was requested.
    AlreadyDense,
    /// Another run for the same collection is in flight.
    AlreadyRunning,
    /// This call performed a run.
    Completed(BulkReport),
}

impl BulkOutcome {
    /// True when nothing was left to do.
    pub fn is_already_satisfied(&self) -> bool {
        matches!(self, BulkOutcome::AlreadyDense | BulkOutcome::AlreadyRunning)
    }
}

/// Drives full-collection ingestion into a shared [`CacheStore`].
#[derive(Clone)]
pub struct BulkLoader {
    store: Arc<CacheStore>,
    remote: Arc<dyn RemoteCatalog>,
    config: Arc<LoaderConfig>,
}

impl BulkLoader {
    pub fn new(
        store: Arc<CacheStore>,
        remote: Arc<dyn RemoteCatalog>,
        config: LoaderConfig,
    ) -> Self {
        Self {
            store,
            remote,
            config: Arc::new(config),
        }
    }

    /// Run a bulk load for `T` unless one is running or the collection is dense.
    ///
    /// Batches are issued one at a time. A batch request is only sent after
    /// the previous one has completed and the configured delay has elapsed.
    /// A failed batch is recorded and contributes zero records; the run
    /// always continues to the end.
    pub async fn load<T>(&self) -> BulkOutcome
    where
        T: Shelved + Fetchable,
    {
        let kind = T::KIND;
        if self.store.is_dense::<T>() {
            debug!("{} already dense, skipping bulk load", kind);
            return BulkOutcome::AlreadyDense;
        }

        let estimate = self.config.total_estimate(kind);
        let mut progress = BulkProgress {
            expected_total: self.store.total_count::<T>().unwrap_or(estimate),
            ..Default::default()
        };
        if !self.store.try_begin_bulk::<T>(progress.clone()) {
            debug!("{} bulk load already running", kind);
            return BulkOutcome::AlreadyRunning;
        }

        info!(
            "Starting {} bulk load (batch size {}, delay {:?})",
            kind,
            self.config.batch_size,
            self.config.batch_delay()
        );

        let batch_size = self.config.batch_size.max(1);
        let mut report = BulkReport::new(kind);
        let mut offset = 0;
        let mut issued_any = false;

        loop {
            // Re-read every iteration: the first response replaces the estimate.
            let total = self.store.total_count::<T>().unwrap_or(estimate);
            if offset >= total {
                break;
            }
            let limit = batch_size.min(total - offset);
            progress.expected_total = total;

            if self.store.is_resident::<T>(offset, limit) {
                debug!("{} batch [{}, {}) already resident", kind, offset, offset + limit);
                BULK_BATCHES
                    .with_label_values(&[kind.as_str(), "skipped"])
                    .inc();
                report.batches_skipped += 1;
            } else {
                if issued_any {
                    sleep(self.config.batch_delay()).await;
                }
                issued_any = true;

                match T::fetch_range(self.remote.as_ref(), offset, limit).await {
                    Ok(page) => {
                        if let Some(reported) = page.total_count {
                            self.store.set_total_count::<T>(reported);
                        }
                        let mut records = page.records;
                        records.truncate(limit);
                        let received = records.len();

                        if page.total_count.is_none() && received < limit {
                            // Short page without a count: the collection ends here.
                            self.store.set_total_count::<T>(offset + received);
                        }

                        let outcome = self.store.write_records(offset, records);
                        BULK_BATCHES
                            .with_label_values(&[kind.as_str(), "loaded"])
                            .inc();
                        report.batches_loaded += 1;
                        report.records_loaded += outcome.records_written;
                        progress.records_loaded += outcome.records_written;
                    }
                    Err(e) => {
                        warn!(
                            "{} batch [{}, {}) failed: {}",
                            kind,
                            offset,
                            offset + limit,
                            e
                        );
                        BULK_BATCHES
                            .with_label_values(&[kind.as_str(), "failed"])
                            .inc();
                        progress.batches_failed += 1;
                        report.failures.push(CatalogError::BatchFetchFailed {
                            kind,
                            offset,
                            limit,
                            source: e,
                        });
                    }
                }
            }

            progress.batches_done += 1;
            // A response may have replaced the estimate.
            progress.expected_total = self.store.total_count::<T>().unwrap_or(estimate);
            self.store
                .set_load_state::<T>(LoadState::BulkLoading(progress.clone()));
            offset += limit;
        }

        self.finish::<T>(report)
    }

    fn finish<T: Shelved>(&self, mut report: BulkReport) -> BulkOutcome {
        let kind = T::KIND;
        report.total_count = self.store.total_count::<T>();
        report.dense = self.store.mark_dense::<T>();

        if report.dense {
            info!(
                "{} bulk load complete: {} records ({} batches loaded, {} skipped)",
                kind,
                report.total_count.unwrap_or(0),
                report.batches_loaded,
                report.batches_skipped
            );
            self.store.set_load_state::<T>(LoadState::Idle);
        } else {
            let missing = self.missing::<T>();
            let message = match report.failures.last() {
                Some(last) => format!("{} records missing; last failure: {}", missing, last),
                None => format!("{} records missing", missing),
            };
            warn!(
                "{} bulk load finished with gaps: {} failed batch(es), {}",
                kind,
                report.batches_failed(),
                message
            );
            self.store.set_load_state::<T>(LoadState::Error {
                failed_batches: report.batches_failed(),
                message,
            });
        }

        BulkOutcome::Completed(report)
    }

    fn missing<T: Shelved>(&self) -> usize {
        match self.store.total_count::<T>() {
            Some(total) => total.saturating_sub(self.store.resident_count::<T>()),
            None => self.config.total_estimate(T::KIND),
        }
    }

    /// Wait until no bulk run is active for `T`.
    pub async fn wait_until_settled<T: Shelved>(&self) -> LoadState {
        let mut state = self.store.watch_load_state::<T>();
        if let Ok(settled) = state.wait_for(|s| !s.is_loading()).await {
            return (*settled).clone();
        }
        self.store.load_state::<T>()
    }

    /// Make sure `T` is dense, running or awaiting a bulk load as needed.
    ///
    /// Fails with `CatalogIncomplete` when the run ends with gaps.
    pub async fn ensure_loaded<T>(&self) -> Result<(), CatalogError>
    where
        T: Shelved + Fetchable,
    {
        if self.store.is_dense::<T>() {
            return Ok(());
        }

        // The run lives on its own task so a dropped caller cannot strand it.
        match self.spawn::<T>().await {
            Ok(BulkOutcome::AlreadyRunning) => {
                self.wait_until_settled::<T>().await;
            }
            Ok(_) => {}
            Err(e) => warn!("{} bulk load task failed: {}", T::KIND, e),
        }

        if self.store.is_dense::<T>() {
            Ok(())
        } else {
            Err(CatalogError::CatalogIncomplete {
                kind: T::KIND,
                missing: self.missing::<T>(),
            })
        }
    }

    /// Start a background bulk load.
    pub fn spawn<T>(&self) -> JoinHandle<BulkOutcome>
    where
        T: Shelved + Fetchable,
    {
        let loader = self.clone();
        tokio::spawn(async move { loader.load::<T>().await })
    }

    /// Start a background bulk load for a collection chosen at runtime.
    pub fn spawn_kind(&self, kind: CatalogKind) -> JoinHandle<BulkOutcome> {
        match kind {
            CatalogKind::Authors => self.spawn::<Author>(),
            CatalogKind::Titles => self.spawn::<Title>(),
        }
    }
}
