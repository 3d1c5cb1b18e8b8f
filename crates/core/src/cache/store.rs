//! In-memory cache store for authors and titles.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use super::types::{BulkProgress, CacheEvent, LoadState, ShelfStats, Slot, WriteOutcome};
use crate::records::{Author, CatalogRecord, Title};

/// Buffer size for the cache event channel.
const EVENT_BUFFER_SIZE: usize = 256;

/// One cached collection, addressed by absolute catalog offset.
#[derive(Debug)]
pub struct Shelf<T> {
    slots: Vec<Slot<T>>,
    resident: usize,
    total_count: Option<usize>,
    dense: bool,
    generation: u64,
    snapshot: Option<(u64, Arc<Vec<T>>)>,
}

impl<T> Default for Shelf<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            resident: 0,
            total_count: None,
            dense: false,
            generation: 0,
            snapshot: None,
        }
    }
}

impl<T: Clone> Shelf<T> {
    fn is_resident(&self, offset: usize, count: usize) -> bool {
        let Some(end) = offset.checked_add(count) else {
            return false;
        };
        if count == 0 {
            return true;
        }
        if self.dense {
            if let Some(total) = self.total_count {
                if end <= total {
                    return true;
                }
            }
        }
        if end > self.slots.len() {
            return false;
        }
        self.slots[offset..end].iter().all(Slot::is_record)
    }

    fn read_range(&self, offset: usize, count: usize) -> Vec<T> {
        let start = offset.min(self.slots.len());
        let end = offset.saturating_add(count).min(self.slots.len());
        self.slots[start..end]
            .iter()
            .filter_map(Slot::as_record)
            .cloned()
            .collect()
    }

    fn write(&mut self, offset: usize, mut slots: Vec<Slot<T>>) -> WriteOutcome {
        let mut outcome = WriteOutcome::default();
        let requested = slots.len();

        // Positions at or past a known total never exist.
        let mut room = usize::MAX - offset;
        if let Some(total) = self.total_count {
            room = room.min(total.saturating_sub(offset));
        }
        slots.truncate(room);
        outcome.out_of_range = requested - slots.len();
        if slots.is_empty() {
            return outcome;
        }
        let end = offset + slots.len();

        if end > self.slots.len() {
            self.slots.resize_with(end, || Slot::Placeholder);
        }

        for (position, slot) in (offset..end).zip(slots) {
            match (&self.slots[position], slot) {
                (Slot::Record(_), Slot::Placeholder) => {
                    outcome.placeholders_ignored += 1;
                }
                (_, Slot::Placeholder) => {}
                (existing, Slot::Record(record)) => {
                    if !existing.is_record() {
                        self.resident += 1;
                    }
                    self.slots[position] = Slot::Record(record);
                    outcome.records_written += 1;
                }
            }
        }

        if outcome.records_written > 0 {
            self.generation += 1;
        }
        outcome
    }

    fn set_total_count(&mut self, total: usize) -> bool {
        match self.total_count {
            Some(current) if total <= current => false,
            _ => {
                self.total_count = Some(total);
                true
            }
        }
    }

    fn mark_dense(&mut self) -> bool {
        if self.dense {
            return true;
        }
        let Some(total) = self.total_count else {
            return false;
        };
        if self.slots.len() < total || !self.slots[..total].iter().all(Slot::is_record) {
            return false;
        }
        self.dense = true;
        true
    }

    fn records_in_range(&self) -> Vec<T> {
        let end = self.total_count.unwrap_or(self.slots.len()).min(self.slots.len());
        self.slots[..end]
            .iter()
            .filter_map(Slot::as_record)
            .cloned()
            .collect()
    }
}

/// Selects the shelf and load-state channel for a record type.
pub trait Shelved: CatalogRecord {
    #[doc(hidden)]
    fn shelf(store: &CacheStore) -> &RwLock<Shelf<Self>>;

    #[doc(hidden)]
    fn load_state_channel(store: &CacheStore) -> &watch::Sender<LoadState>;
}

impl Shelved for Author {
    fn shelf(store: &CacheStore) -> &RwLock<Shelf<Self>> {
        &store.authors
    }

    fn load_state_channel(store: &CacheStore) -> &watch::Sender<LoadState> {
        &store.author_state
    }
}

impl Shelved for Title {
    fn shelf(store: &CacheStore) -> &RwLock<Shelf<Self>> {
        &store.titles
    }

    fn load_state_channel(store: &CacheStore) -> &watch::Sender<LoadState> {
        &store.title_state
    }
}

/// The locally known subset of the remote catalog.
///
/// Every operation is infallible. A batch is applied under a single write
/// lock, so readers never observe half of a batch. A placeholder never
/// replaces a record, which keeps interleaved page loads and bulk loads
/// safe without further coordination.
pub struct CacheStore {
    authors: RwLock<Shelf<Author>>,
    titles: RwLock<Shelf<Title>>,
    author_state: watch::Sender<LoadState>,
    title_state: watch::Sender<LoadState>,
    events: broadcast::Sender<CacheEvent>,
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore {
    /// Create an empty store (both kinds idle, no total count).
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self {
            authors: RwLock::new(Shelf::default()),
            titles: RwLock::new(Shelf::default()),
            author_state: watch::Sender::new(LoadState::Idle),
            title_state: watch::Sender::new(LoadState::Idle),
            events,
        }
    }

    fn read<T: Shelved>(&self) -> RwLockReadGuard<'_, Shelf<T>> {
        T::shelf(self).read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock<T: Shelved>(&self) -> RwLockWriteGuard<'_, Shelf<T>> {
        T::shelf(self).write().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: CacheEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Subscribe to cache mutation events.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    /// True iff every position in `[offset, offset + count)` holds a record.
    pub fn is_resident<T: Shelved>(&self, offset: usize, count: usize) -> bool {
        self.read::<T>().is_resident(offset, count)
    }

    /// The records resident in `[offset, offset + count)`, in offset order.
    pub fn read_range<T: Shelved>(&self, offset: usize, count: usize) -> Vec<T> {
        self.read::<T>().read_range(offset, count)
    }

    /// Place `slots` starting at `offset`, padding any gap with placeholders.
    ///
    /// An empty write is a no-op, and slots at or past a known total count
    /// are dropped, so a gap is only ever padded up to real data.
    pub fn write<T: Shelved>(&self, offset: usize, slots: Vec<Slot<T>>) -> WriteOutcome {
        let requested = slots.len();
        let outcome = self.write_lock::<T>().write(offset, slots);
        let count = outcome.applied(requested);

        if outcome.out_of_range > 0 {
            debug!(
                "Dropped {} {} slot(s) past the end of the catalog at offset {}",
                outcome.out_of_range,
                T::KIND,
                offset
            );
        }

        if outcome.placeholders_ignored > 0 {
            warn!(
                "Ignored {} placeholder(s) over loaded {} at offset {}",
                outcome.placeholders_ignored,
                T::KIND,
                offset
            );
        }
        debug!(
            "Cache write: {} offset={} count={} written={}",
            T::KIND,
            offset,
            count,
            outcome.records_written
        );

        if count > 0 {
            self.emit(CacheEvent::Written {
                kind: T::KIND,
                offset,
                count,
            });
        }
        outcome
    }

    /// Place fetched records starting at `offset`.
    pub fn write_records<T: Shelved>(&self, offset: usize, records: Vec<T>) -> WriteOutcome {
        self.write(offset, records.into_iter().map(Slot::Record).collect())
    }

    /// Record the collection size. Values smaller than the known one are ignored.
    pub fn set_total_count<T: Shelved>(&self, total: usize) {
        let changed = self.write_lock::<T>().set_total_count(total);
        if changed {
            debug!("Total count for {} is now {}", T::KIND, total);
            self.emit(CacheEvent::TotalCount {
                kind: T::KIND,
                total,
            });
        }
    }

    pub fn total_count<T: Shelved>(&self) -> Option<usize> {
        self.read::<T>().total_count
    }

    /// Declare the collection complete.
    ///
    /// Only honored when `[0, total_count)` holds no placeholder. Once dense,
    /// a collection stays dense for the lifetime of the store.
    pub fn mark_dense<T: Shelved>(&self) -> bool {
        let (dense, newly) = {
            let mut shelf = self.write_lock::<T>();
            let was_dense = shelf.dense;
            let dense = shelf.mark_dense();
            (dense, dense && !was_dense)
        };
        if newly {
            debug!("{} cache is now dense", T::KIND);
            self.emit(CacheEvent::Dense { kind: T::KIND });
        }
        dense
    }

    pub fn is_dense<T: Shelved>(&self) -> bool {
        self.read::<T>().dense
    }

    /// Number of real records held.
    pub fn resident_count<T: Shelved>(&self) -> usize {
        self.read::<T>().resident
    }

    /// Counter bumped whenever records are written; used to invalidate derived views.
    pub fn generation<T: Shelved>(&self) -> u64 {
        self.read::<T>().generation
    }

    /// All resident records within the total count, in offset order.
    ///
    /// The returned vector is shared and rebuilt only after a write.
    pub fn snapshot<T: Shelved>(&self) -> Arc<Vec<T>> {
        {
            let shelf = self.read::<T>();
            if let Some((generation, records)) = &shelf.snapshot {
                if *generation == shelf.generation {
                    return Arc::clone(records);
                }
            }
        }

        let mut shelf = self.write_lock::<T>();
        if let Some((generation, records)) = &shelf.snapshot {
            if *generation == shelf.generation {
                return Arc::clone(records);
            }
        }
        let records = Arc::new(shelf.records_in_range());
        shelf.snapshot = Some((shelf.generation, Arc::clone(&records)));
        records
    }

    /// First resident record matching the predicate.
    pub fn find<T: Shelved>(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.read::<T>()
            .slots
            .iter()
            .filter_map(Slot::as_record)
            .find(|record| predicate(record))
            .cloned()
    }

    // =========================================================================
    // Load state
    // =========================================================================

    pub fn load_state<T: Shelved>(&self) -> LoadState {
        T::load_state_channel(self).borrow().clone()
    }

    pub fn set_load_state<T: Shelved>(&self, state: LoadState) {
        T::load_state_channel(self).send_replace(state.clone());
        self.emit(CacheEvent::LoadState {
            kind: T::KIND,
            state,
        });
    }

    /// Watch the load state of one collection.
    pub fn watch_load_state<T: Shelved>(&self) -> watch::Receiver<LoadState> {
        T::load_state_channel(self).subscribe()
    }

    /// Atomically move to `BulkLoading` unless a bulk run is already active.
    ///
    /// Returns `false` when another run holds the collection.
    pub fn try_begin_bulk<T: Shelved>(&self, progress: BulkProgress) -> bool {
        let mut started = false;
        T::load_state_channel(self).send_if_modified(|state| {
            if state.is_loading() {
                return false;
            }
            *state = LoadState::BulkLoading(progress.clone());
            started = true;
            true
        });
        if started {
            self.emit(CacheEvent::LoadState {
                kind: T::KIND,
                state: LoadState::BulkLoading(progress),
            });
        }
        started
    }

    /// Status snapshot of one collection.
    pub fn stats<T: Shelved>(&self) -> ShelfStats {
        let shelf = self.read::<T>();
        ShelfStats {
            kind: T::KIND,
            total_count: shelf.total_count,
            resident: shelf.resident,
            dense: shelf.dense,
            generation: shelf.generation,
            load_state: self.load_state::<T>(),
        }
    }
}
