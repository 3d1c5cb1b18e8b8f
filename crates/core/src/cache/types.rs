//! Types for the cache store.

use serde::Serialize;

use crate::records::CatalogKind;

/// One position of a cached collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<T> {
    /// Known to exist (within the total count) but not fetched yet.
    Placeholder,
    /// A fetched record.
    Record(T),
}

impl<T> Slot<T> {
    pub fn is_record(&self) -> bool {
        matches!(self, Slot::Record(_))
    }

    pub fn as_record(&self) -> Option<&T> {
        match self {
            Slot::Record(record) => Some(record),
            Slot::Placeholder => None,
        }
    }
}

impl<T> From<T> for Slot<T> {
    fn from(record: T) -> Self {
        Slot::Record(record)
    }
}

/// Progress of a running bulk load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkProgress {
    /// Batches processed so far (loaded, failed or skipped).
    pub batches_done: usize,
    /// Batches whose request failed.
    pub batches_failed: usize,
    /// Records written by this run.
    pub records_loaded: usize,
    /// Current estimate of the collection size.
    pub expected_total: usize,
}

/// Loading state of one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    Idle,
    BulkLoading(BulkProgress),
    /// The last bulk run finished with gaps.
    Error {
        failed_batches: usize,
        message: String,
    },
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::BulkLoading(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoadState::Idle => "idle",
            LoadState::BulkLoading(_) => "bulk_loading",
            LoadState::Error { .. } => "error",
        }
    }
}

/// Notification sent on every cache mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CacheEvent {
    Written {
        kind: CatalogKind,
        offset: usize,
        count: usize,
    },
    TotalCount {
        kind: CatalogKind,
        total: usize,
    },
    Dense {
        kind: CatalogKind,
    },
    LoadState {
        kind: CatalogKind,
        state: LoadState,
    },
}

/// Result of a [`write`](super::CacheStore::write).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Records stored (new or refreshed).
    pub records_written: usize,
    /// Placeholders that were dropped because a record already sits there.
    pub placeholders_ignored: usize,
    /// Slots past the known total count (or past `usize::MAX`), not stored.
    pub out_of_range: usize,
}

impl WriteOutcome {
    /// Number of slot positions the write actually touched.
    pub fn applied(&self, requested: usize) -> usize {
        requested - self.out_of_range
    }
}

/// Snapshot of one collection for status reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShelfStats {
    pub kind: CatalogKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<usize>,
    pub resident: usize,
    pub dense: bool,
    pub generation: u64,
    pub load_state: LoadState,
}
