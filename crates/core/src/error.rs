//! Engine-level errors.
//!
//! The cache store never fails; everything that can go wrong happens while
//! talking to the remote catalog and is reported here.

use thiserror::Error;

use crate::records::CatalogKind;
use crate::remote::RemoteCatalogError;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Single-record lookup miss. The cache is left untouched.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An on-demand page request failed.
    #[error("Failed to load {kind} [{offset}, {}): {source}", .offset + .limit)]
    PageFetchFailed {
        kind: CatalogKind,
        offset: usize,
        limit: usize,
        #[source]
        source: RemoteCatalogError,
    },

    /// One bulk batch failed. Only ever recorded in a bulk report.
    #[error("Failed to load {kind} batch [{offset}, {}): {source}", .offset + .limit)]
    BatchFetchFailed {
        kind: CatalogKind,
        offset: usize,
        limit: usize,
        #[source]
        source: RemoteCatalogError,
    },

    /// A single-record lookup failed for a reason other than "not found".
    #[error("Lookup failed: {0}")]
    LookupFailed(#[source] RemoteCatalogError),

    /// Search was requested but the bulk run left gaps in the collection.
    #[error("The {kind} catalog is incomplete ({missing} records missing)")]
    CatalogIncomplete { kind: CatalogKind, missing: usize },
}

impl CatalogError {
    /// True when the underlying remote response was a 429.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            CatalogError::PageFetchFailed { source, .. }
            | CatalogError::BatchFetchFailed { source, .. }
            | CatalogError::LookupFailed(source) => source.is_rate_limited(),
            CatalogError::NotFound(_) | CatalogError::CatalogIncomplete { .. } => false,
        }
    }

    /// Map a remote lookup error, turning 404 into [`CatalogError::NotFound`].
    pub fn from_lookup(error: RemoteCatalogError) -> Self {
        match error {
            RemoteCatalogError::NotFound(what) => CatalogError::NotFound(what),
            other => CatalogError::LookupFailed(other),
        }
    }
}
