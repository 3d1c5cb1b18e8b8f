//! Cache store.
//!
//! Holds the locally known subset of each collection as a sequence of
//! [`Slot`]s addressed by absolute catalog offset. A collection is *sparse*
//! while it may contain placeholders and *dense* once the bulk loader has
//! filled `[0, total_count)` completely.

mod store;
mod types;

pub use store::{CacheStore, Shelf, Shelved};
pub use types::*;
