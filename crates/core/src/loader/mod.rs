//! Loaders that move records from the remote catalog into the cache store.

mod bulk;
mod page;

pub use bulk::{BulkLoader, BulkOutcome, BulkReport};
pub use page::PageLoader;
