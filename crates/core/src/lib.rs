pub mod cache;
pub mod config;
pub mod error;
pub mod loader;
pub mod mapper;
pub mod metrics;
pub mod records;
pub mod remote;
pub mod search;
pub mod session;
pub mod testing;

pub use cache::{BulkProgress, CacheEvent, CacheStore, LoadState, ShelfStats, Slot};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, LoaderConfig,
    SanitizedConfig, ServerConfig,
};
pub use error::CatalogError;
pub use loader::{BulkLoader, BulkOutcome, BulkReport, PageLoader};
pub use records::{Author, CatalogKind, CatalogRecord, NewTitle, Title};
pub use remote::{PrhClient, PrhConfig, RemoteCatalog, RemoteCatalogError, RemotePage};
pub use search::{
    AuthorQuery, AuthorSortField, SearchEngine, SortDirection, SortState, SortedPage, TitleQuery,
    TitleSortField,
};
pub use session::{CatalogSession, CatalogStatus};
