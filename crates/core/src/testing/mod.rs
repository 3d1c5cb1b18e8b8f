//! Testing utilities and a mock remote catalog.
//!
//! Lets the loaders, the search engine and the HTTP server be exercised
//! without talking to the real API.
//!
//! # Example
//!
//! ```rust,ignore
//! use bookshelf_core::testing::{fixtures, MockRemoteCatalog};
//!
//! let remote = Arc::new(MockRemoteCatalog::new());
//! remote.set_authors(fixtures::numbered_authors(50));
//! remote.set_titles(fixtures::numbered_titles(1200));
//!
//! let session = CatalogSession::new(remote.clone(), LoaderConfig::default());
//! ```

mod mock_remote;

pub use mock_remote::{MockRemoteCatalog, RecordedRequest};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::records::{Author, NewTitle, Title};

    /// Create a test author; the display name is "first last".
    pub fn author(id: &str, first_name: &str, last_name: &str) -> Author {
        Author::new(id, "", first_name, last_name)
    }

    /// Create `count` authors with ids "0", "1", ...
    pub fn numbered_authors(count: usize) -> Vec<Author> {
        (0..count)
            .map(|i| author(&i.to_string(), &format!("First{}", i), &format!("Last{}", i)))
            .collect()
    }

    /// Create a test title with reasonable defaults.
    pub fn title(isbn: &str, title: &str, author_display_name: &str) -> Title {
        Title::new(NewTitle {
            isbn: isbn.to_string(),
            title: title.to_string(),
            author_display_name: author_display_name.to_string(),
            format_code: "TR".to_string(),
            format_name: "Trade Paperback".to_string(),
            price_usd: Some("17.00".to_string()),
            on_sale_date: Some("2020-01-15".to_string()),
            ..Default::default()
        })
    }

    /// Create a test title with a specific format and price.
    pub fn priced_title(isbn: &str, title: &str, format_code: &str, price_usd: Option<&str>) -> Title {
        Title::new(NewTitle {
            isbn: isbn.to_string(),
            title: title.to_string(),
            author_display_name: "Test Author".to_string(),
            format_code: format_code.to_string(),
            format_name: format_code.to_string(),
            price_usd: price_usd.map(str::to_string),
            ..Default::default()
        })
    }

    /// ISBN of the `index`-th numbered title.
    pub fn numbered_isbn(index: usize) -> String {
        format!("978{:010}", index)
    }

    /// Create `count` titles with ISBNs from [`numbered_isbn`].
    pub fn numbered_titles(count: usize) -> Vec<Title> {
        (0..count)
            .map(|i| {
                title(
                    &numbered_isbn(i),
                    &format!("Title {}", i),
                    &format!("First{} Last{}", i % 7, i % 7),
                )
            })
            .collect()
    }
}
