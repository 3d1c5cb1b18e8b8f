//! Catalog records held by the cache.
//!
//! Records are built once by the mapper from the remote wire shape. Derived
//! fields (lowercase names, short title, EUR price) are computed inside the
//! constructors and have no setters, so they can never drift from the
//! canonical fields they are derived from.

mod types;

pub use types::*;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two record collections the engine caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Authors,
    Titles,
}

impl CatalogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Authors => "authors",
            CatalogKind::Titles => "titles",
        }
    }

    pub fn all() -> [CatalogKind; 2] {
        [CatalogKind::Authors, CatalogKind::Titles]
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "authors" | "author" => Ok(CatalogKind::Authors),
            "titles" | "title" => Ok(CatalogKind::Titles),
            other => Err(format!("unknown catalog kind: {}", other)),
        }
    }
}

/// A record that can live in the cache.
pub trait CatalogRecord: Clone + Send + Sync + 'static {
    /// Which collection this record type belongs to.
    const KIND: CatalogKind;

    /// Stable catalog key (author id or ISBN).
    fn key(&self) -> &str;
}

impl CatalogRecord for Author {
    const KIND: CatalogKind = CatalogKind::Authors;

    fn key(&self) -> &str {
        self.id()
    }
}

impl CatalogRecord for Title {
    const KIND: CatalogKind = CatalogKind::Titles;

    fn key(&self) -> &str {
        self.isbn()
    }
}
