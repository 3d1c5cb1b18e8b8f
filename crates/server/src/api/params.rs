//! Query parameters shared by the listing endpoints.

use std::str::FromStr;

use bookshelf_core::search::SortField;
use bookshelf_core::{SortDirection, SortState};
use serde::{Deserialize, Serialize};

use super::handlers::{bad_request, ApiError};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 500;

#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl PageParams {
    pub fn validated(self) -> Result<Self, ApiError> {
        check_page_size(self.page_size)?;
        Ok(self)
    }
}

#[derive(Debug, Deserialize)]
pub struct BrowseParams {
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl BrowseParams {
    /// Parse the sort field and direction, falling back to the field's default ascending.
    pub fn sort_state<F>(&self) -> Result<SortState<F>, ApiError>
    where
        F: SortField + Default + FromStr<Err = String>,
    {
        check_page_size(self.page_size)?;
        let field = match self.sort.as_deref() {
            Some(s) => s.parse::<F>().map_err(bad_request)?,
            None => F::default(),
        };
        let direction = match self.direction.as_deref() {
            Some(d) => d.parse::<SortDirection>().map_err(bad_request)?,
            None => SortDirection::Ascending,
        };
        Ok(SortState { field, direction })
    }
}

/// Window into a remote-only listing, in the remote API's own terms.
#[derive(Debug, Deserialize)]
pub struct RangeParams {
    #[serde(default)]
    pub start: usize,
    #[serde(default = "default_page_size")]
    pub rows: usize,
}

impl RangeParams {
    pub fn validated(self) -> Result<Self, ApiError> {
        check_page_size(self.rows)?;
        Ok(self)
    }
}

/// A page of records as returned by the paged listing endpoints.
#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub records: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse<T> {
    pub records: Vec<T>,
    pub total: usize,
}

impl<T> From<Vec<T>> for SearchResponse<T> {
    fn from(records: Vec<T>) -> Self {
        let total = records.len();
        Self { records, total }
    }
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn check_page_size(page_size: usize) -> Result<(), ApiError> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(bad_request(format!(
            "page size must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }
    Ok(())
}
