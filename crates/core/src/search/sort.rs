//! Sort fields, sort state and memoized sorted views.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cache::Shelved;
use crate::records::{Author, Title};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(format!("unknown sort direction: {}", other)),
        }
    }
}

/// Precomputed comparison key, so a sort does not re-derive it per comparison.
#[derive(Debug, Clone)]
pub enum SortKey {
    /// Already lowercased text, compared lexicographically part by part.
    Text(String, String),
    /// Missing values sort after present ones.
    Number(Option<f64>),
    /// Missing or unparseable dates sort after present ones.
    Date(Option<NaiveDate>),
}

impl SortKey {
    fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Text(a1, a2), SortKey::Text(b1, b2)) => a1.cmp(b1).then_with(|| a2.cmp(b2)),
            (SortKey::Number(a), SortKey::Number(b)) => missing_last(a, b, f64::total_cmp),
            (SortKey::Date(a), SortKey::Date(b)) => missing_last(a, b, NaiveDate::cmp),
            _ => Ordering::Equal,
        }
    }
}

fn missing_last<T>(a: &Option<T>, b: &Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// A field a collection can be sorted by.
pub trait SortField: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    type Record: Shelved;

    fn sort_key(self, record: &Self::Record) -> SortKey;

    #[doc(hidden)]
    fn view_slot(views: &SortedViews) -> &Mutex<Option<SortedView<Self>>>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorSortField {
    FirstName,
    #[default]
    LastName,
}

impl SortField for AuthorSortField {
    type Record = Author;

    fn sort_key(self, author: &Author) -> SortKey {
        let (first, last) = (author.first_name_lc(), author.last_name_lc());
        match self {
            AuthorSortField::FirstName => SortKey::Text(first.to_string(), last.to_string()),
            AuthorSortField::LastName => SortKey::Text(last.to_string(), first.to_string()),
        }
    }

    fn view_slot(views: &SortedViews) -> &Mutex<Option<SortedView<Self>>> {
        &views.authors
    }
}

impl FromStr for AuthorSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first_name" | "first" => Ok(AuthorSortField::FirstName),
            "last_name" | "last" => Ok(AuthorSortField::LastName),
            other => Err(format!("unknown author sort field: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleSortField {
    #[default]
    Title,
    Author,
    Price,
    #[serde(alias = "on_sale_date")]
    Date,
}

impl SortField for TitleSortField {
    type Record = Title;

    fn sort_key(self, title: &Title) -> SortKey {
        match self {
            TitleSortField::Title => SortKey::Text(
                title.title_full().to_lowercase(),
                title.author_display_name().to_lowercase(),
            ),
            TitleSortField::Author => SortKey::Text(
                title.author_display_name().to_lowercase(),
                title.title_full().to_lowercase(),
            ),
            TitleSortField::Price => SortKey::Number(title.price_usd_value()),
            TitleSortField::Date => SortKey::Date(title.on_sale()),
        }
    }

    fn view_slot(views: &SortedViews) -> &Mutex<Option<SortedView<Self>>> {
        &views.titles
    }
}

impl FromStr for TitleSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(TitleSortField::Title),
            "author" => Ok(TitleSortField::Author),
            "price" => Ok(TitleSortField::Price),
            "date" | "on_sale_date" => Ok(TitleSortField::Date),
            other => Err(format!("unknown title sort field: {}", other)),
        }
    }
}

/// Current sort of a listing. Owned by the consumer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortState<F> {
    pub field: F,
    #[serde(default)]
    pub direction: SortDirection,
}

impl<F: SortField> SortState<F> {
    pub fn ascending(field: F) -> Self {
        Self {
            field,
            direction: SortDirection::Ascending,
        }
    }

    /// Select a sort field: the same field toggles direction, another resets to ascending.
    pub fn select(self, field: F) -> Self {
        if field == self.field {
            Self {
                field,
                direction: self.direction.reversed(),
            }
        } else {
            Self::ascending(field)
        }
    }
}

/// Stable sort of `records`; ties keep their catalog order in both directions.
pub fn sort_records<F: SortField>(records: &[F::Record], state: SortState<F>) -> Vec<F::Record> {
    let mut keyed: Vec<(SortKey, &F::Record)> = records
        .iter()
        .map(|record| (state.field.sort_key(record), record))
        .collect();

    match state.direction {
        SortDirection::Ascending => keyed.sort_by(|(a, _), (b, _)| a.compare(b)),
        SortDirection::Descending => keyed.sort_by(|(a, _), (b, _)| b.compare(a)),
    }

    keyed.into_iter().map(|(_, record)| record.clone()).collect()
}

/// A sorted copy of one collection, valid for one cache generation and sort state.
pub struct SortedView<F: SortField> {
    generation: u64,
    state: SortState<F>,
    records: Arc<Vec<F::Record>>,
}

/// The most recent sorted view per collection.
#[derive(Default)]
pub struct SortedViews {
    authors: Mutex<Option<SortedView<AuthorSortField>>>,
    titles: Mutex<Option<SortedView<TitleSortField>>>,
}

impl SortedViews {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the memoized view for `(generation, state)`, building it when stale.
    ///
    /// The boolean is `true` when the memoized view was reused.
    pub fn get_or_build<F: SortField>(
        &self,
        generation: u64,
        state: SortState<F>,
        records: impl FnOnce() -> Arc<Vec<F::Record>>,
    ) -> (Arc<Vec<F::Record>>, bool) {
        let mut slot = F::view_slot(self)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(view) = slot.as_ref() {
            if view.generation == generation && view.state == state {
                return (Arc::clone(&view.records), true);
            }
        }

        let sorted = Arc::new(sort_records(&records(), state));
        *slot = Some(SortedView {
            generation,
            state,
            records: Arc::clone(&sorted),
        });
        (sorted, false)
    }
}
