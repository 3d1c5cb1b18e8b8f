//! Author and title record types.

use chrono::NaiveDate;
use serde::Serialize;

use crate::mapper::{convert_usd_to_eur, is_non_book_format, parse_on_sale_date, short_title};

/// A catalog author.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Author {
    id: String,
    display_name: String,
    first_name: String,
    last_name: String,
    first_name_lc: String,
    last_name_lc: String,
    last_name_first: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_name_initial: Option<char>,
    #[serde(skip_serializing_if = "Option::is_none")]
    biography: Option<String>,
}

impl Author {
    /// Build an author from its canonical name fields.
    ///
    /// An empty display name falls back to "first last".
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        let first_name = first_name.into().trim().to_string();
        let last_name = last_name.into().trim().to_string();
        let mut display_name = display_name.into().trim().to_string();
        if display_name.is_empty() {
            display_name = [first_name.as_str(), last_name.as_str()]
                .iter()
                .filter(|part| !part.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(" ");
        }

        let last_name_first = match (first_name.is_empty(), last_name.is_empty()) {
            (false, false) => format!("{}, {}", last_name, first_name),
            (true, _) => last_name.clone(),
            (false, true) => first_name.clone(),
        };

        Self {
            id: id.into(),
            first_name_lc: first_name.to_lowercase(),
            last_name_lc: last_name.to_lowercase(),
            last_name_initial: last_name.chars().next().and_then(|c| c.to_uppercase().next()),
            last_name_first,
            display_name,
            first_name,
            last_name,
            biography: None,
        }
    }

    /// Attach biography markup (the remote "spotlight" field).
    pub fn with_biography(mut self, biography: Option<String>) -> Self {
        self.biography = biography.filter(|b| !b.trim().is_empty());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn first_name_lc(&self) -> &str {
        &self.first_name_lc
    }

    pub fn last_name_lc(&self) -> &str {
        &self.last_name_lc
    }

    /// "Last, First" form used by listings.
    pub fn last_name_first(&self) -> &str {
        &self.last_name_first
    }

    pub fn last_name_initial(&self) -> Option<char> {
        self.last_name_initial
    }

    pub fn biography(&self) -> Option<&str> {
        self.biography.as_deref()
    }
}

/// Canonical title fields, as delivered by the mapper or a test fixture.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTitle {
    pub isbn: String,
    pub isbn10: Option<String>,
    pub title: String,
    pub subtitle: Option<String>,
    pub author_display_name: String,
    pub format_code: String,
    pub format_name: String,
    pub price_usd: Option<String>,
    pub price_cad: Option<String>,
    pub pages: Option<u32>,
    pub on_sale_date: Option<String>,
    pub subject_category: Option<String>,
}

/// A catalog title (one edition, keyed by ISBN).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    isbn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    isbn10: Option<String>,
    title_full: String,
    title_short: String,
    author_display_name: String,
    format_code: String,
    format_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    price_usd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    price_eur: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    price_cad: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pages: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    on_sale_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject_category: Option<String>,
}

impl Title {
    pub fn new(fields: NewTitle) -> Self {
        let title = fields.title.trim().to_string();
        let title_full = match fields.subtitle.as_deref().map(str::trim) {
            Some(subtitle) if !subtitle.is_empty() => format!("{}: {}", title, subtitle),
            _ => title.clone(),
        };
        let title_short = short_title(&title);

        let price_usd = non_empty(fields.price_usd);
        let price_eur = convert_usd_to_eur(price_usd.as_deref());

        Self {
            isbn: fields.isbn.trim().to_string(),
            isbn10: non_empty(fields.isbn10),
            title_full,
            title_short,
            author_display_name: fields.author_display_name.trim().to_string(),
            format_code: fields.format_code.trim().to_ascii_uppercase(),
            format_name: fields.format_name.trim().to_string(),
            price_usd,
            price_eur,
            price_cad: non_empty(fields.price_cad),
            pages: fields.pages,
            on_sale_date: non_empty(fields.on_sale_date),
            subject_category: non_empty(fields.subject_category),
        }
    }

    pub fn isbn(&self) -> &str {
        &self.isbn
    }

    pub fn isbn10(&self) -> Option<&str> {
        self.isbn10.as_deref()
    }

    pub fn title_full(&self) -> &str {
        &self.title_full
    }

    pub fn title_short(&self) -> &str {
        &self.title_short
    }

    pub fn author_display_name(&self) -> &str {
        &self.author_display_name
    }

    pub fn format_code(&self) -> &str {
        &self.format_code
    }

    pub fn format_name(&self) -> &str {
        &self.format_name
    }

    pub fn price_usd(&self) -> Option<&str> {
        self.price_usd.as_deref()
    }

    pub fn price_eur(&self) -> Option<&str> {
        self.price_eur.as_deref()
    }

    pub fn price_cad(&self) -> Option<&str> {
        self.price_cad.as_deref()
    }

    pub fn pages(&self) -> Option<u32> {
        self.pages
    }

    pub fn on_sale_date(&self) -> Option<&str> {
        self.on_sale_date.as_deref()
    }

    pub fn subject_category(&self) -> Option<&str> {
        self.subject_category.as_deref()
    }

    /// USD price as a number, for numeric sorting.
    pub fn price_usd_value(&self) -> Option<f64> {
        self.price_usd
            .as_deref()
            .and_then(|p| p.trim().parse::<f64>().ok())
            .filter(|p| p.is_finite())
    }

    /// On-sale date parsed from any of the formats the API emits.
    pub fn on_sale(&self) -> Option<NaiveDate> {
        self.on_sale_date.as_deref().and_then(parse_on_sale_date)
    }

    /// Whether the format code is one of the non-book formats (music, puzzles, ...).
    pub fn is_non_book(&self) -> bool {
        is_non_book_format(&self.format_code)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_derived_fields() {
        let author = Author::new("1", "Dan Brown", "Dan", "Brown");
        assert_eq!(author.first_name_lc(), "dan");
        assert_eq!(author.last_name_lc(), "brown");
        assert_eq!(author.last_name_first(), "Brown, Dan");
        assert_eq!(author.last_name_initial(), Some('B'));
    }

    #[test]
    fn test_author_lowercase_initial_is_uppercased() {
        let author = Author::new("2", "", "bell", "hooks");
        assert_eq!(author.last_name_initial(), Some('H'));
        assert_eq!(author.display_name(), "bell hooks");
    }

    #[test]
    fn test_author_without_last_name() {
        let author = Author::new("3", "Homer", "Homer", "");
        assert_eq!(author.last_name_initial(), None);
        assert_eq!(author.last_name_first(), "Homer");
    }

    #[test]
    fn test_author_blank_biography_dropped() {
        let author = Author::new("4", "A B", "A", "B").with_biography(Some("  ".to_string()));
        assert!(author.biography().is_none());
    }

    #[test]
    fn test_title_derived_fields() {
        let title = Title::new(NewTitle {
            isbn: "9780000000001".to_string(),
            title: "A Very Long Title That Goes On And On Past Forty Characters".to_string(),
            subtitle: Some("A Novel".to_string()),
            format_code: "tr".to_string(),
            price_usd: Some("10.00".to_string()),
            ..Default::default()
        });

        assert!(title.title_full().ends_with(": A Novel"));
        assert_eq!(title.title_short().chars().count(), 40);
        assert!(title.title_short().len() <= title.title_full().len());
        assert_eq!(title.format_code(), "TR");
        assert_eq!(title.price_eur(), Some("9.20"));
        assert_eq!(title.price_usd_value(), Some(10.0));
    }

    #[test]
    fn test_title_without_price_has_no_eur_price() {
        let title = Title::new(NewTitle {
            isbn: "1".to_string(),
            title: "T".to_string(),
            ..Default::default()
        });
        assert!(title.price_usd().is_none());
        assert!(title.price_eur().is_none());
    }

    #[test]
    fn test_title_non_book() {
        let puzzle = Title::new(NewTitle {
            isbn: "1".to_string(),
            format_code: "PZ".to_string(),
            ..Default::default()
        });
        assert!(puzzle.is_non_book());

        let paperback = Title::new(NewTitle {
            isbn: "2".to_string(),
            format_code: "TR".to_string(),
            ..Default::default()
        });
        assert!(!paperback.is_non_book());
    }
}
