//! Search queries and their matching rules.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::records::{Author, Title};

/// Digits, optionally grouped with hyphens or spaces (`978-0-00-000000-1`).
/// An ISBN-10 may end in the check character `X`.
static NUMERIC_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9][0-9\- ]*[Xx]?$").unwrap());

/// Author search: case-insensitive prefix on first and last name, ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorQuery {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl AuthorQuery {
    pub fn new(first_name: Option<&str>, last_name: Option<&str>) -> Self {
        Self {
            first_name: first_name.map(str::to_string),
            last_name: last_name.map(str::to_string),
        }
    }

    /// Compile to a matcher; blank criteria match everything.
    pub fn matcher(&self) -> AuthorMatcher {
        AuthorMatcher::Fields {
            first: normalize(self.first_name.as_deref()),
            last: normalize(self.last_name.as_deref()),
        }
    }
}

/// Compiled author criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorMatcher {
    /// Prefix on first name AND prefix on last name; `None` matches anything.
    Fields {
        first: Option<String>,
        last: Option<String>,
    },
    /// A single token that may start either the first or the last name.
    EitherName(String),
}

impl AuthorMatcher {
    /// Tokenize a free-text author name.
    ///
    /// One token matches a first OR last name prefix. With more tokens the
    /// last one is the last name and the rest form the first name.
    pub fn from_name(name: &str) -> Option<Self> {
        let tokens: Vec<String> = name.split_whitespace().map(str::to_lowercase).collect();
        match tokens.as_slice() {
            [] => None,
            [single] => Some(AuthorMatcher::EitherName(single.clone())),
            [first @ .., last] => Some(AuthorMatcher::Fields {
                first: Some(first.join(" ")),
                last: Some(last.clone()),
            }),
        }
    }

    pub fn matches(&self, author: &Author) -> bool {
        match self {
            AuthorMatcher::Fields { first, last } => {
                first
                    .as_deref()
                    .map_or(true, |p| author.first_name_lc().starts_with(p))
                    && last
                        .as_deref()
                        .map_or(true, |p| author.last_name_lc().starts_with(p))
            }
            AuthorMatcher::EitherName(prefix) => {
                author.first_name_lc().starts_with(prefix.as_str())
                    || author.last_name_lc().starts_with(prefix.as_str())
            }
        }
    }
}

/// Title search. Every supplied criterion is ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleQuery {
    /// ISBN when purely numeric, otherwise a title substring.
    #[serde(default)]
    pub keyword: Option<String>,
    /// Author name, resolved against the author collection.
    #[serde(default)]
    pub author: Option<String>,
    /// Exact format code (case-insensitive).
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub exclude_non_books: bool,
}

impl TitleQuery {
    pub fn keyword(keyword: &str) -> Self {
        Self {
            keyword: Some(keyword.to_string()),
            ..Default::default()
        }
    }

    pub fn parsed_keyword(&self) -> Option<Keyword> {
        self.keyword.as_deref().and_then(Keyword::parse)
    }

    /// The author criterion, if any.
    pub fn author_matcher(&self) -> Option<AuthorMatcher> {
        self.author.as_deref().and_then(AuthorMatcher::from_name)
    }

    pub fn format_code(&self) -> Option<String> {
        self.format
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_ascii_uppercase)
    }
}

/// A parsed title keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyword {
    /// Normalized digits (plus a trailing `X`), matched exactly against `isbn` or `isbn10`.
    Isbn(String),
    /// Lowercased text, matched as a substring of the full or short title.
    Text(String),
}

impl Keyword {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if NUMERIC_KEYWORD.is_match(raw) {
            Some(Keyword::Isbn(digits(raw)))
        } else {
            Some(Keyword::Text(raw.to_lowercase()))
        }
    }

    pub fn matches(&self, title: &Title) -> bool {
        match self {
            Keyword::Isbn(isbn) => {
                title.isbn() == isbn.as_str()
                    || title.isbn10().is_some_and(|isbn10| digits(isbn10) == *isbn)
            }
            Keyword::Text(text) => {
                title.title_full().to_lowercase().contains(text.as_str())
                    || title.title_short().to_lowercase().contains(text.as_str())
            }
        }
    }
}

fn digits(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || c.eq_ignore_ascii_case(&'x'))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::NewTitle;
    use crate::testing::fixtures;

    #[test]
    fn test_author_query_blank_matches_everything() {
        let matcher = AuthorQuery::new(Some("  "), None).matcher();
        assert!(matcher.matches(&fixtures::author("1", "Zadie", "Smith")));
    }

    #[test]
    fn test_author_query_is_case_insensitive_prefix() {
        let matcher = AuthorQuery::new(Some("ZA"), Some("smi")).matcher();
        assert!(matcher.matches(&fixtures::author("1", "Zadie", "Smith")));
        assert!(!matcher.matches(&fixtures::author("2", "Ali", "Smith")));
        // Prefix, not substring.
        let matcher = AuthorQuery::new(None, Some("mith")).matcher();
        assert!(!matcher.matches(&fixtures::author("1", "Zadie", "Smith")));
    }

    #[test]
    fn test_author_name_tokenization() {
        assert_eq!(AuthorMatcher::from_name("   "), None);
        assert_eq!(
            AuthorMatcher::from_name("Smith"),
            Some(AuthorMatcher::EitherName("smith".to_string()))
        );
        assert_eq!(
            AuthorMatcher::from_name("Mary Ann Evans"),
            Some(AuthorMatcher::Fields {
                first: Some("mary ann".to_string()),
                last: Some("evans".to_string()),
            })
        );

        let either = AuthorMatcher::from_name("zad").unwrap();
        assert!(either.matches(&fixtures::author("1", "Zadie", "Smith")));
        let either = AuthorMatcher::from_name("smi").unwrap();
        assert!(either.matches(&fixtures::author("1", "Zadie", "Smith")));
    }

    #[test]
    fn test_numeric_keyword_is_isbn() {
        assert_eq!(
            Keyword::parse("978-0-00-000000-1"),
            Some(Keyword::Isbn("9780000000001".to_string()))
        );
        assert_eq!(
            Keyword::parse(" 9780000000001 "),
            Some(Keyword::Isbn("9780000000001".to_string()))
        );
        assert_eq!(
            Keyword::parse("Catch-22"),
            Some(Keyword::Text("catch-22".to_string()))
        );
        assert_eq!(Keyword::parse(""), None);
    }

    #[test]
    fn test_isbn_keyword_is_exact() {
        let wanted = fixtures::title("9780000000001", "Numbers", "A");
        let decoy = fixtures::title("9781111111111", "Volume 9780000000001", "B");
        let keyword = Keyword::parse("9780000000001").unwrap();

        assert!(keyword.matches(&wanted));
        assert!(!keyword.matches(&decoy));
    }

    #[test]
    fn test_isbn10_keyword() {
        let title = Title::new(NewTitle {
            isbn: "9780306406157".to_string(),
            isbn10: Some("0-306-40615-2".to_string()),
            title: "Example".to_string(),
            ..Default::default()
        });
        assert!(Keyword::parse("0306406152").unwrap().matches(&title));
    }

    #[test]
    fn test_isbn10_keyword_with_check_character() {
        let title = Title::new(NewTitle {
            isbn: "9780306406150".to_string(),
            isbn10: Some("0-306-40615-x".to_string()),
            title: "Example".to_string(),
            ..Default::default()
        });
        assert_eq!(
            Keyword::parse("030640615x"),
            Some(Keyword::Isbn("030640615X".to_string()))
        );
        assert!(Keyword::parse("030640615X").unwrap().matches(&title));
        assert!(Keyword::parse("0-306-40615-x").unwrap().matches(&title));
        assert!(!Keyword::parse("0306406151").unwrap().matches(&title));
        // A trailing X alone does not make a word numeric.
        assert_eq!(Keyword::parse("X"), Some(Keyword::Text("x".to_string())));
    }

    #[test]
    fn test_text_keyword_matches_full_title() {
        let title = Title::new(NewTitle {
            isbn: "1".to_string(),
            title: "The Overstory".to_string(),
            subtitle: Some("A Novel".to_string()),
            ..Default::default()
        });
        assert!(Keyword::parse("OVERST").unwrap().matches(&title));
        assert!(Keyword::parse("a novel").unwrap().matches(&title));
        assert!(!Keyword::parse("understory").unwrap().matches(&title));
    }

    #[test]
    fn test_format_code_normalization() {
        let query = TitleQuery {
            format: Some(" hc ".to_string()),
            ..Default::default()
        };
        assert_eq!(query.format_code(), Some("HC".to_string()));
        assert_eq!(TitleQuery::default().format_code(), None);
    }
}
