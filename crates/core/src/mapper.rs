//! Record mapper: remote wire shape to internal records.
//!
//! Everything the remote API names or nests in its own way stops here; the
//! rest of the engine only sees [`Author`] and [`Title`].

use chrono::NaiveDate;

use crate::records::{Author, NewTitle, Title};
use crate::remote::wire::{ApiAuthor, ApiTitle};

/// Fixed USD to EUR conversion rate.
pub const USD_TO_EUR_RATE: f64 = 0.92;

/// Format codes that are not books (music, puzzles, calendars, games, ...).
pub const NON_BOOK_FORMATS: [&str; 12] = [
    "MU", "PZ", "CA", "GA", "GI", "PO", "ST", "WL", "NT", "CL", "BX", "KT",
];

/// Maximum length (in characters) of a short title.
pub const SHORT_TITLE_LEN: usize = 40;

/// Convert a USD price string to EUR, rounded to two decimals.
///
/// Absent or non-numeric input yields `None`, never `"0.00"`.
pub fn convert_usd_to_eur(price_usd: Option<&str>) -> Option<String> {
    let usd = price_usd?.trim().parse::<f64>().ok()?;
    if !usd.is_finite() {
        return None;
    }
    let eur = (usd * USD_TO_EUR_RATE * 100.0).round() / 100.0;
    Some(format!("{:.2}", eur))
}

/// Whether a format code belongs to the non-book set (case-insensitive).
pub fn is_non_book_format(format_code: &str) -> bool {
    let code = format_code.trim().to_ascii_uppercase();
    NON_BOOK_FORMATS.contains(&code.as_str())
}

/// Truncate a title to [`SHORT_TITLE_LEN`] characters on a char boundary.
pub fn short_title(title: &str) -> String {
    match title.char_indices().nth(SHORT_TITLE_LEN) {
        Some((end, _)) => title[..end].trim_end().to_string(),
        None => title.to_string(),
    }
}

/// Parse an on-sale date in any of the shapes the API uses.
pub fn parse_on_sale_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.split(['T', ' ']).next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%m/%d/%Y"))
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%Y%m%d"))
        .ok()
}

fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

impl From<ApiAuthor> for Author {
    fn from(api: ApiAuthor) -> Self {
        Author::new(
            api.author_id.to_string(),
            api.display.unwrap_or_default(),
            api.first.unwrap_or_default(),
            api.last.unwrap_or_default(),
        )
        .with_biography(api.spotlight)
    }
}

impl From<ApiTitle> for Title {
    fn from(api: ApiTitle) -> Self {
        let price_in = |currency: &str| {
            api.price
                .iter()
                .find(|p| p.currency_code.eq_ignore_ascii_case(currency))
                .map(|p| format_amount(p.amount))
        };
        let price_usd = price_in("USD");
        let price_cad = price_in("CAD");
        let (format_code, format_name) = api
            .format
            .map(|f| (f.code.unwrap_or_default(), f.description.unwrap_or_default()))
            .unwrap_or_default();

        Title::new(NewTitle {
            isbn: api.isbn.to_string(),
            isbn10: api.isbn10,
            title: api.title.unwrap_or_default(),
            subtitle: api.subtitle,
            author_display_name: api.author.unwrap_or_default(),
            format_code,
            format_name,
            price_usd,
            price_cad,
            pages: api.pages,
            on_sale_date: api.onsale,
            subject_category: api.subject.and_then(|s| s.description),
        })
    }
}
