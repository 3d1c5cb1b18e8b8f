//! Wire types of the PRH v2 REST API.
//!
//! Only the mapper and the HTTP client see these.

use serde::Deserialize;

/// `{ recordCount, data: { authors: [...] } }`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiAuthorsResponse {
    #[serde(default)]
    pub record_count: Option<usize>,
    #[serde(default)]
    pub data: Option<ApiAuthorsData>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiAuthorsData {
    #[serde(default)]
    pub authors: Vec<ApiAuthor>,
}

/// `{ recordCount, data: { titles: [...] } }`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiTitlesResponse {
    #[serde(default)]
    pub record_count: Option<usize>,
    #[serde(default)]
    pub data: Option<ApiTitlesData>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiTitlesData {
    #[serde(default)]
    pub titles: Vec<ApiTitle>,
}

/// Single-author lookups answer in one of three shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ApiAuthorEnvelope {
    List { authors: Vec<ApiAuthor> },
    Single { author: ApiAuthor },
    Bare(ApiAuthor),
}

impl ApiAuthorEnvelope {
    pub fn into_author(self) -> Option<ApiAuthor> {
        match self {
            ApiAuthorEnvelope::List { authors } => authors.into_iter().next(),
            ApiAuthorEnvelope::Single { author } => Some(author),
            ApiAuthorEnvelope::Bare(author) => Some(author),
        }
    }
}

/// Single-title lookups answer in one of three shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ApiTitleEnvelope {
    List { titles: Vec<ApiTitle> },
    Single { title: ApiTitle },
    Bare(ApiTitle),
}

impl ApiTitleEnvelope {
    pub fn into_title(self) -> Option<ApiTitle> {
        match self {
            ApiTitleEnvelope::List { titles } => titles.into_iter().next(),
            ApiTitleEnvelope::Single { title } => Some(title),
            ApiTitleEnvelope::Bare(title) => Some(title),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiSingleResponse<T> {
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiAuthor {
    pub author_id: u64,
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub first: Option<String>,
    #[serde(default)]
    pub last: Option<String>,
    #[serde(default)]
    pub spotlight: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiTitle {
    pub isbn: u64,
    #[serde(default)]
    pub isbn10: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub onsale: Option<String>,
    #[serde(default)]
    pub price: Vec<ApiPrice>,
    #[serde(default)]
    pub format: Option<ApiFormat>,
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub subject: Option<ApiSubject>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiPrice {
    pub amount: f64,
    pub currency_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiFormat {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiSubject {
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_authors_response() {
        let json = r#"{
            "recordCount": 1234,
            "data": {
                "authors": [
                    {"authorId": 2001, "display": "Toni Morrison", "first": "Toni", "last": "Morrison"},
                    {"authorId": 2002, "display": "Homer", "first": "Homer"}
                ]
            }
        }"#;
        let response: ApiAuthorsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.record_count, Some(1234));
        let authors = response.data.unwrap().authors;
        assert_eq!(authors.len(), 2);
        assert!(authors[1].last.is_none());
    }

    #[test]
    fn test_parse_titles_response_with_prices() {
        let json = r#"{
            "recordCount": 2,
            "data": {
                "titles": [
                    {
                        "isbn": 9780000000001,
                        "title": "Beloved",
                        "author": "Toni Morrison",
                        "onsale": "2004-06-08",
                        "price": [{"amount": 17.0, "currencyCode": "USD"}],
                        "format": {"code": "TR", "description": "Trade Paperback"}
                    }
                ]
            }
        }"#;
        let response: ApiTitlesResponse = serde_json::from_str(json).unwrap();
        let titles = response.data.unwrap().titles;
        assert_eq!(titles[0].isbn, 9780000000001);
        assert_eq!(titles[0].price[0].currency_code, "USD");
    }

    #[test]
    fn test_author_envelope_shapes() {
        let list: ApiAuthorEnvelope =
            serde_json::from_str(r#"{"authors": [{"authorId": 1, "display": "A"}]}"#).unwrap();
        assert_eq!(list.into_author().unwrap().author_id, 1);

        let single: ApiAuthorEnvelope =
            serde_json::from_str(r#"{"author": {"authorId": 2, "display": "B"}}"#).unwrap();
        assert_eq!(single.into_author().unwrap().author_id, 2);

        let bare: ApiAuthorEnvelope =
            serde_json::from_str(r#"{"authorId": 3, "display": "C"}"#).unwrap();
        assert_eq!(bare.into_author().unwrap().author_id, 3);

        let empty: ApiAuthorEnvelope = serde_json::from_str(r#"{"authors": []}"#).unwrap();
        assert!(empty.into_author().is_none());
    }

    #[test]
    fn test_title_envelope_shapes() {
        let single: ApiTitleEnvelope =
            serde_json::from_str(r#"{"title": {"isbn": 42, "title": "X"}}"#).unwrap();
        assert_eq!(single.into_title().unwrap().isbn, 42);

        let bare: ApiTitleEnvelope =
            serde_json::from_str(r#"{"isbn": 43, "title": "Y"}"#).unwrap();
        assert_eq!(bare.into_title().unwrap().isbn, 43);
    }
}
