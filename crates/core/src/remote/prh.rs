//! Penguin Random House REST API (v2) client.
//!
//! The API requires:
//! - an `api_key` query parameter on every request
//! - `start`/`rows` paging instead of offset/limit
//! - polite request pacing, otherwise it answers 429

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use super::wire::{
    ApiAuthorEnvelope, ApiAuthorsResponse, ApiSingleResponse, ApiTitleEnvelope,
    ApiTitlesResponse,
};
use super::{
    AuthorListRequest, RemoteAuthorSort, RemoteCatalog, RemoteCatalogError, RemotePage,
    TitleListRequest,
};
use crate::metrics::{REMOTE_REQUESTS, REMOTE_REQUEST_DURATION};
use crate::records::{Author, Title};

/// PRH API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrhConfig {
    /// API key sent with every request.
    pub api_key: String,
    /// Base URL including the domain path.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Minimum spacing between two requests from this client, in milliseconds.
    #[serde(default = "default_min_interval")]
    pub min_request_interval_ms: u64,
    /// Base URL for cover images.
    #[serde(default = "default_cover_base_url")]
    pub cover_base_url: String,
}

fn default_base_url() -> String {
    "https://api.penguinrandomhouse.com/resources/v2/domains/PRH.US".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_min_interval() -> u64 {
    250
}

/// Where cover images are served from unless configured otherwise.
pub const DEFAULT_COVER_BASE_URL: &str = "https://images.penguinrandomhouse.com/cover";

fn default_cover_base_url() -> String {
    DEFAULT_COVER_BASE_URL.to_string()
}

impl PrhConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            min_request_interval_ms: default_min_interval(),
            cover_base_url: default_cover_base_url(),
        }
    }

    /// Cover image URL for an ISBN.
    pub fn cover_url(&self, isbn: &str) -> String {
        cover_url(&self.cover_base_url, isbn)
    }
}

/// `{base}/{isbn}`
pub fn cover_url(base: &str, isbn: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        urlencoding::encode(isbn.trim())
    )
}

/// PRH API client.
pub struct PrhClient {
    client: Client,
    base_url: String,
    api_key: String,
    last_request: Arc<Mutex<Option<Instant>>>,
    min_interval: Duration,
}

impl PrhClient {
    /// Create a new PRH client.
    pub fn new(config: PrhConfig) -> Result<Self, RemoteCatalogError> {
        let client = Client::builder()
            .user_agent(format!("bookshelf/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            last_request: Arc::new(Mutex::new(None)),
            min_interval: Duration::from_millis(config.min_request_interval_ms),
        })
    }

    /// Wait until the minimum request interval has passed.
    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                debug!("PRH rate limit: waiting {:?}", wait_time);
                sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }

    /// Issue a GET and decode the JSON body, mapping status codes to errors.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        params: &[(&str, String)],
        resource: &str,
    ) -> Result<T, RemoteCatalogError> {
        self.wait_for_rate_limit().await;

        let url = format!("{}/{}", self.base_url, path);
        debug!("PRH GET {} {:?}", url, params);

        let timer = REMOTE_REQUEST_DURATION
            .with_label_values(&[endpoint])
            .start_timer();
        let result = self.send(&url, params, resource).await;
        timer.observe_duration();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                REMOTE_REQUESTS
                    .with_label_values(&[endpoint, e.label()])
                    .inc();
                return Err(e);
            }
        };

        let decoded = response.json::<T>().await.map_err(|e| {
            RemoteCatalogError::Parse(format!("Failed to parse {} response: {}", endpoint, e))
        });
        let label = match &decoded {
            Ok(_) => "success",
            Err(e) => e.label(),
        };
        REMOTE_REQUESTS.with_label_values(&[endpoint, label]).inc();
        decoded
    }

    async fn send(
        &self,
        url: &str,
        params: &[(&str, String)],
        resource: &str,
    ) -> Result<Response, RemoteCatalogError> {
        let response = self
            .client
            .get(url)
            .query(params)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("PRH rate limit exceeded");
            return Err(RemoteCatalogError::RateLimited);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(RemoteCatalogError::NotFound(resource.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteCatalogError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response)
    }
}

fn paging_params(offset: usize, limit: usize) -> Vec<(&'static str, String)> {
    vec![("start", offset.to_string()), ("rows", limit.to_string())]
}

#[async_trait]
impl RemoteCatalog for PrhClient {
    async fn list_authors(
        &self,
        request: &AuthorListRequest,
    ) -> Result<RemotePage<Author>, RemoteCatalogError> {
        let mut params = paging_params(request.offset, request.limit);
        if let Some(initial) = request.last_name_initial {
            params.push(("authorLastInitial", initial.to_uppercase().to_string()));
        }
        if let Some(RemoteAuthorSort::LastName) = request.sort {
            params.push(("sort", "authorLast".to_string()));
        }

        let response: ApiAuthorsResponse = self
            .get_json("authors", "authors", &params, "authors")
            .await?;

        let records = response
            .data
            .unwrap_or_default()
            .authors
            .into_iter()
            .map(Author::from)
            .collect();

        Ok(RemotePage {
            total_count: response.record_count,
            records,
        })
    }

    async fn list_titles(
        &self,
        request: &TitleListRequest,
    ) -> Result<RemotePage<Title>, RemoteCatalogError> {
        let mut params = paging_params(request.offset, request.limit);
        if let Some(title) = &request.title {
            params.push(("title", title.clone()));
        }
        if let Some(author) = &request.author {
            params.push(("author", author.clone()));
        }
        if let Some(format) = &request.format {
            params.push(("format", format.clone()));
        }

        let response: ApiTitlesResponse = self
            .get_json("titles", "titles", &params, "titles")
            .await?;

        Ok(titles_page(response))
    }

    async fn get_author(&self, id: &str) -> Result<Author, RemoteCatalogError> {
        let path = format!("authors/{}", urlencoding::encode(id));
        let response: ApiSingleResponse<ApiAuthorEnvelope> = self
            .get_json("author", &path, &[], &format!("author {}", id))
            .await?;

        response
            .data
            .and_then(ApiAuthorEnvelope::into_author)
            .map(Author::from)
            .ok_or_else(|| RemoteCatalogError::NotFound(format!("author {}", id)))
    }

    async fn get_title(&self, isbn: &str) -> Result<Title, RemoteCatalogError> {
        let path = format!("titles/{}", urlencoding::encode(isbn));
        let response: ApiSingleResponse<ApiTitleEnvelope> = self
            .get_json("title", &path, &[], &format!("title {}", isbn))
            .await?;

        response
            .data
            .and_then(ApiTitleEnvelope::into_title)
            .map(Title::from)
            .ok_or_else(|| RemoteCatalogError::NotFound(format!("title {}", isbn)))
    }

    async fn titles_for_author(
        &self,
        author_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<RemotePage<Title>, RemoteCatalogError> {
        let path = format!("authors/{}/titles", urlencoding::encode(author_id));
        let response: ApiTitlesResponse = self
            .get_json(
                "author_titles",
                &path,
                &paging_params(offset, limit),
                &format!("author {}", author_id),
            )
            .await?;

        Ok(titles_page(response))
    }
}

fn titles_page(response: ApiTitlesResponse) -> RemotePage<Title> {
    let records = response
        .data
        .unwrap_or_default()
        .titles
        .into_iter()
        .map(Title::from)
        .collect();

    RemotePage {
        total_count: response.record_count,
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config: PrhConfig = toml::from_str(r#"api_key = "secret""#).unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.min_request_interval_ms, 250);
        assert!(config.base_url.ends_with("/PRH.US"));
    }

    #[test]
    fn test_cover_url() {
        let mut config = PrhConfig::new("k");
        config.cover_base_url = "https://covers.example/cover/".to_string();
        assert_eq!(
            config.cover_url("9780000000001"),
            "https://covers.example/cover/9780000000001"
        );
    }

    #[test]
    fn test_paging_params_use_start_and_rows() {
        let params = paging_params(500, 250);
        assert_eq!(params[0], ("start", "500".to_string()));
        assert_eq!(params[1], ("rows", "250".to_string()));
    }

    #[test]
    fn test_titles_page_keeps_record_count() {
        let response: ApiTitlesResponse = serde_json::from_str(
            r#"{"recordCount": 7, "data": {"titles": [{"isbn": 1, "title": "One"}]}}"#,
        )
        .unwrap();
        let page = titles_page(response);
        assert_eq!(page.total_count, Some(7));
        assert_eq!(page.records[0].isbn(), "1");
    }

    #[tokio::test]
    async fn test_client_construction() {
        let client = PrhClient::new(PrhConfig::new("key")).unwrap();
        assert_eq!(client.min_interval, Duration::from_millis(250));
        assert!(!client.base_url.ends_with('/'));
    }
}
