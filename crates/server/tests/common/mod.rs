//! Common test utilities for API testing with a mock remote catalog.
//!
//! The fixture builds an in-process router over a real `CatalogSession`
//! whose remote is a `MockRemoteCatalog`, so every endpoint can be driven
//! without network access.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use bookshelf_core::{
    testing::MockRemoteCatalog, CatalogSession, Config, LoaderConfig, PrhConfig, ServerConfig,
};
use bookshelf_server::state::AppState;

/// Re-export fixtures for test convenience
pub use bookshelf_core::testing::fixtures;

/// Test fixture wrapping the router and the mock it talks to.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock remote catalog - configure records and inject failures
    pub remote: Arc<MockRemoteCatalog>,
    /// The session behind the router, for inspecting the cache directly
    pub session: Arc<CatalogSession>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Fixture with `authors` numbered authors and `titles` numbered titles.
    pub fn new(authors: usize, titles: usize) -> Self {
        let remote = Arc::new(MockRemoteCatalog::new());
        remote.set_authors(fixtures::numbered_authors(authors));
        remote.set_titles(fixtures::numbered_titles(titles));
        Self::with_remote(remote)
    }

    /// Fixture over a preconfigured mock.
    pub fn with_remote(remote: Arc<MockRemoteCatalog>) -> Self {
        let loader = LoaderConfig {
            batch_size: 10,
            batch_delay_ms: 0,
            lucky_fallback_ceiling: 50,
            ..Default::default()
        };
        let config = Config {
            remote: PrhConfig::new("test-key"),
            loader: loader.clone(),
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
        };

        let session = Arc::new(
            CatalogSession::new(remote.clone(), loader)
                .with_cover_base_url("https://covers.test"),
        );
        let state = Arc::new(AppState::new(config, Arc::clone(&session)));
        let router = bookshelf_server::api::create_router(state);

        Self {
            router,
            remote,
            session,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path).await
    }

    /// Send a POST request without a body.
    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path).await
    }

    async fn request(&self, method: &str, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}
