//! In-process API tests.
//!
//! Every request goes through the real router and a real session; only the
//! remote catalog is mocked.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use bookshelf_core::{RemoteCatalogError, Title};
use common::{fixtures, TestFixture};

// =============================================================================
// Health, config, metrics
// =============================================================================

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new(0, 0);
    let response = fixture.get("/api/v1/health").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_hides_api_key() {
    let fixture = TestFixture::new(0, 0);
    let response = fixture.get("/api/v1/config").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["remote"]["api_key_configured"], true);
    assert!(response.body["remote"].get("api_key").is_none());
    assert!(!response.text.contains("test-key"));
    assert_eq!(response.body["loader"]["batch_size"], 10);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new(0, 5);
    fixture.get("/api/v1/titles?page=0&page_size=5").await;

    let response = fixture.get("/api/v1/metrics").await;
    assert_status!(response, StatusCode::OK);
    assert!(response.text.contains("bookshelf_cache_resident_records"));
    assert!(response.text.contains("bookshelf_http_requests_total"));
    assert!(response.text.contains("bookshelf_page_loads_total"));
}

// =============================================================================
// Paging
// =============================================================================

#[tokio::test]
async fn test_title_page() {
    let fixture = TestFixture::new(0, 100);
    let response = fixture.get("/api/v1/titles?page=2&page_size=10").await;

    assert_status!(response, StatusCode::OK);
    let records = response.body["records"].as_array().unwrap();
    assert_eq!(records.len(), 10);
    assert_eq!(records[0]["isbn"], fixtures::numbered_isbn(20));
    assert_eq!(response.body["total_count"], 100);

    let requests = fixture.remote.requests_for("titles");
    assert_eq!(requests.len(), 1);
    assert_eq!((requests[0].offset, requests[0].limit), (20, 10));
}

#[tokio::test]
async fn test_repeated_page_is_served_from_cache() {
    let fixture = TestFixture::new(0, 100);
    fixture.get("/api/v1/titles?page=1&page_size=10").await;
    fixture.get("/api/v1/titles?page=1&page_size=10").await;

    assert_eq!(fixture.remote.request_count(), 1);
}

#[tokio::test]
async fn test_author_page_defaults() {
    let fixture = TestFixture::new(30, 0);
    let response = fixture.get("/api/v1/authors").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["records"].as_array().unwrap().len(), 20);
    assert_eq!(response.body["page"], 0);
    assert_eq!(response.body["page_size"], 20);
}

#[tokio::test]
async fn test_bad_page_size_is_rejected() {
    let fixture = TestFixture::new(0, 10);

    let response = fixture.get("/api/v1/titles?page_size=0").await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].as_str().unwrap().contains("page size"));

    let response = fixture.get("/api/v1/titles?page=abc").await;
    assert_status!(response, StatusCode::BAD_REQUEST);

    assert_eq!(fixture.remote.request_count(), 0);
}

#[tokio::test]
async fn test_rate_limited_page_maps_to_429() {
    let fixture = TestFixture::new(0, 10);
    fixture.remote.set_next_error(RemoteCatalogError::RateLimited);

    let response = fixture.get("/api/v1/titles?page=0&page_size=5").await;
    assert_status!(response, StatusCode::TOO_MANY_REQUESTS);
    assert!(response.body["error"].is_string());
}

#[tokio::test]
async fn test_server_error_page_maps_to_502() {
    let fixture = TestFixture::new(0, 10);
    fixture.remote.set_next_error(RemoteCatalogError::Api {
        status: 503,
        message: "maintenance".to_string(),
    });

    let response = fixture.get("/api/v1/titles").await;
    assert_status!(response, StatusCode::BAD_GATEWAY);
    assert_eq!(fixture.session.store().resident_count::<Title>(), 0);
}

// =============================================================================
// Search and browse
// =============================================================================

#[tokio::test]
async fn test_author_search() {
    let fixture = TestFixture::new(12, 0);
    let response = fixture.get("/api/v1/authors/search?first_name=first1").await;

    assert_status!(response, StatusCode::OK);
    // First1, First10, First11
    assert_eq!(response.body["total"], 3);
    assert!(fixture.session.store().is_dense::<bookshelf_core::Author>());
}

#[tokio::test]
async fn test_title_search_by_isbn() {
    let fixture = TestFixture::new(0, 25);
    let isbn = fixtures::numbered_isbn(5);
    let response = fixture
        .get(&format!("/api/v1/titles/search?keyword={}", isbn))
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["total"], 1);
    assert_eq!(response.body["records"][0]["isbn"], isbn);
}

#[tokio::test]
async fn test_title_search_on_incomplete_catalog_maps_to_503() {
    let fixture = TestFixture::new(0, 30);
    fixture
        .remote
        .fail_at_offset(10, RemoteCatalogError::RateLimited);

    let response = fixture.get("/api/v1/titles/search?keyword=title").await;
    assert_status!(response, StatusCode::SERVICE_UNAVAILABLE);

    fixture.remote.clear_failures();
    let response = fixture.get("/api/v1/titles/search?keyword=title").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["total"], 30);
}

#[tokio::test]
async fn test_browse_authors_by_last_name() {
    let fixture = TestFixture::new(12, 0);
    let response = fixture
        .get("/api/v1/authors/browse?sort=last_name&page=0&page_size=3")
        .await;

    assert_status!(response, StatusCode::OK);
    let names: Vec<_> = response.body["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["last_name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Last0", "Last1", "Last10"]);
    assert_eq!(response.body["total_count"], 12);
    assert_eq!(response.body["sort"]["field"], "last_name");
    assert_eq!(response.body["sort"]["direction"], "ascending");
}

#[tokio::test]
async fn test_browse_titles_descending() {
    let fixture = TestFixture::new(0, 0);
    fixture.remote.set_titles(vec![
        fixtures::priced_title("1", "A", "TR", Some("10.00")),
        fixtures::priced_title("2", "B", "TR", None),
        fixtures::priced_title("3", "C", "TR", Some("30.00")),
    ]);

    let response = fixture
        .get("/api/v1/titles/browse?sort=price&direction=desc")
        .await;

    assert_status!(response, StatusCode::OK);
    let isbns: Vec<_> = response.body["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["isbn"].as_str().unwrap().to_string())
        .collect();
    // Missing prices sort last ascending, so first descending.
    assert_eq!(isbns, vec!["2", "3", "1"]);
}

#[tokio::test]
async fn test_browse_with_unknown_sort_is_rejected() {
    let fixture = TestFixture::new(0, 5);
    let response = fixture.get("/api/v1/titles/browse?sort=isbn").await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(fixture.remote.request_count(), 0);
}

// =============================================================================
// Single records
// =============================================================================

#[tokio::test]
async fn test_get_title_and_cover() {
    let fixture = TestFixture::new(0, 10);
    let isbn = fixtures::numbered_isbn(4);

    let response = fixture.get(&format!("/api/v1/titles/{}", isbn)).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["title_full"], "Title 4");

    let response = fixture.get(&format!("/api/v1/titles/{}/cover", isbn)).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(
        response.body["url"],
        format!("https://covers.test/{}", isbn)
    );
}

#[tokio::test]
async fn test_unknown_records_are_404() {
    let fixture = TestFixture::new(3, 3);

    let response = fixture.get("/api/v1/titles/0000000000000").await;
    assert_status!(response, StatusCode::NOT_FOUND);

    let response = fixture.get("/api/v1/authors/missing").await;
    assert_status!(response, StatusCode::NOT_FOUND);

    let response = fixture.get("/api/v1/authors/missing/titles").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_author_titles() {
    let fixture = TestFixture::new(7, 40);
    let response = fixture.get("/api/v1/authors/3/titles?start=0&rows=100").await;

    assert_status!(response, StatusCode::OK);
    let records = response.body["records"].as_array().unwrap();
    assert_eq!(records.len(), 6);
    assert!(records
        .iter()
        .all(|t| t["author_display_name"] == "First3 Last3"));
}

#[tokio::test]
async fn test_lucky_title() {
    let fixture = TestFixture::new(0, 50);
    let response = fixture.get("/api/v1/titles/lucky").await;

    assert_status!(response, StatusCode::OK);
    assert!(response.body["isbn"].is_string());
}

#[tokio::test]
async fn test_lucky_title_on_empty_catalog() {
    let fixture = TestFixture::new(0, 0);
    let response = fixture.get("/api/v1/titles/lucky").await;

    assert_status!(response, StatusCode::NOT_FOUND);
}

// =============================================================================
// Catalog status and preload
// =============================================================================

#[tokio::test]
async fn test_status_after_page_load() {
    let fixture = TestFixture::new(0, 40);
    fixture.get("/api/v1/titles?page=1&page_size=10").await;

    let response = fixture.get("/api/v1/catalog/status").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["titles"]["resident"], 10);
    assert_eq!(response.body["titles"]["total_count"], 40);
    assert_eq!(response.body["titles"]["dense"], false);
    assert_eq!(response.body["titles"]["load_state"]["state"], "idle");
    assert_eq!(response.body["authors"]["resident"], 0);
}

#[tokio::test]
async fn test_preload_runs_in_background() {
    let fixture = TestFixture::new(0, 35);
    let response = fixture.post("/api/v1/catalog/titles/preload").await;

    assert_status!(response, StatusCode::ACCEPTED);
    assert_eq!(response.body["kind"], "titles");

    let mut dense = false;
    for _ in 0..200 {
        if fixture.session.store().is_dense::<Title>() {
            dense = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(dense, "bulk load did not finish");
    assert_eq!(fixture.remote.requests_for("titles").len(), 4);
}

#[tokio::test]
async fn test_preload_unknown_kind_is_rejected() {
    let fixture = TestFixture::new(0, 0);
    let response = fixture.post("/api/v1/catalog/publishers/preload").await;

    assert_status!(response, StatusCode::BAD_REQUEST);
}
