//! Integration tests for `ShopifyClient` against a local mock Admin API.
//!
//! Uses `wiremock` so no real network traffic is made. Covers product
//! creation, credential checks, duplicate skipping, the retry policy, and
//! the per-product failure isolation of bulk uploads.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pumpcat_shopify::{transform, ShopifyClient, UploadError};

use chrono::{TimeZone, Utc};
use pumpcat_core::{FieldProvenance, ProductRecord};
use std::collections::BTreeMap;

const TOKEN: &str = "shpat_test_token";

fn record(name: &str) -> ProductRecord {
    ProductRecord {
        name: name.to_owned(),
        category: "Industrial Heating".to_owned(),
        subcategory: "Heating Pumps".to_owned(),
        country: "Germany".to_owned(),
        short_description: "A smart glanded pump with adaptive control functions.".to_owned(),
        advantages: vec!["Low noise".to_owned()],
        long_description: String::new(),
        specifications: BTreeMap::new(),
        card_image_url: Some("https://wilo.com/media/card.png".to_owned()),
        product_images: vec![],
        source_url: "https://wilo.com/de/de/p/x".to_owned(),
        extracted_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        provenance: FieldProvenance::extracted(),
    }
}

/// Client pointed at the mock server: 5s timeout, no retries unless stated.
fn test_client(server: &MockServer) -> ShopifyClient {
    ShopifyClient::new(&server.uri(), TOKEN, "2024-01", 5, 0, 0).expect("client")
}

fn test_client_with_retries(server: &MockServer, max_retries: u32) -> ShopifyClient {
    ShopifyClient::new(&server.uri(), TOKEN, "2024-01", 5, max_retries, 0).expect("client")
}

fn created_response(id: i64, title: &str) -> ResponseTemplate {
    ResponseTemplate::new(201).set_body_json(json!({
        "product": {"id": id, "title": title}
    }))
}

// ---------------------------------------------------------------------------
// create_product
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_product_posts_envelope_with_access_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/admin/api/2024-01/products.json"))
        .and(header("X-Shopify-Access-Token", TOKEN))
        .and(body_partial_json(json!({
            "product": {
                "title": "Stratos MAXO",
                "vendor": "Wilo",
                "status": "draft",
                "variants": [{"price": "0.00", "sku": "WILO-STRATOS-MAXO"}]
            }
        })))
        .respond_with(created_response(42, "Stratos MAXO"))
        .expect(1)
        .mount(&server)
        .await;

    let payload = transform(&record("Stratos MAXO"));
    let created = test_client(&server)
        .create_product(&payload)
        .await
        .expect("create should succeed");

    assert_eq!(created.id, 42);
    assert_eq!(created.title, "Stratos MAXO");
}

#[tokio::test]
async fn create_product_surfaces_validation_body_on_422() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/admin/api/2024-01/products.json"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(json!({"errors": {"images": ["Image URL is invalid"]}})),
        )
        .expect(1) // 422 must not be retried
        .mount(&server)
        .await;

    let payload = transform(&record("Bad Product"));
    let err = test_client_with_retries(&server, 3)
        .create_product(&payload)
        .await
        .unwrap_err();

    match err {
        UploadError::UnexpectedStatus { status, body, .. } => {
            assert_eq!(status, 422);
            assert!(body.contains("Image URL is invalid"));
        }
        other => panic!("expected UnexpectedStatus, got: {other:?}"),
    }
}

#[tokio::test]
async fn create_product_retries_rate_limit_and_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/admin/api/2024-01/products.json"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/admin/api/2024-01/products.json"))
        .respond_with(created_response(7, "Stratos MAXO"))
        .mount(&server)
        .await;

    let payload = transform(&record("Stratos MAXO"));
    let created = test_client_with_retries(&server, 1)
        .create_product(&payload)
        .await
        .expect("retry should succeed");
    assert_eq!(created.id, 7);
}

#[tokio::test]
async fn create_product_rate_limit_reports_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/admin/api/2024-01/products.json"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .mount(&server)
        .await;

    let payload = transform(&record("Stratos MAXO"));
    let err = test_client(&server).create_product(&payload).await.unwrap_err();
    match err {
        UploadError::RateLimited {
            retry_after_secs, ..
        } => assert_eq!(retry_after_secs, 30),
        other => panic!("expected RateLimited, got: {other:?}"),
    }
}

#[tokio::test]
async fn create_product_rate_limit_without_header_defaults_to_2s() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/admin/api/2024-01/products.json"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let payload = transform(&record("Stratos MAXO"));
    let err = test_client(&server).create_product(&payload).await.unwrap_err();
    assert!(
        matches!(err, UploadError::RateLimited { retry_after_secs: 2, .. }),
        "expected default retry-after of 2s, got: {err:?}"
    );
}

#[tokio::test]
async fn create_product_retries_5xx_and_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/admin/api/2024-01/products.json"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/admin/api/2024-01/products.json"))
        .respond_with(created_response(8, "Stratos MAXO"))
        .mount(&server)
        .await;

    let payload = transform(&record("Stratos MAXO"));
    let created = test_client_with_retries(&server, 1)
        .create_product(&payload)
        .await
        .expect("503 should be retried");
    assert_eq!(created.id, 8);
}

#[tokio::test]
async fn create_product_propagates_malformed_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/admin/api/2024-01/products.json"))
        .respond_with(ResponseTemplate::new(201).set_body_string("not json"))
        .mount(&server)
        .await;

    let payload = transform(&record("Stratos MAXO"));
    let err = test_client(&server).create_product(&payload).await.unwrap_err();
    assert!(matches!(err, UploadError::Deserialize { .. }));
}

// ---------------------------------------------------------------------------
// test_connection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_connection_returns_shop_info() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/api/2024-01/shop.json"))
        .and(header("X-Shopify-Access-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "shop": {"id": 1, "name": "Pump Store", "domain": "pumps.example"}
        })))
        .mount(&server)
        .await;

    let shop = test_client(&server).test_connection().await.expect("shop");
    assert_eq!(shop.name, "Pump Store");
    assert_eq!(shop.domain.as_deref(), Some("pumps.example"));
}

#[tokio::test]
async fn test_connection_fails_on_bad_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/api/2024-01/shop.json"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = test_client(&server).test_connection().await.unwrap_err();
    assert!(matches!(
        err,
        UploadError::UnexpectedStatus { status: 401, .. }
    ));
}

// ---------------------------------------------------------------------------
// find_by_title
// ---------------------------------------------------------------------------

#[tokio::test]
async fn find_by_title_returns_first_match() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/api/2024-01/products.json"))
        .and(query_param("title", "Stratos MAXO"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [{"id": 9, "title": "Stratos MAXO"}]
        })))
        .mount(&server)
        .await;

    let found = test_client(&server)
        .find_by_title("Stratos MAXO")
        .await
        .expect("lookup");
    assert_eq!(found.map(|p| p.id), Some(9));
}

#[tokio::test]
async fn find_by_title_returns_none_when_absent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/api/2024-01/products.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"products": []})))
        .mount(&server)
        .await;

    let found = test_client(&server)
        .find_by_title("Unknown Pump")
        .await
        .expect("lookup");
    assert!(found.is_none());
}

// ---------------------------------------------------------------------------
// bulk_upload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bulk_upload_skips_existing_creates_new_and_isolates_failures() {
    let server = MockServer::start().await;

    // Duplicate check: "Existing Pump" is already in the store.
    Mock::given(method("GET"))
        .and(path("/admin/api/2024-01/products.json"))
        .and(query_param("title", "Existing Pump"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [{"id": 1, "title": "Existing Pump"}]
        })))
        .mount(&server)
        .await;

    // The other two lookups come back empty.
    Mock::given(method("GET"))
        .and(path("/admin/api/2024-01/products.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"products": []})))
        .mount(&server)
        .await;

    // "New Pump" creates fine; "Broken Pump" fails validation.
    Mock::given(method("POST"))
        .and(path("/admin/api/2024-01/products.json"))
        .and(body_partial_json(json!({"product": {"title": "New Pump"}})))
        .respond_with(created_response(2, "New Pump"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/admin/api/2024-01/products.json"))
        .and(body_partial_json(json!({"product": {"title": "Broken Pump"}})))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"errors": "bad"})))
        .mount(&server)
        .await;

    let payloads = vec![
        transform(&record("Existing Pump")),
        transform(&record("Broken Pump")),
        transform(&record("New Pump")),
    ];
    let report = test_client(&server).bulk_upload(&payloads, 0).await;

    assert_eq!(report.total, 3);
    assert_eq!(report.skipped, vec!["Existing Pump"]);
    assert_eq!(report.created.len(), 1);
    assert_eq!(report.created[0].title, "New Pump");
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "Broken Pump");
    assert!(report.failed[0].1.contains("422"));
}

#[tokio::test]
async fn bulk_upload_attempts_create_when_duplicate_check_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/api/2024-01/products.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/admin/api/2024-01/products.json"))
        .respond_with(created_response(3, "Stratos MAXO"))
        .mount(&server)
        .await;

    let payloads = vec![transform(&record("Stratos MAXO"))];
    let report = test_client(&server).bulk_upload(&payloads, 0).await;

    assert_eq!(report.created.len(), 1);
    assert!(report.failed.is_empty());
}
