//! Tests for REST API client helpers.

use std::time::Duration;

use horizon_gridview_net::NetworkError;
use horizon_gridview_net::http::{RateLimiter, RestApiClient, RetryConfig};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        initial_delay_ms: 5,
        max_delay_ms: 20,
        backoff_multiplier: 2.0,
    }
}

#[test]
fn test_rest_api_client_base_url_normalization() {
    let client = RestApiClient::builder("https://org.example.com/api/data/v9.0/")
        .build()
        .expect("Failed to build client");

    assert_eq!(client.base_url(), "https://org.example.com/api/data/v9.0");
}

#[test]
fn test_rest_api_client_rejects_invalid_base_url() {
    let result = RestApiClient::builder("not a url").build();
    assert!(matches!(result, Err(NetworkError::InvalidUrl(_))));
}

#[test]
fn test_rest_api_request_builder() {
    let client = RestApiClient::builder("https://org.example.com/api/data/v9.0")
        .bearer_auth("token123")
        .accept_json()
        .build()
        .expect("Failed to build client");

    let request = client.get("/accounts").build();
    assert_eq!(request.url, "https://org.example.com/api/data/v9.0/accounts");
    assert_eq!(request.method, http::Method::GET);
    assert_eq!(request.bearer_token.as_deref(), Some("token123"));
    assert_eq!(request.headers.get("Accept").unwrap(), "application/json");

    // Path without leading slash
    let request = client
        .get("accounts")
        .query("$top", "5")
        .header("Prefer", "odata.maxpagesize=5")
        .timeout(Duration::from_secs(5))
        .build();
    assert_eq!(request.url, "https://org.example.com/api/data/v9.0/accounts");
    assert_eq!(request.query, vec![("$top".to_string(), "5".to_string())]);
    assert!(request.headers.contains_key("Prefer"));
    assert_eq!(request.timeout, Some(Duration::from_secs(5)));
}

#[tokio::test]
async fn test_rate_limiter_spaces_requests() {
    let limiter = RateLimiter::new(20);
    let start = std::time::Instant::now();
    for _ in 0..21 {
        limiter.acquire().await;
    }
    assert!(start.elapsed() >= Duration::from_millis(40));
}

#[tokio::test]
async fn test_bearer_token_and_default_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .and(header("Authorization", "Bearer secret"))
        .and(header("Accept", "application/json"))
        .and(query_param("$select", "name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = RestApiClient::builder(server.uri())
        .bearer_auth("secret")
        .accept_json()
        .no_retry()
        .build()
        .expect("Failed to build client");

    let body: serde_json::Value = client
        .get("accounts")
        .query("$select", "name")
        .json_response()
        .await
        .expect("request failed");
    assert_eq!(body["value"], serde_json::json!([]));
}

#[tokio::test]
async fn test_retries_server_errors_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&server)
        .await;

    let client = RestApiClient::builder(server.uri())
        .retry(fast_retry(3))
        .build()
        .expect("Failed to build client");

    let body: serde_json::Value = client.get("flaky").json_response().await.expect("request failed");
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_throttled_response_honors_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/throttled"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/throttled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let client = RestApiClient::builder(server.uri())
        .retry(fast_retry(1))
        .build()
        .expect("Failed to build client");

    let response = client.get("throttled").send().await.expect("request failed");
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_no_retry_surfaces_status_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let client = RestApiClient::builder(server.uri())
        .no_retry()
        .build()
        .expect("Failed to build client");

    let err = client
        .get("broken")
        .json_response::<serde_json::Value>()
        .await
        .unwrap_err();
    assert_eq!(
        err,
        NetworkError::HttpStatus {
            status: 500,
            message: Some("boom".to_string())
        }
    );
}
