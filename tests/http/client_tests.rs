// Integration tests for ApiClient
//
// These tests verify that every call comes back as a ResponseResult:
// - 2xx/4xx/5xx with a negotiated body
// - timeouts and transport failures as status 0, never an Err
// - default headers, bearer injection and caller overrides

use std::time::{Duration, Instant};

use apisuite::http::{ApiClient, Body, RequestOptions};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{TEST_API_KEY, config_for};

#[tokio::test]
async fn test_get_sends_default_headers_and_no_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/inference/health"))
        .and(header("X-API-Key", TEST_API_KEY))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&config_for(&server));
    let response = client
        .get("/inference/health", RequestOptions::new().body(json!({"ignored": true})))
        .await;

    assert!(response.ok());
    assert_eq!(response.status(), 200);
    assert_eq!(response.json()["status"], "ok");

    let received = server.received_requests().await.unwrap();
    assert!(received[0].body.is_empty());
    assert!(received[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_bearer_token_and_no_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/secure"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut cfg = config_for(&server);
    cfg.jwt_token = Some("tok".into());
    let client = ApiClient::new(&cfg);

    client.get("/secure", RequestOptions::new()).await;
    client.get("/secure", RequestOptions::new().no_auth()).await;

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].headers.get("authorization").unwrap(), "Bearer tok");
    assert!(received[1].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_post_serializes_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/audience-generate/personas"))
        .and(body_json(json!({"user_input": "x", "segment_count": 0})))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({
                "detail": [{"loc": ["body", "segment_count"], "msg": "must be > 0"}]
            })),
        )
        .mount(&server)
        .await;

    let client = ApiClient::new(&config_for(&server));
    let response = client
        .post(
            "/api/v1/audience-generate/personas",
            json!({"user_input": "x", "segment_count": 0}),
            RequestOptions::new(),
        )
        .await;

    assert!(!response.ok());
    assert_eq!(response.status(), 422);
    assert!(response.error().is_none());
    assert!(response.json()["detail"].is_array());
}

#[tokio::test]
async fn test_text_body_is_kept_as_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/plain"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let client = ApiClient::new(&config_for(&server));
    let response = client.get("/plain", RequestOptions::new()).await;

    assert_eq!(response.status(), 500);
    assert_eq!(response.body(), &Body::Text("upstream exploded".into()));
    assert!(response.json().is_null());
    assert_eq!(response.detail(), "upstream exploded");
}

#[tokio::test]
async fn test_timeout_returns_within_bound() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let client = ApiClient::new(&config_for(&server));
    let started = Instant::now();
    let response = client
        .get("/slow", RequestOptions::new().timeout(Duration::from_millis(200)))
        .await;

    assert!(started.elapsed() < Duration::from_millis(1_500));
    assert!(response.timed_out());
    assert_eq!(response.status(), 0);
    assert!(!response.ok());
    assert_eq!(response.error(), Some("Request timeout"));
}

#[tokio::test]
async fn test_connection_refused_is_status_zero() {
    let server = MockServer::start().await;
    let mut cfg = config_for(&server);
    // nothing listens on port 1
    cfg.base_url = "http://127.0.0.1:1".into();
    drop(server);

    let client = ApiClient::new(&cfg);
    let response = client.get("/inference/health", RequestOptions::new()).await;

    assert_eq!(response.status(), 0);
    assert!(!response.ok());
    assert!(!response.timed_out());
    assert!(response.error().is_some_and(|e| !e.is_empty()));
    assert!(response.headers().is_none());
}

#[tokio::test]
async fn test_verbose_mode_does_not_change_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/vector/search/semantic"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("x-request-id", "abc")
                .set_body_json(json!({"results": [{"audience_id": 5}]})),
        )
        .mount(&server)
        .await;

    let body = json!({"query": "skincare", "top_k": 5});
    let mut results = Vec::new();
    for verbose in [false, true] {
        let mut cfg = config_for(&server);
        cfg.verbose = verbose;
        let client = ApiClient::new(&cfg);
        results.push(
            client
                .post("/api/v1/vector/search/semantic", body.clone(), RequestOptions::new())
                .await,
        );
    }
    let (quiet, loud) = (&results[0], &results[1]);

    assert_eq!(quiet.status(), 201);
    assert_eq!(quiet.status(), loud.status());
    assert_eq!(quiet.ok(), loud.ok());
    assert_eq!(quiet.body(), loud.body());
    assert_eq!(quiet.error(), loud.error());
    let stable = |r: &apisuite::http::ResponseResult| {
        r.headers()
            .unwrap()
            .iter()
            .filter(|(k, _)| k.as_str() != "date")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(stable(quiet), stable(loud));

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].body, received[1].body);
}
