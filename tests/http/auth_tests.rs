// Integration tests for form login
//
// A successful login replaces the configured token and account id for every
// later request; a rejected login surfaces the server's reason.

use std::time::{Duration, Instant};

use apisuite::auth::LOGIN_PATH;
use apisuite::errors::SuiteError;
use apisuite::http::{ApiClient, RequestOptions};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{TEST_API_KEY, config_for};

#[tokio::test]
async fn test_login_stores_token_and_account() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .and(header("X-API-Key", TEST_API_KEY))
        .and(body_string_contains("username=qa%40example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "user": {"id": 7, "email": "qa@example.com"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut client = ApiClient::new(&config_for(&server));
    assert!(!client.is_authenticated());

    let state = client.login("qa@example.com", "secret").await.unwrap();
    assert_eq!(state.token, "fresh");
    assert_eq!(state.account_id, Some(7));
    assert_eq!(client.token(), Some("fresh"));
    assert_eq!(client.account_id(), 7);

    let response = client.get("/me", RequestOptions::new()).await;
    assert!(response.ok());

    client.logout();
    assert_eq!(client.token(), None);
}

#[tokio::test]
async fn test_login_failure_reports_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Bad credentials"})))
        .mount(&server)
        .await;

    let mut client = ApiClient::new(&config_for(&server));
    let err = client.login("qa@example.com", "wrong").await.unwrap_err();

    assert!(matches!(err, SuiteError::Auth(_)));
    assert_eq!(err.to_string(), "Login failed: Bad credentials");
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_login_is_bounded_by_default_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "late", "user": {"id": 1}}))
                .set_delay(Duration::from_secs(4)),
        )
        .mount(&server)
        .await;

    let mut cfg = config_for(&server);
    cfg.timeouts.default_ms = 200;
    let mut client = ApiClient::new(&cfg);

    let started = Instant::now();
    let err = client.login("qa@example.com", "secret").await.unwrap_err();

    assert!(started.elapsed() < Duration::from_millis(1_500));
    assert_eq!(err.to_string(), "Login failed: Request timeout");
    assert!(!client.is_authenticated());
}
