use apisuite::harness::{TestContext, TestStatus};
use apisuite::report::{Summary, render_summary};
use apisuite::scenarios::{audience, chat, health, tasks};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::context_for;

fn status_of(ctx: &TestContext, name: &str) -> TestStatus {
    ctx.results
        .outcomes()
        .iter()
        .find(|t| t.name == name)
        .map(|t| t.status)
        .unwrap_or_else(|| panic!("no outcome named {name}"))
}

fn error_of(ctx: &TestContext, name: &str) -> Option<String> {
    ctx.results
        .outcomes()
        .iter()
        .find(|t| t.name == name)
        .and_then(|t| t.error.clone())
}

async fn mount_health_endpoints(server: &MockServer) {
    for p in ["/inference/health", "/inference/ready", "/api/avatars/health"] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/api/v1/vector/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "services": {"qdrant": "up"}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_health_probe_passes_against_mock() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/inference/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;

    let mut ctx = context_for(&server);
    health::run(&mut ctx).await.unwrap();

    assert_eq!(
        status_of(&ctx, "GET /inference/health - Should return healthy status"),
        TestStatus::Passed
    );
    assert_eq!(
        status_of(&ctx, "GET /inference/health - Concurrent requests should all respond"),
        TestStatus::Passed
    );
    // unmocked readiness probe answers 404
    assert_eq!(
        status_of(&ctx, "GET /inference/ready - Should return ready status"),
        TestStatus::Failed
    );

    let lines = render_summary(&Summary::from_results(&ctx.results));
    assert_eq!(lines[1], format!("Passed:  {}", ctx.results.passed()));
    assert_eq!(lines[2], format!("Failed:  {}", ctx.results.failed()));
}

#[tokio::test]
async fn test_health_module_all_green() {
    let server = MockServer::start().await;
    mount_health_endpoints(&server).await;

    let mut ctx = context_for(&server);
    health::run(&mut ctx).await.unwrap();

    assert_eq!(ctx.results.failed(), 0, "{:?}", ctx.results.outcomes());
    assert_eq!(ctx.results.passed(), 9);

    let received = server.received_requests().await.unwrap();
    let fan_out = received
        .iter()
        .filter(|r| r.url.path() == "/inference/health")
        .count();
    // three single probes plus the five-way fan-out
    assert_eq!(fan_out, 8);
}

#[tokio::test]
async fn test_zero_segment_count_rejection_passes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/audience-generate/personas"))
        .and(body_partial_json(json!({"segment_count": 0})))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{"loc": ["body", "segment_count"], "msg": "ensure this value is greater than 0"}]
        })))
        .mount(&server)
        .await;

    let mut ctx = context_for(&server);
    audience::run(&mut ctx).await.unwrap();

    assert_eq!(
        status_of(&ctx, "POST /personas - segment_count=0 should fail"),
        TestStatus::Passed
    );
    // the valid request is not mocked, so the positive test fails
    assert_eq!(
        status_of(&ctx, "POST /personas - Valid input should generate personas"),
        TestStatus::Failed
    );
}

#[tokio::test]
async fn test_task_id_flows_through_chain() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/audience/generate-async"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"task_id": 42})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"task": {"id": 42}})))
        .mount(&server)
        .await;

    let mut ctx = context_for(&server);
    tasks::run(&mut ctx).await.unwrap();

    assert_eq!(ctx.chain.get_i64("taskId"), Some(42));
    assert_eq!(
        status_of(&ctx, "GET /api/tasks/:id - Get task info with valid task_id"),
        TestStatus::Passed
    );
    let history = ctx.chain.history();
    assert_eq!(history[0].source, "audience/generate-async");
}

#[tokio::test]
async fn test_missing_producer_fails_consumers_without_calling_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/audience/generate-async"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "boom"})))
        .mount(&server)
        .await;

    let mut ctx = context_for(&server);
    tasks::run(&mut ctx).await.unwrap();

    assert!(!ctx.chain.has("taskId"));
    let consumer = "GET /api/tasks/:id - Get task info with valid task_id";
    assert_eq!(status_of(&ctx, consumer), TestStatus::Failed);
    assert_eq!(
        error_of(&ctx, consumer).as_deref(),
        Some("Usage error: No taskId from previous step")
    );

    let bad_paths = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path().contains("null") || r.url.path().contains("undefined"))
        .count();
    assert_eq!(bad_paths, 0);
}

#[tokio::test]
async fn test_workflow_fails_login_step_without_credentials() {
    // every endpoint is unmocked and answers 404
    let server = MockServer::start().await;

    let mut ctx = context_for(&server);
    apisuite::scenarios::workflow::run(&mut ctx).await.unwrap();

    assert_eq!(
        error_of(&ctx, "Login and get account_id").as_deref(),
        Some("Usage error: No credentials or JWT token configured")
    );
    assert_eq!(
        status_of(&ctx, "Step 4: Similarity search (using previous result)"),
        TestStatus::Skipped
    );
}

#[tokio::test]
async fn test_chat_session_flows_into_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/sessions/batch"))
        .and(body_partial_json(json!({"engine": "S"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"session_ids": ["s-1", "s-2"]})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat/sessions/s-1/messages"))
        .and(body_partial_json(json!({"message_type": "text", "engine": "S"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reply": "hi"})))
        .mount(&server)
        .await;

    let mut ctx = context_for(&server);
    chat::run(&mut ctx).await.unwrap();

    assert_eq!(ctx.chain.get_str("chatSessionId"), Some("s-1"));
    assert_eq!(
        status_of(&ctx, "POST /sessions/:id/messages - Send chat message"),
        TestStatus::Passed
    );
    // unmatched requests get wiremock's 404, which the rejection tests accept
    assert_eq!(
        status_of(&ctx, "POST /sessions/:id/messages - Empty content should fail"),
        TestStatus::Passed
    );
    // a created session must end cleanly, so a 404 here is a failure
    assert_eq!(
        status_of(&ctx, "POST /sessions/:id/end - End chat session"),
        TestStatus::Failed
    );
    let received = server.received_requests().await.unwrap();
    let to_session = received
        .iter()
        .filter(|r| r.url.path() == "/api/chat/sessions/s-1/messages")
        .count();
    assert_eq!(to_session, 3);
}
