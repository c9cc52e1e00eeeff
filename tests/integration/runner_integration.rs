use std::fs;

use apisuite::harness::TestContext;
use apisuite::report::Report;
use apisuite::runner::{self, RunOptions, Selection};
use apisuite::scenarios::registry;
use serde_json::json;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::config_for;

async fn ok_everywhere() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;
    server
}

#[test]
fn test_explicit_module_beats_smoke() {
    let registry = registry().unwrap();
    let selection = Selection::from_flags(Some("health".into()), true);
    let modules = selection.resolve(&registry).unwrap();
    let keys: Vec<_> = modules.iter().map(|m| m.key.as_str()).collect();
    assert_eq!(keys, ["health"]);
}

#[tokio::test]
async fn test_module_selection_only_hits_selected_endpoints() {
    let server = ok_everywhere().await;
    let registry = registry().unwrap();
    let mut ctx = TestContext::new(config_for(&server));

    let selection = Selection::from_flags(Some("health".into()), true);
    let outcome = runner::execute(&mut ctx, &registry, &selection, &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.failed, 0);
    assert_eq!(outcome.exit_code(), 0);
    let suites: Vec<_> = ctx.results.outcomes().iter().map(|t| t.suite.as_str()).collect();
    assert!(suites.iter().all(|s| s.contains("Health") || s.contains("Check")));

    let received = server.received_requests().await.unwrap();
    assert!(received.iter().all(|r| r.url.path().contains("health") || r.url.path().contains("ready")));
}

#[tokio::test]
async fn test_unknown_module_runs_nothing() {
    let server = ok_everywhere().await;
    let registry = registry().unwrap();
    let mut ctx = TestContext::new(config_for(&server));

    let err = runner::execute(
        &mut ctx,
        &registry,
        &Selection::Module("bogus".into()),
        &RunOptions::default(),
    )
    .await
    .unwrap_err();

    assert_eq!(err.to_string(), "Unknown module: bogus");
    assert!(server.received_requests().await.unwrap().is_empty());
    assert_eq!(ctx.results.total(), 0);
}

#[tokio::test]
async fn test_report_file_name_and_totals() {
    let server = ok_everywhere().await;
    let registry = registry().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = TestContext::new(config_for(&server));

    let opts = RunOptions {
        report_dir: Some(dir.path().join("reports")),
    };
    let outcome = runner::execute(&mut ctx, &registry, &Selection::Tagged(runner::Tag::Smoke), &opts)
        .await
        .unwrap();

    let path = outcome.report_path.clone().expect("report written");
    let name = path.file_name().unwrap().to_str().unwrap();
    let stamp = name
        .strip_prefix("test-report-")
        .and_then(|s| s.strip_suffix(".json"))
        .expect("report name shape");
    assert!(!stamp.contains(':') && !stamp.contains('.'), "{stamp}");
    assert!(stamp.ends_with('Z'));
    assert_eq!(stamp.len(), "2024-05-06T07-08-09-000Z".len());

    let report: Report = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let s = &report.summary;
    assert_eq!(s.total, s.passed + s.failed + s.skipped);
    assert_eq!(s.total, ctx.results.total());
    assert_eq!(report.tests.len(), s.total);
    assert_eq!(report.failures.len(), s.failed);
    assert_eq!(outcome.exit_code(), if s.failed == 0 { 0 } else { 1 });

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert!(raw["summary"]["passRate"].is_number());
    assert!(raw["totalTimeMs"].is_u64());
}
