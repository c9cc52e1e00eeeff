//! Full `/api/v1/audience-generate` surface: intent, personas, the one-shot flow,
//! tasks, segments, audience insight, interview extraction and batch operations.

use chrono::Utc;
use serde_json::{json, Value};

use crate::errors::Result;
use crate::harness::assert;
use crate::harness::{TestContext, TestFuture};
use crate::http::RequestOptions;

use super::{long, very_long};

const BASE: &str = "/api/v1/audience-generate";
const TASK_KEY: &str = "generateTaskId";
const EXTRACTION_KEY: &str = "extractionId";

pub fn run(ctx: &mut TestContext) -> TestFuture<'_> {
    Box::pin(run_suites(ctx))
}

async fn run_suites(ctx: &mut TestContext) -> Result<()> {
    intent_analysis(ctx).await;
    personas(ctx).await;
    complete_flow(ctx).await;
    task_management(ctx).await;
    segment_operations(ctx).await;
    audience_operations(ctx).await;
    interview_extraction(ctx).await;
    batch_operations(ctx).await;
    Ok(())
}

fn url(path: &str) -> String {
    format!("{BASE}{path}")
}

/// POST `body` to `path` and expect a 4xx/5xx.
async fn expect_rejected(ctx: &mut TestContext, name: &str, path: &'static str, body: Value, reason: &'static str) {
    ctx.test(name, move |ctx| {
        Box::pin(async move {
            let response = ctx.client.post(&url(path), body, RequestOptions::new()).await;
            assert::http_error(&response, Some(reason))?;
            Ok(())
        })
    })
    .await;
}

async fn intent_analysis(ctx: &mut TestContext) {
    ctx.describe("Audience Generate - Intent Analysis");

    ctx.test("POST /intent-analysis - Valid request", |ctx| {
        Box::pin(async move {
            // Arrange
            let body = json!({ "user_input": ctx.config.test_data.user_input });

            // Act
            let response = ctx.client.post(&url("/intent-analysis"), body, long(ctx)).await;

            // Assert
            assert::http_ok(&response, Some("Intent analysis should succeed"))?;
            Ok(())
        })
    })
    .await;

    expect_rejected(
        ctx,
        "POST /intent-analysis - Empty user_input should fail",
        "/intent-analysis",
        json!({ "user_input": "" }),
        "Empty user_input should be rejected",
    )
    .await;
    expect_rejected(
        ctx,
        "POST /intent-analysis - Missing user_input should fail",
        "/intent-analysis",
        json!({}),
        "Missing user_input should be rejected",
    )
    .await;
}

async fn personas(ctx: &mut TestContext) {
    ctx.describe("Audience Generate - Personas");

    ctx.test("POST /personas - Valid request", |ctx| {
        Box::pin(async move {
            let body = json!({
                "user_input": ctx.config.test_data.user_input,
                "segment_count": ctx.config.test_data.segment_count,
            });
            let response = ctx.client.post(&url("/personas"), body, long(ctx)).await;
            assert::http_ok(&response, Some("Personas generation should succeed"))?;
            Ok(())
        })
    })
    .await;

    let input = ctx.config.test_data.user_input.clone();
    expect_rejected(
        ctx,
        "POST /personas - Invalid segment_count (0) should fail",
        "/personas",
        json!({ "user_input": input, "segment_count": 0 }),
        "Zero segment_count should be rejected",
    )
    .await;
    expect_rejected(
        ctx,
        "POST /personas - Negative segment_count should fail",
        "/personas",
        json!({ "user_input": input, "segment_count": -1 }),
        "Negative segment_count should be rejected",
    )
    .await;
    expect_rejected(
        ctx,
        "POST /personas - Missing user_input should fail",
        "/personas",
        json!({ "segment_count": 3 }),
        "Missing user_input should be rejected",
    )
    .await;
}

async fn complete_flow(ctx: &mut TestContext) {
    ctx.describe("Audience Generate - Complete Flow");

    ctx.test("POST /complete - Valid request", |ctx| {
        Box::pin(async move {
            let body = json!({
                "user_input": ctx.config.test_data.user_input,
                "segment_count": ctx.config.test_data.segment_count,
            });
            let response = ctx.client.post(&url("/complete"), body, very_long(ctx)).await;
            assert::http_ok(&response, Some("Complete generation should succeed"))?;
            Ok(())
        })
    })
    .await;

    expect_rejected(
        ctx,
        "POST /complete - Empty body should fail",
        "/complete",
        json!({}),
        "Empty body should be rejected",
    )
    .await;
}

async fn task_management(ctx: &mut TestContext) {
    ctx.describe("Audience Generate - Task Management");

    ctx.test("POST /task/create - Create new task", |ctx| {
        Box::pin(async move {
            let body = json!({
                "account_id": ctx.config.test_account_id,
                "task_name": format!("测试任务_{}", Utc::now().timestamp_millis()),
                "user_input": ctx.config.test_data.user_input,
            });

            let response = ctx.client.post(&url("/task/create"), body, long(ctx)).await;

            assert::http_ok(&response, Some("Task creation should succeed"))?;
            if let Some(id) = response.json().get("task_id").filter(|v| !v.is_null()) {
                ctx.chain.set(TASK_KEY, id, "audience-generate/task/create");
            }
            Ok(())
        })
    })
    .await;

    let input = ctx.config.test_data.user_input.clone();
    let account = ctx.config.test_account_id;
    expect_rejected(
        ctx,
        "POST /task/create - Missing account_id should fail",
        "/task/create",
        json!({ "task_name": "Test Task", "user_input": input }),
        "Missing account_id should be rejected",
    )
    .await;
    expect_rejected(
        ctx,
        "POST /task/create - Missing user_input should fail",
        "/task/create",
        json!({ "account_id": account, "task_name": "Test Task" }),
        "Missing user_input should be rejected",
    )
    .await;

    ctx.test("GET /task/:id - Query existing task", |ctx| {
        Box::pin(async move {
            let created = ctx.chain.get_path_segment(TASK_KEY);
            let task_id = created.clone().unwrap_or_else(|| "123".to_string());

            let response = ctx
                .client
                .get(&url(&format!("/task/{task_id}?include_details=true")), RequestOptions::new())
                .await;

            if created.is_some() {
                assert::http_ok(&response, Some("Task query should succeed"))?;
            } else {
                assert::status_in(&response, &[200, 404], Some("Task query should return 200 or 404"))?;
            }
            Ok(())
        })
    })
    .await;

    ctx.test("GET /task/:id - Non-existent task should return 404", |ctx| {
        Box::pin(async move {
            let response = ctx
                .client
                .get(&url("/task/non-existent-task-id-12345"), RequestOptions::new())
                .await;
            assert::http_404(&response, Some("Non-existent task should return 404"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /task/:id/analyze-resume - Analyze task resume state", |ctx| {
        Box::pin(async move {
            // only meaningful against a task created above
            let Some(task_id) = ctx.chain.get_path_segment(TASK_KEY) else {
                return Ok(());
            };
            let response = ctx
                .client
                .get(&url(&format!("/task/{task_id}/analyze-resume")), RequestOptions::new())
                .await;
            assert::http_ok(&response, Some("Analyze resume should succeed"))?;
            Ok(())
        })
    })
    .await;
}

async fn segment_operations(ctx: &mut TestContext) {
    ctx.describe("Audience Generate - Segment Operations");

    ctx.test("POST /segment/rename - Rename segment", |ctx| {
        Box::pin(async move {
            let body = json!({
                "segment_id": 1327,
                "generate_language": "Chinese",
                "async_mode": false,
                "update_db": false,
            });
            let response = ctx.client.post(&url("/segment/rename"), body, long(ctx)).await;
            // the segment may not exist on this backend
            assert::status_in(&response, &[200, 404, 422], Some("Segment rename should handle request"))?;
            Ok(())
        })
    })
    .await;

    expect_rejected(
        ctx,
        "POST /segment/rename - Missing segment_id should fail",
        "/segment/rename",
        json!({ "generate_language": "Chinese" }),
        "Missing segment_id should be rejected",
    )
    .await;

    ctx.test("POST /segment/batch-rename - Batch rename segments", |ctx| {
        Box::pin(async move {
            let body = json!({
                "task_id": 123,
                "generate_language": "Chinese",
                "async_mode": false,
                "update_db": false,
            });
            let response = ctx.client.post(&url("/segment/batch-rename"), body, long(ctx)).await;
            assert::status_in(&response, &[200, 404, 422], Some("Batch rename should handle request"))?;
            Ok(())
        })
    })
    .await;
}

async fn audience_operations(ctx: &mut TestContext) {
    ctx.describe("Audience Generate - Audience Operations");

    ctx.test("POST /audience/insight - Get audience insight", |ctx| {
        Box::pin(async move {
            let body = json!({ "audience_id": 12345, "insight_type": "comprehensive" });
            let response = ctx.client.post(&url("/audience/insight"), body, long(ctx)).await;
            assert::status_in(&response, &[200, 404, 422], Some("Audience insight should handle request"))?;
            Ok(())
        })
    })
    .await;

    expect_rejected(
        ctx,
        "POST /audience/insight - Missing audience_id should fail",
        "/audience/insight",
        json!({ "insight_type": "comprehensive" }),
        "Missing audience_id should be rejected",
    )
    .await;

    ctx.test("GET /audience/personality-integrity - Check personality integrity", |ctx| {
        Box::pin(async move {
            let path = url(&format!(
                "/audience/personality-integrity?account_id={}&task_id=123",
                ctx.config.test_account_id
            ));
            let response = ctx.client.get(&path, RequestOptions::new()).await;
            assert::status_in(
                &response,
                &[200, 404],
                Some("Personality integrity check should handle request"),
            )?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /audience/personality-integrity/by-account - Account stats", |ctx| {
        Box::pin(async move {
            let path = url(&format!(
                "/audience/personality-integrity/by-account?account_id={}",
                ctx.config.test_account_id
            ));
            let response = ctx.client.get(&path, RequestOptions::new()).await;
            assert::http_ok(&response, Some("Account personality stats should succeed"))?;
            Ok(())
        })
    })
    .await;
}

async fn interview_extraction(ctx: &mut TestContext) {
    ctx.describe("Audience Generate - Interview Extraction");

    ctx.test("POST /interview/extract - Extract from interview", |ctx| {
        Box::pin(async move {
            let body = json!({
                "interview_transcript": ctx.config.test_data.interview_transcript,
                "account_id": ctx.config.test_account_id,
                "product_info": {
                    "category": "护肤品",
                    "name": ctx.config.test_data.product_name,
                },
            });

            let response = ctx.client.post(&url("/interview/extract"), body, long(ctx)).await;

            assert::http_ok(&response, Some("Interview extraction should succeed"))?;
            if let Some(id) = response.json().get("extraction_id").filter(|v| !v.is_null()) {
                ctx.chain.set(EXTRACTION_KEY, id, "interview/extract");
            }
            Ok(())
        })
    })
    .await;

    let account = ctx.config.test_account_id;
    expect_rejected(
        ctx,
        "POST /interview/extract - Empty transcript should fail",
        "/interview/extract",
        json!({ "interview_transcript": "", "account_id": account }),
        "Empty transcript should be rejected",
    )
    .await;

    ctx.test("GET /interview/extractions - List extractions", |ctx| {
        Box::pin(async move {
            let path = url(&format!(
                "/interview/extractions?account_id={}&page=1&page_size=20",
                ctx.config.test_account_id
            ));
            let response = ctx.client.get(&path, RequestOptions::new()).await;
            assert::http_ok(&response, Some("List extractions should succeed"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /interview/extraction/:id - Get specific extraction", |ctx| {
        Box::pin(async move {
            let created = ctx.chain.get_path_segment(EXTRACTION_KEY);
            let id = created.clone().unwrap_or_else(|| "123".to_string());

            let response = ctx
                .client
                .get(&url(&format!("/interview/extraction/{id}")), RequestOptions::new())
                .await;

            if created.is_some() {
                assert::http_ok(&response, Some("Get extraction should succeed"))?;
            } else {
                assert::status_in(&response, &[200, 404], Some("Get extraction should return 200 or 404"))?;
            }
            Ok(())
        })
    })
    .await;
}

async fn batch_operations(ctx: &mut TestContext) {
    ctx.describe("Audience Generate - Batch Operations");

    ctx.test("POST /batch-generate-prompt - Batch generate prompts", |ctx| {
        Box::pin(async move {
            let body = json!({ "audience_ids": [1, 2, 3], "force_regenerate": false, "batch_size": 10 });
            let response = ctx
                .client
                .post(&url("/batch-generate-prompt"), body, long(ctx))
                .await;
            assert::status_in(&response, &[200, 404, 422], Some("Batch generate prompt should handle request"))?;
            Ok(())
        })
    })
    .await;

    expect_rejected(
        ctx,
        "POST /batch-generate-prompt - Empty audience_ids should fail",
        "/batch-generate-prompt",
        json!({ "audience_ids": [], "force_regenerate": false }),
        "Empty audience_ids should be rejected",
    )
    .await;

    ctx.test("POST /segments/audiences - Generate audiences from segments", |ctx| {
        Box::pin(async move {
            let body = json!({
                "segment_ids": [1, 2, 3],
                "audience_per_segment": ctx.config.test_data.audience_per_persona,
                "account_id": ctx.config.test_account_id,
            });
            let response = ctx
                .client
                .post(&url("/segments/audiences"), body, very_long(ctx))
                .await;
            assert::status_in(
                &response,
                &[200, 202, 404, 422],
                Some("Segments audiences should handle request"),
            )?;
            Ok(())
        })
    })
    .await;
}
