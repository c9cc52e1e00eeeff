//! Async survey generation, parallel deployment and batch management.

use chrono::Utc;
use serde_json::json;

use crate::errors::Result;
use crate::harness::assert;
use crate::harness::{TestContext, TestFuture};
use crate::http::RequestOptions;

use super::long;

const BASE: &str = "/api/async-survey";
const TASK_KEY: &str = "asyncSurveyTaskId";
const BATCH_KEY: &str = "surveyBatchId";

pub fn run(ctx: &mut TestContext) -> TestFuture<'_> {
    Box::pin(run_suites(ctx))
}

async fn run_suites(ctx: &mut TestContext) -> Result<()> {
    generation(ctx).await;
    task_management(ctx).await;
    parallel_deployment(ctx).await;
    batch_management(ctx).await;
    Ok(())
}

fn batch(ctx: &TestContext) -> String {
    ctx.chain
        .get_path_segment(BATCH_KEY)
        .unwrap_or_else(|| "batch-id".to_string())
}

async fn generation(ctx: &mut TestContext) {
    ctx.describe("Async Survey - Generation");

    ctx.test("POST /api/async-survey/generate-async - Create async survey", |ctx| {
        Box::pin(async move {
            // Arrange
            let body = json!({
                "account_id": ctx.config.test_account_id,
                "survey_config": {
                    "title": format!("测试问卷_{}", Utc::now().timestamp_millis()),
                    "questions": [
                        { "id": "q1", "text": "您的年龄段是？", "type": "single_choice" },
                        { "id": "q2", "text": "您日常使用哪些护肤品？", "type": "multiple_choice" },
                    ],
                },
                "audience_ids": [1, 2, 3],
            });

            // Act
            let response = ctx
                .client
                .post(&format!("{BASE}/generate-async"), body, long(ctx))
                .await;

            // Assert
            assert::status_in(
                &response,
                &[200, 202, 400, 422],
                Some("Create async survey should handle request"),
            )?;
            if response.ok() {
                if let Some(id) = response.json().get("task_id").filter(|v| !v.is_null()) {
                    ctx.chain.set(TASK_KEY, id, "async-survey/generate-async");
                }
            }
            Ok(())
        })
    })
    .await;

    ctx.test("POST /api/async-survey/generate-async - Missing account_id should fail", |ctx| {
        Box::pin(async move {
            let body = json!({
                "survey_config": { "title": "Test", "questions": [] },
                "audience_ids": [1, 2, 3],
            });
            let response = ctx
                .client
                .post(&format!("{BASE}/generate-async"), body, RequestOptions::new())
                .await;
            assert::http_error(&response, Some("Missing account_id should be rejected"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /api/async-survey/generate-async - Empty audience_ids should fail", |ctx| {
        Box::pin(async move {
            let body = json!({
                "account_id": ctx.config.test_account_id,
                "survey_config": { "title": "Test", "questions": [] },
                "audience_ids": [],
            });
            let response = ctx
                .client
                .post(&format!("{BASE}/generate-async"), body, RequestOptions::new())
                .await;
            assert::http_error(&response, Some("Empty audience_ids should be rejected"))?;
            Ok(())
        })
    })
    .await;
}

async fn task_management(ctx: &mut TestContext) {
    ctx.describe("Async Survey - Task Management");

    ctx.test("GET /api/async-survey/generate-async-tasks - List tasks", |ctx| {
        Box::pin(async move {
            let path = format!(
                "{BASE}/generate-async-tasks?account_id={}&page=1&page_size=20",
                ctx.config.test_account_id
            );
            let response = ctx.client.get(&path, RequestOptions::new()).await;
            assert::http_ok(&response, Some("List tasks should succeed"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /api/async-survey/generate-async/:id - Get task details", |ctx| {
        Box::pin(async move {
            let created = ctx.chain.get_path_segment(TASK_KEY);
            let task_id = created.clone().unwrap_or_else(|| "task-id".to_string());
            let path = format!(
                "{BASE}/generate-async/{task_id}?account_id={}",
                ctx.config.test_account_id
            );

            let response = ctx.client.get(&path, RequestOptions::new()).await;

            if created.is_some() {
                assert::http_ok(&response, Some("Get task details should succeed"))?;
            } else {
                assert::status_in(&response, &[200, 404], Some("Get task should handle request"))?;
            }
            Ok(())
        })
    })
    .await;

    ctx.test("DELETE /api/async-survey/generate-async/:id - Delete task", |ctx| {
        Box::pin(async move {
            let response = ctx
                .client
                .delete(&format!("{BASE}/generate-async/non-existent-task"), RequestOptions::new())
                .await;
            assert::status_in(&response, &[200, 204, 404], Some("Delete task should handle request"))?;
            Ok(())
        })
    })
    .await;
}

async fn parallel_deployment(ctx: &mut TestContext) {
    ctx.describe("Async Survey - Parallel Deployment");

    ctx.test("POST /api/async-survey/deploy-parallel - Deploy parallel survey", |ctx| {
        Box::pin(async move {
            let body = json!({
                "account_id": ctx.config.test_account_id,
                "survey_id": 123,
                "audience_ids": [1, 2, 3, 4, 5],
                "parallel_count": 3,
            });
            let response = ctx
                .client
                .post(&format!("{BASE}/deploy-parallel"), body, long(ctx))
                .await;

            assert::status_in(
                &response,
                &[200, 202, 400, 404, 422],
                Some("Deploy parallel should handle request"),
            )?;
            if response.ok() {
                if let Some(id) = response.json().get("batch_id").filter(|v| !v.is_null()) {
                    ctx.chain.set(BATCH_KEY, id, "async-survey/deploy-parallel");
                }
            }
            Ok(())
        })
    })
    .await;

    ctx.test("POST /api/async-survey/deploy-parallel - Missing survey_id should fail", |ctx| {
        Box::pin(async move {
            let body = json!({
                "account_id": ctx.config.test_account_id,
                "audience_ids": [1, 2, 3],
            });
            let response = ctx
                .client
                .post(&format!("{BASE}/deploy-parallel"), body, RequestOptions::new())
                .await;
            assert::http_error(&response, Some("Missing survey_id should be rejected"))?;
            Ok(())
        })
    })
    .await;
}

async fn batch_management(ctx: &mut TestContext) {
    ctx.describe("Async Survey - Batch Management");

    ctx.test("GET /api/async-survey/deployment-status/:batch_id - Get deployment status", |ctx| {
        Box::pin(async move {
            let path = format!("{BASE}/deployment-status/{}", batch(ctx));
            let response = ctx.client.get(&path, RequestOptions::new()).await;
            assert::status_in(&response, &[200, 404], Some("Get deployment status should handle request"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /api/async-survey/batch/:batch_id/heartbeat - Batch heartbeat", |ctx| {
        Box::pin(async move {
            let path = format!("{BASE}/batch/{}/heartbeat", batch(ctx));
            let response = ctx.client.get(&path, RequestOptions::new()).await;
            assert::status_in(&response, &[200, 404], Some("Batch heartbeat should handle request"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /api/async-survey/batch/:batch_id/resume - Resume batch", |ctx| {
        Box::pin(async move {
            let path = format!("{BASE}/batch/{}/resume", batch(ctx));
            let response = ctx
                .client
                .post(&path, json!({ "continue_from_failed": true }), long(ctx))
                .await;
            assert::status_in(&response, &[200, 400, 404], Some("Resume batch should handle request"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /api/async-survey/survey-by-batch/:batch_id - Get surveys by batch", |ctx| {
        Box::pin(async move {
            let path = format!("{BASE}/survey-by-batch/{}", batch(ctx));
            let response = ctx.client.get(&path, RequestOptions::new()).await;
            assert::status_in(&response, &[200, 404], Some("Get surveys by batch should handle request"))?;
            Ok(())
        })
    })
    .await;
}
