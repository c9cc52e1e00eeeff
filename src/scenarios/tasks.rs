//! Task query, retry and resume endpoints.
//!
//! Task ids only exist after `/api/audience/generate-async`, so the first step creates
//! one and every dependent step requires it from the chain.

use serde_json::{json, Value};
use tracing::info;

use crate::errors::Result;
use crate::harness::assert;
use crate::harness::{TestContext, TestFuture};
use crate::http::RequestOptions;

use super::{long, very_long};

const CHAIN_KEY: &str = "taskId";

pub fn run(ctx: &mut TestContext) -> TestFuture<'_> {
    Box::pin(run_suites(ctx))
}

async fn run_suites(ctx: &mut TestContext) -> Result<()> {
    create(ctx).await;
    query(ctx).await;
    retry(ctx).await;
    resume(ctx).await;
    edge_cases(ctx).await;
    Ok(())
}

async fn create(ctx: &mut TestContext) {
    ctx.describe("Tasks API - Create Task (Prerequisite)");

    ctx.test("POST /api/audience/generate-async - Create task for testing", |ctx| {
        Box::pin(async move {
            // Arrange
            let body = json!({
                "product_description": ctx.config.test_data.user_input,
                "market_context": "中国美妆市场",
                "segment_count": 2,
                "user_count": 3,
                "target_continent": "Asia",
                "account_id": ctx.config.test_account_id,
            });

            // Act
            let response = ctx.client.post("/api/audience/generate-async", body, long(ctx)).await;

            // Assert
            assert::http_ok(&response, Some("Should create audience generation task"))?;
            assert::has_property(response.json(), "task_id", Some("Response should contain task_id"))?;

            if let Some(id) = response.json().get("task_id").filter(|v| !v.is_null()) {
                info!(task_id = %id, "created task");
                ctx.chain.set(CHAIN_KEY, id, "audience/generate-async");
            }
            Ok(())
        })
    })
    .await;
}

async fn query(ctx: &mut TestContext) {
    ctx.describe("Tasks API - Query");

    ctx.test("GET /api/tasks/:id - Get task info with valid task_id", |ctx| {
        Box::pin(async move {
            let id = ctx.chain.require(CHAIN_KEY)?;
            let response = ctx.client.get(&format!("/api/tasks/{id}"), RequestOptions::new()).await;

            assert::http_ok(&response, Some("Get task info should succeed"))?;
            assert::has_property(response.json(), "task", Some("Response should contain task object"))?;
            assert::equal(
                response.json()["task"].get("id"),
                ctx.chain.get(CHAIN_KEY),
                Some("Task ID should match"),
            )?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /api/tasks/:id/result - Get task result", |ctx| {
        Box::pin(async move {
            let id = ctx.chain.require(CHAIN_KEY)?;
            let response = ctx
                .client
                .get(&format!("/api/tasks/{id}/result"), RequestOptions::new())
                .await;
            // 404 until the task completes
            assert::status_in(&response, &[200, 404], Some("Get task result should handle request"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /api/tasks/:id/audiences - Get task audiences", |ctx| {
        Box::pin(async move {
            let id = ctx.chain.require(CHAIN_KEY)?;
            let response = ctx
                .client
                .get(&format!("/api/tasks/{id}/audiences"), RequestOptions::new())
                .await;
            assert::status_in(&response, &[200, 404], Some("Get task audiences should handle request"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /api/tasks/999999999 - Non-existent task should indicate not found", |ctx| {
        Box::pin(async move {
            let response = ctx.client.get("/api/tasks/999999999", RequestOptions::new()).await;

            // the API answers 200 with success=false for unknown tasks
            assert::status_in(&response, &[200, 404, 422], Some("Should return valid response"))?;
            if response.status() == 200 {
                let data = response.json();
                assert::equal(
                    data.get("success"),
                    Some(&Value::Bool(false)),
                    Some("success should be false for non-existent task"),
                )?;
                assert::ok(
                    data.get("task").map_or(true, Value::is_null),
                    Some("task should be null"),
                )?;
            }
            Ok(())
        })
    })
    .await;

    ctx.test("GET /api/tasks/invalid - Invalid task ID format", |ctx| {
        Box::pin(async move {
            let response = ctx
                .client
                .get("/api/tasks/invalid-string-id", RequestOptions::new())
                .await;
            assert::status_in(&response, &[400, 404, 422], Some("Invalid task ID should return error"))?;
            Ok(())
        })
    })
    .await;
}

async fn retry(ctx: &mut TestContext) {
    ctx.describe("Tasks API - Retry Operations");

    ctx.test("POST /api/tasks/:id/retry-failed-responses - Retry failed survey responses", |ctx| {
        Box::pin(async move {
            let id = ctx.chain.require(CHAIN_KEY)?;
            let body = json!({
                "task_id": ctx.chain.get(CHAIN_KEY),
                "response_mode": "concise",
                "model_provider": "openrouter",
            });
            let response = ctx
                .client
                .post(&format!("/api/tasks/{id}/retry-failed-responses"), body, long(ctx))
                .await;
            // nothing to retry is a 4xx
            assert::status_in(
                &response,
                &[200, 400, 404, 422],
                Some("Retry failed responses should handle request"),
            )?;
            Ok(())
        })
    })
    .await;

    ctx.test(
        "POST /api/tasks/:id/retry-failed-audience-generation - Retry failed audiences",
        |ctx| {
            Box::pin(async move {
                let id = ctx.chain.require(CHAIN_KEY)?;
                let body = json!({
                    "task_id": ctx.chain.get(CHAIN_KEY),
                    "resume_from": "failed",
                    "model_provider": "openrouter",
                });
                let response = ctx
                    .client
                    .post(
                        &format!("/api/tasks/{id}/retry-failed-audience-generation"),
                        body,
                        very_long(ctx),
                    )
                    .await;
                assert::status_in(
                    &response,
                    &[200, 400, 404, 422],
                    Some("Retry failed audiences should handle request"),
                )?;
                Ok(())
            })
        },
    )
    .await;
}

async fn resume(ctx: &mut TestContext) {
    ctx.describe("Tasks API - Resume Operations");

    ctx.test("POST /api/tasks/:id/resume-from-survey - Resume from survey stage", |ctx| {
        Box::pin(async move {
            let id = ctx.chain.require(CHAIN_KEY)?;
            let body = json!({
                "model_provider": "openrouter",
                "response_mode": "concise",
                "generate_responses": true,
                "question_count": 5,
            });
            let response = ctx
                .client
                .post(&format!("/api/tasks/{id}/resume-from-survey"), body, long(ctx))
                .await;
            assert::status_in(
                &response,
                &[200, 400, 404, 422],
                Some("Resume from survey should handle request"),
            )?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /api/tasks/:id/resume - Resume interrupted task", |ctx| {
        Box::pin(async move {
            let id = ctx.chain.require(CHAIN_KEY)?;
            let response = ctx
                .client
                .post(
                    &format!("/api/tasks/{id}/resume"),
                    json!({ "response_mode": "concise" }),
                    long(ctx),
                )
                .await;
            assert::status_in(&response, &[200, 400, 404, 422], Some("Resume task should handle request"))?;
            Ok(())
        })
    })
    .await;
}

async fn edge_cases(ctx: &mut TestContext) {
    ctx.describe("Tasks API - Edge Cases");

    ctx.test("GET /api/tasks/ - Missing task ID should fail", |ctx| {
        Box::pin(async move {
            let response = ctx.client.get("/api/tasks/", RequestOptions::new()).await;
            assert::status_in(&response, &[400, 404, 405], Some("Missing task ID should be rejected"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /api/tasks/999999/retry-failed-responses - Non-existent task", |ctx| {
        Box::pin(async move {
            let response = ctx
                .client
                .post(
                    "/api/tasks/999999999/retry-failed-responses",
                    json!({ "response_mode": "concise" }),
                    RequestOptions::new(),
                )
                .await;
            assert::status_in(&response, &[400, 404, 422], Some("Non-existent task should return error"))?;
            Ok(())
        })
    })
    .await;
}
