use serde_json::json;

use crate::errors::Result;
use crate::harness::assert;
use crate::harness::{TestContext, TestFuture};
use crate::http::RequestOptions;

use super::{long, short};

const BASE: &str = "/api/avatars";

pub fn run(ctx: &mut TestContext) -> TestFuture<'_> {
    Box::pin(run_suites(ctx))
}

async fn run_suites(ctx: &mut TestContext) -> Result<()> {
    health_and_tasks(ctx).await;
    generation(ctx).await;
    regeneration(ctx).await;
    fix_operations(ctx).await;
    batch_tasks(ctx).await;
    Ok(())
}

async fn health_and_tasks(ctx: &mut TestContext) {
    ctx.describe("Avatar API - Health & Tasks");

    ctx.test("GET /api/avatars/health - Avatar service health", |ctx| {
        Box::pin(async move {
            let response = ctx.client.get(&format!("{BASE}/health"), short(ctx)).await;
            assert::ok(response.status() > 0, Some("Avatar health should respond"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /api/avatars/batch-tasks - List batch tasks", |ctx| {
        Box::pin(async move {
            let path = format!("{BASE}/batch-tasks?limit=10&account_id={}", ctx.config.test_account_id);
            let response = ctx.client.get(&path, RequestOptions::new()).await;
            assert::http_ok(&response, Some("List batch tasks should succeed"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /api/avatars/regenerate/tasks - List regenerate tasks", |ctx| {
        Box::pin(async move {
            let response = ctx
                .client
                .get(&format!("{BASE}/regenerate/tasks"), RequestOptions::new())
                .await;
            assert::status_in(&response, &[200, 404], Some("List regenerate tasks should handle request"))?;
            Ok(())
        })
    })
    .await;
}

async fn generation(ctx: &mut TestContext) {
    ctx.describe("Avatar API - Generation");

    ctx.test("POST /api/avatars/openrouter-generate - Generate single avatar", |ctx| {
        Box::pin(async move {
            let body = json!({
                "audience_id": 12345,
                "account_id": ctx.config.test_account_id,
                "style": "realistic",
            });
            let response = ctx
                .client
                .post(&format!("{BASE}/openrouter-generate"), body, long(ctx))
                .await;
            assert::status_in(
                &response,
                &[200, 400, 404, 422, 500],
                Some("Generate avatar should handle request"),
            )?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /api/avatars/openrouter-generate - Missing audience_id should fail", |ctx| {
        Box::pin(async move {
            let body = json!({ "account_id": ctx.config.test_account_id, "style": "realistic" });
            let response = ctx
                .client
                .post(&format!("{BASE}/openrouter-generate"), body, RequestOptions::new())
                .await;
            assert::http_error(&response, Some("Missing audience_id should be rejected"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /api/avatars/batch-generate - Batch generate avatars", |ctx| {
        Box::pin(async move {
            let body = json!({
                "audience_ids": [1, 2, 3],
                "account_id": ctx.config.test_account_id,
                "style": "realistic",
                "batch_size": 5,
            });
            let response = ctx
                .client
                .post(&format!("{BASE}/batch-generate"), body, long(ctx))
                .await;
            assert::status_in(
                &response,
                &[200, 202, 400, 404, 500],
                Some("Batch generate should handle request"),
            )?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /api/avatars/batch-generate - Empty audience_ids should fail", |ctx| {
        Box::pin(async move {
            let body = json!({ "audience_ids": [], "account_id": ctx.config.test_account_id });
            let response = ctx
                .client
                .post(&format!("{BASE}/batch-generate"), body, RequestOptions::new())
                .await;
            assert::http_error(&response, Some("Empty audience_ids should be rejected"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /api/avatars/openrouter-batch-generate - OpenRouter batch", |ctx| {
        Box::pin(async move {
            let body = json!({
                "audience_ids": [1, 2, 3],
                "account_id": ctx.config.test_account_id,
                "style": "realistic",
            });
            let response = ctx
                .client
                .post(&format!("{BASE}/openrouter-batch-generate"), body, long(ctx))
                .await;
            assert::status_in(
                &response,
                &[200, 202, 400, 404, 500],
                Some("OpenRouter batch should handle request"),
            )?;
            Ok(())
        })
    })
    .await;
}

async fn regeneration(ctx: &mut TestContext) {
    ctx.describe("Avatar API - Regeneration");

    ctx.test("POST /api/avatars/regenerate - Regenerate avatar", |ctx| {
        Box::pin(async move {
            let body = json!({
                "audience_id": 12345,
                "account_id": ctx.config.test_account_id,
                "reason": "quality improvement",
            });
            let response = ctx
                .client
                .post(&format!("{BASE}/regenerate"), body, long(ctx))
                .await;
            assert::status_in(&response, &[200, 400, 404, 500], Some("Regenerate should handle request"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /api/avatars/regenerate - Missing audience_id should fail", |ctx| {
        Box::pin(async move {
            let body = json!({ "account_id": ctx.config.test_account_id });
            let response = ctx
                .client
                .post(&format!("{BASE}/regenerate"), body, RequestOptions::new())
                .await;
            assert::http_error(&response, Some("Missing audience_id should be rejected"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /api/avatars/regenerate/:task_id/status - Get regen status", |ctx| {
        Box::pin(async move {
            let response = ctx
                .client
                .get(&format!("{BASE}/regenerate/task-id-here/status"), RequestOptions::new())
                .await;
            assert::status_in(&response, &[200, 404], Some("Get regen status should handle request"))?;
            Ok(())
        })
    })
    .await;
}

async fn fix_operations(ctx: &mut TestContext) {
    ctx.describe("Avatar API - Fix Operations");

    ctx.test("GET /api/avatars/scan-chinese-avatars - Scan Chinese avatars", |ctx| {
        Box::pin(async move {
            let response = ctx
                .client
                .get(&format!("{BASE}/scan-chinese-avatars"), long(ctx))
                .await;
            assert::status_in(&response, &[200, 404], Some("Scan Chinese avatars should handle request"))?;
            Ok(())
        })
    })
    .await;

    // dry runs only
    for (name, endpoint, message) in [
        (
            "POST /api/avatars/fix-chinese-avatars - Fix Chinese avatars",
            "fix-chinese-avatars",
            "Fix Chinese avatars should handle request",
        ),
        (
            "POST /api/avatars/fix-unknown-gender-avatars - Fix unknown gender",
            "fix-unknown-gender-avatars",
            "Fix unknown gender should handle request",
        ),
    ] {
        ctx.test(name, move |ctx| {
            Box::pin(async move {
                let body = json!({ "account_id": ctx.config.test_account_id, "dry_run": true });
                let response = ctx
                    .client
                    .post(&format!("{BASE}/{endpoint}"), body, long(ctx))
                    .await;
                assert::status_in(&response, &[200, 400, 404], Some(message))?;
                Ok(())
            })
        })
        .await;
    }
}

async fn batch_tasks(ctx: &mut TestContext) {
    ctx.describe("Avatar API - Batch Task Management");

    ctx.test("GET /api/avatars/batch-progress/:id - Get batch progress", |ctx| {
        Box::pin(async move {
            let response = ctx
                .client
                .get(&format!("{BASE}/batch-progress/batch-task-id"), RequestOptions::new())
                .await;
            assert::status_in(&response, &[200, 404], Some("Get batch progress should handle request"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("DELETE /api/avatars/batch-tasks/:id - Delete batch task", |ctx| {
        Box::pin(async move {
            let response = ctx
                .client
                .delete(&format!("{BASE}/batch-tasks/non-existent-task"), RequestOptions::new())
                .await;
            assert::status_in(&response, &[200, 204, 404], Some("Delete batch task should handle request"))?;
            Ok(())
        })
    })
    .await;
}
