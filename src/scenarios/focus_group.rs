//! Focus group lifecycle: create, participants, moderation, batch work, analysis.
//!
//! Steps after creation target the group created here when creation succeeded, and a
//! placeholder id otherwise. Against the placeholder only the status-tolerant checks run.

use chrono::Utc;
use serde_json::json;

use crate::errors::Result;
use crate::harness::assert;
use crate::harness::{TestContext, TestFuture};
use crate::http::{Method, RequestOptions};

use super::{long, very_long};

const BASE: &str = "/api/focus-group";
const PLACEHOLDER_ID: &str = "123";
const CHAIN_KEY: &str = "focusGroupId";

pub fn run(ctx: &mut TestContext) -> TestFuture<'_> {
    Box::pin(run_suites(ctx))
}

/// (group id, whether it was created by this run)
fn target(ctx: &TestContext) -> (String, bool) {
    match ctx.chain.get_path_segment(CHAIN_KEY) {
        Some(id) => (id, true),
        None => (PLACEHOLDER_ID.to_string(), false),
    }
}

async fn run_suites(ctx: &mut TestContext) -> Result<()> {
    create_and_list(ctx).await;
    participants(ctx).await;
    operations(ctx).await;
    batch_operations(ctx).await;
    analysis(ctx).await;
    update(ctx).await;
    Ok(())
}

async fn create_and_list(ctx: &mut TestContext) {
    ctx.describe("Focus Group - Create & List");

    ctx.test("POST /api/focus-group/create - Create focus group", |ctx| {
        Box::pin(async move {
            // Arrange
            let body = json!({
                "account_id": ctx.config.test_account_id,
                "title": format!("测试焦点小组_{}", Utc::now().timestamp_millis()),
                "topic": "了解年轻女性护肤习惯",
                "background": "市场调研背景信息",
                "research_objectives": ["了解购买动机", "了解使用场景", "了解品牌偏好"],
            });

            // Act
            let response = ctx.client.post(&format!("{BASE}/create"), body, long(ctx)).await;

            // Assert
            assert::http_ok(&response, Some("Focus group creation should succeed"))?;
            if let Some(id) = response.json().get("id").filter(|v| !v.is_null()) {
                ctx.chain.set(CHAIN_KEY, id, "focus-group/create");
            }
            Ok(())
        })
    })
    .await;

    ctx.test("POST /api/focus-group/create - Missing account_id should fail", |ctx| {
        Box::pin(async move {
            let body = json!({ "title": "Test Group", "topic": "Test Topic" });
            let response = ctx
                .client
                .post(&format!("{BASE}/create"), body, RequestOptions::new())
                .await;
            assert::http_error(&response, Some("Missing account_id should be rejected"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /api/focus-group/create - Missing title should fail", |ctx| {
        Box::pin(async move {
            let body = json!({ "account_id": ctx.config.test_account_id, "topic": "Test Topic" });
            let response = ctx
                .client
                .post(&format!("{BASE}/create"), body, RequestOptions::new())
                .await;
            assert::http_error(&response, Some("Missing title should be rejected"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /api/focus-group/list - List focus groups", |ctx| {
        Box::pin(async move {
            let path = format!(
                "{BASE}/list?account_id={}&page=1&page_size=20",
                ctx.config.test_account_id
            );
            let response = ctx.client.get(&path, RequestOptions::new()).await;
            assert::http_ok(&response, Some("List focus groups should succeed"))?;
            assert::has_property(
                response.json(),
                "focus_groups",
                Some("Response should have focus_groups array"),
            )?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /api/focus-group/list - Missing account_id should fail", |ctx| {
        Box::pin(async move {
            let response = ctx.client.get(&format!("{BASE}/list"), RequestOptions::new()).await;
            assert::http_error(&response, Some("Missing account_id should be rejected"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /api/focus-group/report-types/list - List report types", |ctx| {
        Box::pin(async move {
            let response = ctx
                .client
                .get(&format!("{BASE}/report-types/list"), RequestOptions::new())
                .await;
            assert::http_ok(&response, Some("List report types should succeed"))?;
            Ok(())
        })
    })
    .await;
}

async fn participants(ctx: &mut TestContext) {
    ctx.describe("Focus Group - Participants");

    ctx.test("POST /:id/participants - Add participants", |ctx| {
        Box::pin(async move {
            let (id, created) = target(ctx);
            let body = json!({ "audience_ids": [1, 2, 3, 4, 5] });
            let response = ctx
                .client
                .post(&format!("{BASE}/{id}/participants"), body, long(ctx))
                .await;
            if created {
                assert::http_ok(&response, Some("Add participants should succeed"))?;
            } else {
                assert::status_in(&response, &[200, 404], Some("Add participants should handle request"))?;
            }
            Ok(())
        })
    })
    .await;

    ctx.test("POST /:id/participants - Empty audience_ids should fail", |ctx| {
        Box::pin(async move {
            let (id, _) = target(ctx);
            let response = ctx
                .client
                .post(
                    &format!("{BASE}/{id}/participants"),
                    json!({ "audience_ids": [] }),
                    RequestOptions::new(),
                )
                .await;
            assert::http_error(&response, Some("Empty audience_ids should be rejected"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /:id/participants/list - List participants", |ctx| {
        Box::pin(async move {
            let (id, created) = target(ctx);
            let body = json!({ "page": 1, "page_size": 20, "include_message_stats": true });
            let response = ctx
                .client
                .post(&format!("{BASE}/{id}/participants/list"), body, RequestOptions::new())
                .await;
            if created {
                assert::http_ok(&response, Some("List participants should succeed"))?;
            }
            Ok(())
        })
    })
    .await;
}

async fn operations(ctx: &mut TestContext) {
    ctx.describe("Focus Group - Operations");

    ctx.test("POST /:id/start - Start focus group", |ctx| {
        Box::pin(async move {
            let (id, created) = target(ctx);
            let response = ctx
                .client
                .request(Method::Post, &format!("{BASE}/{id}/start"), long(ctx))
                .await;
            // starting without participants is rejected
            if created {
                assert::status_in(&response, &[200, 400, 422], Some("Start should handle request"))?;
            }
            Ok(())
        })
    })
    .await;

    ctx.test("POST /:id/check-questions-ready - Check questions ready", |ctx| {
        Box::pin(async move {
            let (id, created) = target(ctx);
            let response = ctx
                .client
                .request(
                    Method::Post,
                    &format!("{BASE}/{id}/check-questions-ready"),
                    RequestOptions::new(),
                )
                .await;
            if created {
                assert::http_ok(&response, Some("Check questions ready should succeed"))?;
            }
            Ok(())
        })
    })
    .await;

    ctx.test("POST /:id/next-decision - Get next decision", |ctx| {
        Box::pin(async move {
            let (id, _) = target(ctx);
            let response = ctx
                .client
                .request(Method::Post, &format!("{BASE}/{id}/next-decision"), long(ctx))
                .await;
            assert::status_in(
                &response,
                &[200, 400, 404, 422],
                Some("Next decision should handle request"),
            )?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /:id/host-message - Send host message", |ctx| {
        Box::pin(async move {
            let (id, _) = target(ctx);
            let body = json!({
                "host_prompt": "大家好，请分享一下你们日常的护肤习惯？",
                "message_type": "question",
            });
            let response = ctx
                .client
                .post(&format!("{BASE}/{id}/host-message"), body, long(ctx))
                .await;
            assert::status_in(
                &response,
                &[200, 400, 404, 422],
                Some("Host message should handle request"),
            )?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /:id/host-message - Missing host_prompt should fail", |ctx| {
        Box::pin(async move {
            let (id, _) = target(ctx);
            let response = ctx
                .client
                .post(
                    &format!("{BASE}/{id}/host-message"),
                    json!({ "message_type": "question" }),
                    RequestOptions::new(),
                )
                .await;
            assert::http_error(&response, Some("Missing host_prompt should be rejected"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /:id/participant-response - Generate single participant response", |ctx| {
        Box::pin(async move {
            let (id, _) = target(ctx);
            let body = json!({
                "participant_id": 456,
                "host_message": "请分享你的护肤习惯",
                "account_id": ctx.config.test_account_id,
            });
            let response = ctx
                .client
                .post(&format!("{BASE}/{id}/participant-response"), body, long(ctx))
                .await;
            assert::status_in(
                &response,
                &[200, 400, 404, 422],
                Some("Single participant response should handle request"),
            )?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /:id/participant-response - Missing participant_id should fail", |ctx| {
        Box::pin(async move {
            let (id, _) = target(ctx);
            let body = json!({
                "host_message": "请分享你的护肤习惯",
                "account_id": ctx.config.test_account_id,
            });
            let response = ctx
                .client
                .post(&format!("{BASE}/{id}/participant-response"), body, RequestOptions::new())
                .await;
            assert::http_error(&response, Some("Missing participant_id should be rejected"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /:id/messages - Get messages", |ctx| {
        Box::pin(async move {
            let (id, created) = target(ctx);
            let response = ctx
                .client
                .post(
                    &format!("{BASE}/{id}/messages"),
                    json!({ "page": 1, "page_size": 50 }),
                    RequestOptions::new(),
                )
                .await;
            if created {
                assert::http_ok(&response, Some("Get messages should succeed"))?;
            }
            Ok(())
        })
    })
    .await;
}

async fn batch_operations(ctx: &mut TestContext) {
    ctx.describe("Focus Group - Batch Operations");

    ctx.test("POST /:id/batch-generate-prompts - Batch generate prompts", |ctx| {
        Box::pin(async move {
            let (id, _) = target(ctx);
            let response = ctx
                .client
                .post(
                    &format!("{BASE}/{id}/batch-generate-prompts"),
                    json!({ "participant_ids": [1, 2, 3] }),
                    long(ctx),
                )
                .await;
            assert::status_in(
                &response,
                &[200, 400, 404, 422],
                Some("Batch generate prompts should handle request"),
            )?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /:id/batch-participant-response - Batch responses", |ctx| {
        Box::pin(async move {
            let (id, _) = target(ctx);
            let body = json!({
                "participant_ids": [1, 2, 3],
                "host_message": "请分享你的护肤习惯",
                "account_id": ctx.config.test_account_id,
            });
            let response = ctx
                .client
                .post(&format!("{BASE}/{id}/batch-participant-response"), body, very_long(ctx))
                .await;
            assert::status_in(
                &response,
                &[200, 400, 404, 422],
                Some("Batch response should handle request"),
            )?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /:id/active-batch-task - Get active batch task", |ctx| {
        Box::pin(async move {
            let (id, _) = target(ctx);
            let response = ctx
                .client
                .get(&format!("{BASE}/{id}/active-batch-task"), RequestOptions::new())
                .await;
            assert::status_in(&response, &[200, 404], Some("Get active batch task should handle request"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /:id/batch-task/:taskId - Query batch task progress", |ctx| {
        Box::pin(async move {
            let (id, _) = target(ctx);
            let response = ctx
                .client
                .get(&format!("{BASE}/{id}/batch-task/task-uuid-here"), RequestOptions::new())
                .await;
            assert::status_in(
                &response,
                &[200, 404],
                Some("Query batch task progress should handle request"),
            )?;
            Ok(())
        })
    })
    .await;
}

async fn analysis(ctx: &mut TestContext) {
    ctx.describe("Focus Group - Analysis & Summary");

    ctx.test("POST /:id/extract-insights - Extract insights", |ctx| {
        Box::pin(async move {
            let (id, _) = target(ctx);
            let response = ctx
                .client
                .post(&format!("{BASE}/{id}/extract-insights"), json!({}), very_long(ctx))
                .await;
            assert::status_in(
                &response,
                &[200, 400, 404, 422],
                Some("Extract insights should handle request"),
            )?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /:id/insights - Get insights", |ctx| {
        Box::pin(async move {
            let (id, _) = target(ctx);
            let response = ctx
                .client
                .post(
                    &format!("{BASE}/{id}/insights"),
                    json!({ "regenerate": false }),
                    RequestOptions::new(),
                )
                .await;
            assert::status_in(&response, &[200, 404], Some("Get insights should handle request"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /:id/summary - Get summary", |ctx| {
        Box::pin(async move {
            let (id, _) = target(ctx);
            let path = format!("{BASE}/{id}/summary?regenerate=false&report_type=comprehensive");
            let response = ctx.client.get(&path, RequestOptions::new()).await;
            assert::status_in(&response, &[200, 404], Some("Get summary should handle request"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /:id/end - End focus group", |ctx| {
        Box::pin(async move {
            let (id, created) = target(ctx);
            let response = ctx
                .client
                .request(Method::Post, &format!("{BASE}/{id}/end"), long(ctx))
                .await;
            if created {
                assert::http_ok(&response, Some("End focus group should succeed"))?;
            }
            Ok(())
        })
    })
    .await;
}

async fn update(ctx: &mut TestContext) {
    ctx.describe("Focus Group - Update");

    ctx.test("PATCH /:id - Update focus group", |ctx| {
        Box::pin(async move {
            let (id, created) = target(ctx);
            let response = ctx
                .client
                .patch(&format!("{BASE}/{id}"), json!({ "title": "更新后的标题" }), RequestOptions::new())
                .await;
            if created {
                assert::http_ok(&response, Some("Update focus group should succeed"))?;
            }
            Ok(())
        })
    })
    .await;

    ctx.test("PATCH /:id - Invalid status should fail", |ctx| {
        Box::pin(async move {
            let (id, _) = target(ctx);
            let response = ctx
                .client
                .patch(
                    &format!("{BASE}/{id}"),
                    json!({ "status": "invalid_status" }),
                    RequestOptions::new(),
                )
                .await;
            assert::http_error(&response, Some("Invalid status should be rejected"))?;
            Ok(())
        })
    })
    .await;
}
