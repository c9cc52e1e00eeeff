use serde_json::json;

use crate::errors::Result;
use crate::harness::assert;
use crate::harness::{TestContext, TestFuture};
use crate::http::RequestOptions;

use super::{long, short};

const BASE: &str = "/api/v1/vector";

pub fn run(ctx: &mut TestContext) -> TestFuture<'_> {
    Box::pin(run_suites(ctx))
}

async fn run_suites(ctx: &mut TestContext) -> Result<()> {
    health_and_stats(ctx).await;
    semantic_search(ctx).await;
    similarity_search(ctx).await;
    multimodal_search(ctx).await;
    index_management(ctx).await;
    Ok(())
}

async fn health_and_stats(ctx: &mut TestContext) {
    ctx.describe("Vector API - Health & Stats");

    ctx.test("GET /api/v1/vector/health - Vector service health", |ctx| {
        Box::pin(async move {
            let response = ctx.client.get(&format!("{BASE}/health"), short(ctx)).await;
            assert::http_ok(&response, Some("Vector health should return 200"))?;
            assert::has_property(response.json(), "status", Some("Response should have status"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /api/v1/vector/stats - Vector statistics", |ctx| {
        Box::pin(async move {
            let response = ctx.client.get(&format!("{BASE}/stats"), RequestOptions::new()).await;
            assert::http_ok(&response, Some("Vector stats should return 200"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /api/v1/vector/stats/account - Account vector stats", |ctx| {
        Box::pin(async move {
            let body = json!({ "account_id": ctx.config.test_account_id });
            let response = ctx
                .client
                .post(&format!("{BASE}/stats/account"), body, RequestOptions::new())
                .await;
            assert::http_ok(&response, Some("Account vector stats should succeed"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /api/v1/vector/stats/account - Missing account_id should fail", |ctx| {
        Box::pin(async move {
            let response = ctx
                .client
                .post(&format!("{BASE}/stats/account"), json!({}), RequestOptions::new())
                .await;
            assert::http_error(&response, Some("Missing account_id should be rejected"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /api/v1/vector/stats/task - Task vector stats", |ctx| {
        Box::pin(async move {
            let response = ctx
                .client
                .post(&format!("{BASE}/stats/task"), json!({ "task_id": 123 }), RequestOptions::new())
                .await;
            assert::status_in(&response, &[200, 404], Some("Task stats should handle request"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /api/v1/vector/stats/distribution - Vector distribution", |ctx| {
        Box::pin(async move {
            let body = json!({ "account_id": ctx.config.test_account_id });
            let response = ctx
                .client
                .post(&format!("{BASE}/stats/distribution"), body, RequestOptions::new())
                .await;
            assert::status_in(&response, &[200, 404], Some("Distribution stats should handle request"))?;
            Ok(())
        })
    })
    .await;
}

async fn semantic_search(ctx: &mut TestContext) {
    ctx.describe("Vector API - Semantic Search");

    ctx.test("POST /search/semantic - Valid semantic search", |ctx| {
        Box::pin(async move {
            // Arrange
            let body = json!({
                "query": "年轻女性护肤品用户",
                "account_id": ctx.config.test_account_id,
                "top_k": 10,
            });

            // Act
            let response = ctx
                .client
                .post(&format!("{BASE}/search/semantic"), body, long(ctx))
                .await;

            // Assert
            assert::http_ok(&response, Some("Semantic search should succeed"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /search/semantic - Empty query should fail", |ctx| {
        Box::pin(async move {
            let body = json!({ "query": "", "account_id": ctx.config.test_account_id });
            let response = ctx
                .client
                .post(&format!("{BASE}/search/semantic"), body, RequestOptions::new())
                .await;
            assert::http_error(&response, Some("Empty query should be rejected"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /search/semantic - Missing account_id should fail", |ctx| {
        Box::pin(async move {
            let response = ctx
                .client
                .post(
                    &format!("{BASE}/search/semantic"),
                    json!({ "query": "测试查询" }),
                    RequestOptions::new(),
                )
                .await;
            assert::http_error(&response, Some("Missing account_id should be rejected"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /search/semantic - With filters", |ctx| {
        Box::pin(async move {
            let body = json!({
                "query": "护肤品用户",
                "account_id": ctx.config.test_account_id,
                "top_k": 5,
                "score_threshold": 0.5,
            });
            let response = ctx
                .client
                .post(&format!("{BASE}/search/semantic"), body, long(ctx))
                .await;
            assert::http_ok(&response, Some("Semantic search with filters should succeed"))?;
            Ok(())
        })
    })
    .await;
}

async fn similarity_search(ctx: &mut TestContext) {
    ctx.describe("Vector API - Similarity Search");

    ctx.test("POST /search/similar - Valid similarity search", |ctx| {
        Box::pin(async move {
            let body = json!({
                "audience_id": 12345,
                "account_id": ctx.config.test_account_id,
                "top_k": 10,
            });
            let response = ctx
                .client
                .post(&format!("{BASE}/search/similar"), body, long(ctx))
                .await;
            // the audience may not exist on the target
            assert::status_in(&response, &[200, 404, 422], Some("Similarity search should handle request"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /search/similar - Missing audience_id should fail", |ctx| {
        Box::pin(async move {
            let body = json!({ "account_id": ctx.config.test_account_id, "top_k": 10 });
            let response = ctx
                .client
                .post(&format!("{BASE}/search/similar"), body, RequestOptions::new())
                .await;
            assert::http_error(&response, Some("Missing audience_id should be rejected"))?;
            Ok(())
        })
    })
    .await;
}

async fn multimodal_search(ctx: &mut TestContext) {
    ctx.describe("Vector API - Multimodal Search");

    ctx.test("POST /search/multimodal - Text-only multimodal search", |ctx| {
        Box::pin(async move {
            let body = json!({
                "text_query": "年轻女性护肤习惯",
                "account_id": ctx.config.test_account_id,
                "top_k": 10,
            });
            let response = ctx
                .client
                .post(&format!("{BASE}/search/multimodal"), body, long(ctx))
                .await;
            assert::http_ok(&response, Some("Multimodal search should succeed"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /search/multimodal - Empty text_query should fail", |ctx| {
        Box::pin(async move {
            let body = json!({ "text_query": "", "account_id": ctx.config.test_account_id });
            let response = ctx
                .client
                .post(&format!("{BASE}/search/multimodal"), body, RequestOptions::new())
                .await;
            assert::http_error(&response, Some("Empty text_query should be rejected"))?;
            Ok(())
        })
    })
    .await;
}

async fn index_management(ctx: &mut TestContext) {
    ctx.describe("Vector API - Index Management");

    ctx.test("POST /reload-index - Reload vector index", |ctx| {
        Box::pin(async move {
            let response = ctx
                .client
                .post(&format!("{BASE}/reload-index"), json!({}), long(ctx))
                .await;
            assert::http_ok(&response, Some("Reload index should succeed"))?;
            Ok(())
        })
    })
    .await;

    ctx.skip("POST /rebuild-index - Rebuild vector index", Some("heavy operation"));
}
