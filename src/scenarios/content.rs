use serde_json::json;

use crate::errors::Result;
use crate::harness::{assert, random};
use crate::harness::{TestContext, TestFuture};
use crate::http::RequestOptions;

use super::long;

pub fn run(ctx: &mut TestContext) -> TestFuture<'_> {
    Box::pin(run_suites(ctx))
}

async fn run_suites(ctx: &mut TestContext) -> Result<()> {
    ctx.describe("Content Generation API - Article Generation");

    ctx.test("POST /survey/:id/generate-article - Generate blog article", |ctx| {
        Box::pin(async move {
            let body = json!({
                "batch_id": random::uuid(),
                "account_id": ctx.config.test_account_id,
                "content_type": "blog",
                "product_name": ctx.config.test_data.product_name,
                "key_insights": ["洞察1: 用户偏好天然成分", "洞察2: 价格敏感度高"],
            });
            let response = ctx
                .client
                .post("/api/survey/123/generate-article", body, long(ctx))
                .await;
            assert::status_in(&response, &[200, 400, 404], Some("Should handle article generation"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /survey/:id/generate-article - Empty insights should fail", |ctx| {
        Box::pin(async move {
            let body = json!({
                "batch_id": random::uuid(),
                "account_id": ctx.config.test_account_id,
                "content_type": "blog",
                "key_insights": [],
            });
            let response = ctx
                .client
                .post("/api/survey/123/generate-article", body, RequestOptions::new())
                .await;
            assert::http_error(&response, Some("Empty insights should be rejected"))?;
            Ok(())
        })
    })
    .await;

    ctx.describe("Content Generation API - History & Stats");

    ctx.test("GET /content-generation/history/:accountId - Get generation history", |ctx| {
        Box::pin(async move {
            let path = format!(
                "/api/content-generation/history/{}?page=1&page_size=20",
                ctx.config.test_account_id
            );
            let response = ctx.client.get(&path, RequestOptions::new()).await;
            assert::http_ok(&response, Some("Should return generation history"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /content-generation/statistics/:accountId - Get statistics", |ctx| {
        Box::pin(async move {
            let path = format!("/api/content-generation/statistics/{}", ctx.config.test_account_id);
            let response = ctx.client.get(&path, RequestOptions::new()).await;
            assert::http_ok(&response, Some("Should return generation statistics"))?;
            Ok(())
        })
    })
    .await;

    ctx.describe("Content Generation API - Reddit Comment");

    ctx.test("POST /generate-reddit-comment - Generate Reddit comment", |ctx| {
        Box::pin(async move {
            let body = json!({
                "platform": "reddit",
                "url": "https://reddit.com/r/SkincareAddiction/example",
                "post": { "title": "求推荐适合敏感肌的护肤品", "content": "最近换季皮肤很敏感..." },
                "account_id": ctx.config.test_account_id,
                "product_name": ctx.config.test_data.product_name,
                "tone": "friendly",
            });
            let response = ctx
                .client
                .post("/api/generate-reddit-comment", body, long(ctx))
                .await;
            assert::status_in(&response, &[200, 400], Some("Should handle Reddit comment generation"))?;
            Ok(())
        })
    })
    .await;

    Ok(())
}
