//! Content generation history, updates, Reddit comments and survey articles.

use serde_json::json;

use crate::errors::Result;
use crate::harness::assert;
use crate::harness::{TestContext, TestFuture};
use crate::http::RequestOptions;

use super::{long, very_long};

const REDDIT: &str = "/api/generate-reddit-comment";
const UPDATE: &str = "/api/content-generation/update";

pub fn run(ctx: &mut TestContext) -> TestFuture<'_> {
    Box::pin(run_suites(ctx))
}

async fn run_suites(ctx: &mut TestContext) -> Result<()> {
    history_and_stats(ctx).await;
    update(ctx).await;
    reddit_comment(ctx).await;
    survey_article(ctx).await;
    Ok(())
}

async fn history_and_stats(ctx: &mut TestContext) {
    ctx.describe("Content Generation - History & Stats");

    ctx.test("GET /api/content-generation/history/:account_id - Get history", |ctx| {
        Box::pin(async move {
            let path = format!(
                "/api/content-generation/history/{}?page=1&page_size=20",
                ctx.config.test_account_id
            );
            let response = ctx.client.get(&path, RequestOptions::new()).await;
            assert::http_ok(&response, Some("Get content history should succeed"))?;
            Ok(())
        })
    })
    .await;

    ctx.test(
        "GET /api/content-generation/history/:account_id - Invalid account should handle",
        |ctx| {
            Box::pin(async move {
                let response = ctx
                    .client
                    .get("/api/content-generation/history/999999?page=1&page_size=20", RequestOptions::new())
                    .await;
                assert::status_in(&response, &[200, 404], Some("Invalid account should be handled"))?;
                Ok(())
            })
        },
    )
    .await;

    ctx.test("GET /api/content-generation/statistics/:account_id - Get statistics", |ctx| {
        Box::pin(async move {
            let path = format!("/api/content-generation/statistics/{}", ctx.config.test_account_id);
            let response = ctx.client.get(&path, RequestOptions::new()).await;
            assert::http_ok(&response, Some("Get content statistics should succeed"))?;
            Ok(())
        })
    })
    .await;
}

async fn update(ctx: &mut TestContext) {
    ctx.describe("Content Generation - Update");

    ctx.test("PUT /api/content-generation/update - Update content", |ctx| {
        Box::pin(async move {
            let body = json!({
                "content_id": 123,
                "account_id": ctx.config.test_account_id,
                "updates": { "title": "更新后的标题", "status": "published" },
            });
            let response = ctx.client.put(UPDATE, body, RequestOptions::new()).await;
            assert::status_in(&response, &[200, 404, 422], Some("Update content should handle request"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("PUT /api/content-generation/update - Missing content_id should fail", |ctx| {
        Box::pin(async move {
            let body = json!({
                "account_id": ctx.config.test_account_id,
                "updates": { "title": "Test" },
            });
            let response = ctx.client.put(UPDATE, body, RequestOptions::new()).await;
            assert::http_error(&response, Some("Missing content_id should be rejected"))?;
            Ok(())
        })
    })
    .await;
}

async fn reddit_comment(ctx: &mut TestContext) {
    ctx.describe("Content Generation - Reddit Comment");

    ctx.test("POST /api/generate-reddit-comment - Generate Reddit comment", |ctx| {
        Box::pin(async move {
            // Arrange
            let body = json!({
                "audience_id": 12345,
                "account_id": ctx.config.test_account_id,
                "post_context": {
                    "title": "推荐一款好用的护肤品",
                    "subreddit": "skincare",
                    "content": "最近皮肤状态不太好，求推荐适合敏感肌的护肤品",
                },
                "comment_style": "helpful",
            });

            // Act
            let response = ctx.client.post(REDDIT, body, long(ctx)).await;

            // Assert
            assert::status_in(
                &response,
                &[200, 400, 404, 422],
                Some("Generate Reddit comment should handle request"),
            )?;
            Ok(())
        })
    })
    .await;

    let account = ctx.config.test_account_id;
    let rejected = [
        (
            "POST /api/generate-reddit-comment - Missing audience_id should fail",
            json!({
                "account_id": account,
                "post_context": { "title": "Test", "content": "Test content" },
            }),
            "Missing audience_id should be rejected",
        ),
        (
            "POST /api/generate-reddit-comment - Missing post_context should fail",
            json!({ "audience_id": 12345, "account_id": account }),
            "Missing post_context should be rejected",
        ),
        (
            "POST /api/generate-reddit-comment - Empty post content should fail",
            json!({
                "audience_id": 12345,
                "account_id": account,
                "post_context": { "title": "", "content": "" },
            }),
            "Empty post content should be rejected",
        ),
    ];
    for (name, body, reason) in rejected {
        ctx.test(name, move |ctx| {
            Box::pin(async move {
                let response = ctx.client.post(REDDIT, body, RequestOptions::new()).await;
                assert::http_error(&response, Some(reason))?;
                Ok(())
            })
        })
        .await;
    }
}

async fn survey_article(ctx: &mut TestContext) {
    ctx.describe("Content Generation - Survey Article");

    ctx.test("POST /api/survey/:id/generate-article - Generate article from survey", |ctx| {
        Box::pin(async move {
            let body = json!({
                "account_id": ctx.config.test_account_id,
                "article_type": "summary",
                "language": "Chinese",
            });
            let response = ctx
                .client
                .post("/api/survey/123/generate-article", body, very_long(ctx))
                .await;
            assert::status_in(&response, &[200, 404, 422], Some("Generate article should handle request"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /api/survey/:id/generate-article - Missing account_id should fail", |ctx| {
        Box::pin(async move {
            let response = ctx
                .client
                .post(
                    "/api/survey/123/generate-article",
                    json!({ "article_type": "summary" }),
                    RequestOptions::new(),
                )
                .await;
            assert::http_error(&response, Some("Missing account_id should be rejected"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /api/survey/:id/generate-article - Invalid survey should return 404", |ctx| {
        Box::pin(async move {
            let body = json!({
                "account_id": ctx.config.test_account_id,
                "article_type": "summary",
            });
            let response = ctx
                .client
                .post("/api/survey/999999/generate-article", body, long(ctx))
                .await;
            assert::status_in(&response, &[404, 422], Some("Invalid survey should return 404 or 422"))?;
            Ok(())
        })
    })
    .await;
}
