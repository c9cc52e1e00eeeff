use chrono::{SecondsFormat, Utc};
use serde_json::json;

use crate::errors::Result;
use crate::harness::{assert, random};
use crate::harness::{TestContext, TestFuture};
use crate::http::RequestOptions;

use super::{first_field, long};

const BASE: &str = "/api/async-survey";
const PLACEHOLDER_ID: &str = "123";
const CHAIN_KEY: &str = "surveyId";

pub fn run(ctx: &mut TestContext) -> TestFuture<'_> {
    Box::pin(run_suites(ctx))
}

fn survey_id(ctx: &TestContext) -> String {
    ctx.chain
        .get_path_segment(CHAIN_KEY)
        .unwrap_or_else(|| PLACEHOLDER_ID.to_string())
}

async fn run_suites(ctx: &mut TestContext) -> Result<()> {
    ctx.describe("Async Survey API - Create & Manage");

    ctx.test("POST /create - Create async survey", |ctx| {
        Box::pin(async move {
            let body = json!({
                "account_id": ctx.config.test_account_id,
                "title": format!("Test Survey {}", random::string(6)),
                "description": "测试问卷描述",
                "questions": [
                    {
                        "type": "single_choice",
                        "text": "您的年龄段是？",
                        "options": ["18-24", "25-34", "35-44"],
                        "required": true,
                    },
                    { "type": "open_ended", "text": "请描述您的护肤习惯", "required": false },
                ],
            });
            let response = ctx
                .client
                .post(&format!("{BASE}/create"), body, RequestOptions::new())
                .await;
            assert::http_ok(&response, Some("Survey creation should succeed"))?;
            if let Some(id) = first_field(response.json(), &["survey_id", "id"]) {
                ctx.chain.set(CHAIN_KEY, id, "async-survey/create");
            }
            Ok(())
        })
    })
    .await;

    ctx.test("POST /create - Missing account_id should fail", |ctx| {
        Box::pin(async move {
            let body = json!({
                "title": "Test",
                "questions": [{ "type": "single_choice", "text": "Q1", "options": ["A", "B"] }],
            });
            let response = ctx
                .client
                .post(&format!("{BASE}/create"), body, RequestOptions::new())
                .await;
            assert::http_error(&response, Some("Missing account_id should be rejected"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /create - Empty questions should fail", |ctx| {
        Box::pin(async move {
            let body = json!({ "account_id": ctx.config.test_account_id, "title": "Test", "questions": [] });
            let response = ctx
                .client
                .post(&format!("{BASE}/create"), body, RequestOptions::new())
                .await;
            assert::http_error(&response, Some("Empty questions should be rejected"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /list - List surveys", |ctx| {
        Box::pin(async move {
            let path = format!(
                "{BASE}/list?account_id={}&page=1&page_size=20",
                ctx.config.test_account_id
            );
            let response = ctx.client.get(&path, RequestOptions::new()).await;
            assert::http_ok(&response, Some("Should list surveys"))?;
            Ok(())
        })
    })
    .await;

    ctx.describe("Async Survey API - Deployment & Collection");

    ctx.test("POST /:id/deploy - Deploy survey", |ctx| {
        Box::pin(async move {
            let id = survey_id(ctx);
            let start = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            let body = json!({ "deployment_config": { "start_time": start } });
            let response = ctx
                .client
                .post(&format!("{BASE}/{id}/deploy"), body, long(ctx))
                .await;
            assert::status_in(&response, &[200, 400, 404], Some("Should handle deployment"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /:id/collect - Collect AI responses", |ctx| {
        Box::pin(async move {
            let id = survey_id(ctx);
            let body = json!({ "audience_ids": [1, 2, 3], "batch_size": 5 });
            let response = ctx
                .client
                .post(&format!("{BASE}/{id}/collect"), body, long(ctx))
                .await;
            assert::status_in(&response, &[200, 202, 400, 404], Some("Should handle response collection"))?;
            Ok(())
        })
    })
    .await;

    ctx.describe("Async Survey API - Analysis");

    ctx.test("POST /:id/analyze - Analyze survey results", |ctx| {
        Box::pin(async move {
            let id = survey_id(ctx);
            let body = json!({ "analysis_type": "comprehensive", "include_segments": true });
            let response = ctx
                .client
                .post(&format!("{BASE}/{id}/analyze"), body, long(ctx))
                .await;
            assert::status_in(&response, &[200, 400, 404], Some("Should handle analysis"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /:id/statistics - Get survey statistics", |ctx| {
        Box::pin(async move {
            let id = survey_id(ctx);
            let response = ctx
                .client
                .get(&format!("{BASE}/{id}/statistics"), RequestOptions::new())
                .await;
            assert::status_in(&response, &[200, 404], Some("Should handle statistics"))?;
            Ok(())
        })
    })
    .await;

    Ok(())
}
