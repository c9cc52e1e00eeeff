use serde_json::json;

use crate::errors::Result;
use crate::harness::{assert, random};
use crate::harness::{TestContext, TestFuture};
use crate::http::RequestOptions;

use super::{first_field, long};

const BASE: &str = "/api/v1/audience-generate";

pub fn run(ctx: &mut TestContext) -> TestFuture<'_> {
    Box::pin(run_suites(ctx))
}

async fn run_suites(ctx: &mut TestContext) -> Result<()> {
    intent_analysis(ctx).await;
    personas(ctx).await;
    task_management(ctx).await;
    segments_and_audiences(ctx).await;
    interview_extraction(ctx).await;
    Ok(())
}

async fn intent_analysis(ctx: &mut TestContext) {
    ctx.describe("Audience Generation - Intent Analysis");

    ctx.test("POST /intent-analysis - Valid input should return intent", |ctx| {
        Box::pin(async move {
            let body = json!({ "user_input": ctx.config.test_data.user_input });
            let response = ctx
                .client
                .post(&format!("{BASE}/intent-analysis"), body, RequestOptions::new())
                .await;
            assert::http_ok(&response, Some("Intent analysis should succeed"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /intent-analysis - Empty input should fail", |ctx| {
        Box::pin(async move {
            let response = ctx
                .client
                .post(&format!("{BASE}/intent-analysis"), json!({ "user_input": "" }), RequestOptions::new())
                .await;
            assert::http_error(&response, Some("Empty input should be rejected"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /intent-analysis - Missing user_input should fail", |ctx| {
        Box::pin(async move {
            let response = ctx
                .client
                .post(&format!("{BASE}/intent-analysis"), json!({}), RequestOptions::new())
                .await;
            assert::http_error(&response, Some("Missing user_input should be rejected"))?;
            Ok(())
        })
    })
    .await;
}

async fn personas(ctx: &mut TestContext) {
    ctx.describe("Audience Generation - Personas");

    ctx.test("POST /personas - Valid input should generate personas", |ctx| {
        Box::pin(async move {
            let body = json!({
                "user_input": ctx.config.test_data.user_input,
                "segment_count": ctx.config.test_data.segment_count,
            });
            let response = ctx.client.post(&format!("{BASE}/personas"), body, long(ctx)).await;
            assert::http_ok(&response, Some("Persona generation should succeed"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /personas - segment_count=0 should fail", |ctx| {
        Box::pin(async move {
            let body = json!({
                "user_input": ctx.config.test_data.user_input,
                "segment_count": 0,
            });
            let response = ctx
                .client
                .post(&format!("{BASE}/personas"), body, RequestOptions::new())
                .await;
            assert::http_error(&response, Some("Zero segment_count should be rejected"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /personas - Negative segment_count should fail", |ctx| {
        Box::pin(async move {
            let body = json!({
                "user_input": ctx.config.test_data.user_input,
                "segment_count": -1,
            });
            let response = ctx
                .client
                .post(&format!("{BASE}/personas"), body, RequestOptions::new())
                .await;
            assert::http_error(&response, Some("Negative segment_count should be rejected"))?;
            Ok(())
        })
    })
    .await;
}

async fn task_management(ctx: &mut TestContext) {
    ctx.describe("Audience Generation - Task Management");

    ctx.test("POST /task/create - Create new task", |ctx| {
        Box::pin(async move {
            let body = json!({
                "account_id": ctx.config.test_account_id,
                "task_name": format!("Test Task {}", random::string(8)),
                "user_input": ctx.config.test_data.user_input,
            });
            let response = ctx
                .client
                .post(&format!("{BASE}/task/create"), body, RequestOptions::new())
                .await;
            assert::http_ok(&response, Some("Task creation should succeed"))?;
            if let Some(id) = first_field(response.json(), &["task_id", "id"]) {
                ctx.chain.set("audienceTaskId", id, "audience/task/create");
            }
            Ok(())
        })
    })
    .await;

    ctx.test("POST /task/create - Missing account_id should fail", |ctx| {
        Box::pin(async move {
            let body = json!({
                "task_name": "Test Task",
                "user_input": ctx.config.test_data.user_input,
            });
            let response = ctx
                .client
                .post(&format!("{BASE}/task/create"), body, RequestOptions::new())
                .await;
            assert::http_error(&response, Some("Missing account_id should be rejected"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /task/:id - Non-existent task should return 404", |ctx| {
        Box::pin(async move {
            let response = ctx
                .client
                .get(&format!("{BASE}/task/999999999"), RequestOptions::new())
                .await;
            assert::http_status(&response, 404, Some("Non-existent task should return 404"))?;
            Ok(())
        })
    })
    .await;
}

async fn segments_and_audiences(ctx: &mut TestContext) {
    ctx.describe("Audience Generation - Segments & Audiences");

    ctx.test("POST /segment/rename - Rename segment", |ctx| {
        Box::pin(async move {
            let body = json!({
                "segment_id": 1327,
                "generate_language": "Chinese",
                "async_mode": false,
                "update_db": false,
            });
            let response = ctx
                .client
                .post(&format!("{BASE}/segment/rename"), body, long(ctx))
                .await;
            assert::status_in(&response, &[200, 404], Some("Should handle segment rename"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /audience/insight - Get audience insight", |ctx| {
        Box::pin(async move {
            let body = json!({ "audience_id": 12345, "insight_type": "comprehensive" });
            let response = ctx
                .client
                .post(&format!("{BASE}/audience/insight"), body, long(ctx))
                .await;
            assert::status_in(&response, &[200, 404], Some("Should handle insight request"))?;
            Ok(())
        })
    })
    .await;
}

async fn interview_extraction(ctx: &mut TestContext) {
    ctx.describe("Audience Generation - Interview Extraction");

    ctx.test("POST /interview/extract - Extract from interview", |ctx| {
        Box::pin(async move {
            let data = &ctx.config.test_data;
            let body = json!({
                "interview_transcript": data.interview_transcript,
                "account_id": ctx.config.test_account_id,
                "product_info": { "category": "护肤品", "name": data.product_name },
            });
            let response = ctx
                .client
                .post(&format!("{BASE}/interview/extract"), body, long(ctx))
                .await;
            assert::status_in(&response, &[200, 400], Some("Should handle interview extraction"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /interview/extractions - List extractions", |ctx| {
        Box::pin(async move {
            let path = format!(
                "{BASE}/interview/extractions?account_id={}&page=1&page_size=20",
                ctx.config.test_account_id
            );
            let response = ctx.client.get(&path, RequestOptions::new()).await;
            assert::http_ok(&response, Some("Should list extractions"))?;
            Ok(())
        })
    })
    .await;
}
