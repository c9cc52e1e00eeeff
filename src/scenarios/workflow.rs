//! Chained pipelines: each step consumes ids produced by the one before it.
//!
//! Login -> task create -> intent -> personas -> query -> resume analysis, then the
//! focus group and vector search pipelines.

use chrono::Utc;
use serde_json::{json, Value};

use crate::errors::{Result, SuiteError};
use crate::harness::assert;
use crate::harness::{TestContext, TestFuture};
use crate::http::{Method, RequestOptions};

use super::{account_id, long, short, very_long};

const TASKS: &str = "/api/v1/audience-generate/task";

pub fn run(ctx: &mut TestContext) -> TestFuture<'_> {
    Box::pin(run_suites(ctx))
}

async fn run_suites(ctx: &mut TestContext) -> Result<()> {
    authentication(ctx).await;
    audience_pipeline(ctx).await;
    focus_group_pipeline(ctx).await;
    vector_pipeline(ctx).await;

    if ctx.config.verbose {
        ctx.chain.print_state();
    }
    Ok(())
}

async fn authentication(ctx: &mut TestContext) {
    ctx.describe("Workflow - Authentication");

    ctx.test("Login and get account_id", |ctx| {
        Box::pin(async move {
            let Some(creds) = ctx.config.credentials.clone() else {
                // fall back to a configured token
                if ctx.client.token().is_some() {
                    let id = ctx.client.account_id();
                    ctx.chain.set("accountId", id, "config");
                    return Ok(());
                }
                return Err(SuiteError::Usage(
                    "No credentials or JWT token configured".into(),
                ));
            };

            let auth = ctx.client.login(&creds.email, &creds.password).await?;

            assert::ok(!auth.token.is_empty(), Some("Should receive JWT token"))?;
            assert::ok(auth.account_id.is_some(), Some("Should receive account_id"))?;

            ctx.chain
                .set("accountId", auth.account_id, "login")
                .set("token", &auth.token, "login");
            Ok(())
        })
    })
    .await;
}

async fn audience_pipeline(ctx: &mut TestContext) {
    ctx.describe("Workflow - Audience Generation Pipeline");

    ctx.test("Step 1: Create task", |ctx| {
        Box::pin(async move {
            // Arrange
            let body = json!({
                "account_id": account_id(ctx),
                "task_name": format!("工作流测试_{}", Utc::now().timestamp_millis()),
                "user_input": ctx.config.test_data.user_input,
            });

            // Act
            let response = ctx.client.post(&format!("{TASKS}/create"), body, long(ctx)).await;

            // Assert
            assert::http_ok(&response, Some("Task creation should succeed"))?;
            assert::has_property(response.json(), "task_id", Some("Response should have task_id"))?;

            let data = response.json();
            ctx.chain
                .set("taskId", &data["task_id"], "task/create")
                .set("taskData", data, "task/create");
            Ok(())
        })
    })
    .await;

    ctx.test("Step 2: Execute intent analysis", |ctx| {
        Box::pin(async move {
            let task_id = ctx.chain.require("taskId")?;
            let body = json!({ "user_input": ctx.config.test_data.user_input });

            let response = ctx
                .client
                .post(&format!("{TASKS}/{task_id}/intent"), body, long(ctx))
                .await;

            assert::http_ok(&response, Some("Intent analysis should succeed"))?;
            if let Some(intent) = response.json().get("intent").filter(|v| !v.is_null()) {
                ctx.chain.set("intentData", intent, "task/intent");
            }
            Ok(())
        })
    })
    .await;

    ctx.test("Step 3: Generate personas", |ctx| {
        Box::pin(async move {
            let task_id = ctx.chain.require("taskId")?;
            let body = json!({ "segment_count": ctx.config.test_data.segment_count });

            let response = ctx
                .client
                .post(&format!("{TASKS}/{task_id}/personas"), body, very_long(ctx))
                .await;

            assert::http_ok(&response, Some("Personas generation should succeed"))?;
            if let Some(personas) = response.json().get("personas").filter(|v| !v.is_null()) {
                ctx.chain.set("personas", personas, "task/personas");
            }
            Ok(())
        })
    })
    .await;

    ctx.test("Step 4: Query task progress", |ctx| {
        Box::pin(async move {
            let task_id = ctx.chain.require("taskId")?;

            let response = ctx
                .client
                .get(&format!("{TASKS}/{task_id}?include_details=true"), RequestOptions::new())
                .await;

            assert::http_ok(&response, Some("Task query should succeed"))?;
            assert::has_property(response.json(), "status", Some("Response should have status"))?;
            ctx.chain.set("taskStatus", &response.json()["status"], "task/query");
            Ok(())
        })
    })
    .await;

    ctx.test("Step 5: Analyze resume state", |ctx| {
        Box::pin(async move {
            let task_id = ctx.chain.require("taskId")?;
            let response = ctx
                .client
                .get(&format!("{TASKS}/{task_id}/analyze-resume"), RequestOptions::new())
                .await;
            assert::http_ok(&response, Some("Analyze resume should succeed"))?;
            Ok(())
        })
    })
    .await;
}

async fn focus_group_pipeline(ctx: &mut TestContext) {
    ctx.describe("Workflow - Focus Group Pipeline");

    ctx.test("Step 1: Create focus group", |ctx| {
        Box::pin(async move {
            let body = json!({
                "account_id": account_id(ctx),
                "title": format!("工作流焦点小组_{}", Utc::now().timestamp_millis()),
                "topic": "了解用户护肤习惯",
                "background": "市场调研背景",
                "research_objectives": ["了解购买动机", "了解使用场景"],
            });

            let response = ctx.client.post("/api/focus-group/create", body, long(ctx)).await;

            assert::http_ok(&response, Some("Focus group creation should succeed"))?;
            assert::has_property(response.json(), "id", Some("Response should have id"))?;
            ctx.chain.set("focusGroupId", &response.json()["id"], "focus-group/create");
            Ok(())
        })
    })
    .await;

    ctx.test("Step 2: List focus groups", |ctx| {
        Box::pin(async move {
            let path = format!(
                "/api/focus-group/list?account_id={}&page=1&page_size=10",
                render_param(&account_id(ctx))
            );
            let response = ctx.client.get(&path, RequestOptions::new()).await;
            assert::http_ok(&response, Some("List focus groups should succeed"))?;
            assert::has_property(response.json(), "focus_groups", Some("Response should have focus_groups"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("Step 3: Get focus group details", |ctx| {
        Box::pin(async move {
            let id = ctx.chain.require("focusGroupId")?;
            let response = ctx
                .client
                .post(
                    &format!("/api/focus-group/{id}/participants/list"),
                    json!({ "page": 1, "page_size": 10 }),
                    RequestOptions::new(),
                )
                .await;
            assert::http_ok(&response, Some("Get focus group details should succeed"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("Step 4: Check questions ready", |ctx| {
        Box::pin(async move {
            let id = ctx.chain.require("focusGroupId")?;
            let response = ctx
                .client
                .request(
                    Method::Post,
                    &format!("/api/focus-group/{id}/check-questions-ready"),
                    RequestOptions::new(),
                )
                .await;
            assert::http_ok(&response, Some("Check questions ready should succeed"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("Step 5: Update focus group", |ctx| {
        Box::pin(async move {
            let id = ctx.chain.require("focusGroupId")?;
            let body = json!({
                "title": format!("工作流焦点小组_已更新_{}", Utc::now().timestamp_millis()),
            });
            let response = ctx
                .client
                .patch(&format!("/api/focus-group/{id}"), body, RequestOptions::new())
                .await;
            assert::http_ok(&response, Some("Update focus group should succeed"))?;
            Ok(())
        })
    })
    .await;
}

async fn vector_pipeline(ctx: &mut TestContext) {
    ctx.describe("Workflow - Vector Search Pipeline");

    ctx.test("Step 1: Check vector health", |ctx| {
        Box::pin(async move {
            let response = ctx.client.get("/api/v1/vector/health", short(ctx)).await;
            assert::http_ok(&response, Some("Vector health should be OK"))?;
            let healthy = response.json().get("status").and_then(Value::as_str) == Some("healthy");
            ctx.chain.set("vectorHealthy", healthy, "vector/health");
            Ok(())
        })
    })
    .await;

    ctx.test("Step 2: Get vector stats", |ctx| {
        Box::pin(async move {
            let response = ctx.client.get("/api/v1/vector/stats", RequestOptions::new()).await;
            assert::http_ok(&response, Some("Vector stats should succeed"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("Step 3: Semantic search", |ctx| {
        Box::pin(async move {
            let body = json!({
                "query": "年轻女性护肤品用户画像",
                "account_id": account_id(ctx),
                "top_k": 5,
            });
            let response = ctx
                .client
                .post("/api/v1/vector/search/semantic", body, long(ctx))
                .await;
            assert::http_ok(&response, Some("Semantic search should succeed"))?;

            let first = response
                .json()
                .pointer("/results/0/audience_id")
                .filter(|v| !v.is_null());
            if let Some(audience_id) = first {
                ctx.chain.set("searchResultAudienceId", audience_id, "vector/semantic");
            }
            Ok(())
        })
    })
    .await;

    // Optional consumer: no audience from step 3 means a skip, not a failure.
    let have_audience = ctx.chain.get("searchResultAudienceId").is_some();
    if !have_audience {
        ctx.skip(
            "Step 4: Similarity search (using previous result)",
            Some("no audience from previous search"),
        );
        return;
    }

    ctx.test("Step 4: Similarity search (using previous result)", |ctx| {
        Box::pin(async move {
            let body = json!({
                "audience_id": ctx.chain.get("searchResultAudienceId"),
                "account_id": account_id(ctx),
                "top_k": 5,
            });
            let response = ctx
                .client
                .post("/api/v1/vector/search/similar", body, long(ctx))
                .await;
            assert::http_ok(&response, Some("Similarity search should succeed"))?;
            Ok(())
        })
    })
    .await;
}

/// Query-string form of a JSON scalar.
fn render_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
