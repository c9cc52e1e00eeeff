//! Chat sessions, messages and interview question generation under `/api/chat`.

use serde_json::json;

use crate::errors::Result;
use crate::harness::assert;
use crate::harness::{TestContext, TestFuture};
use crate::http::RequestOptions;

use super::long;

const CHAT: &str = "/api/chat";
const SESSION_KEY: &str = "chatSessionId";
const PLACEHOLDER_SESSION: &str = "123";

pub fn run(ctx: &mut TestContext) -> TestFuture<'_> {
    Box::pin(run_suites(ctx))
}

async fn run_suites(ctx: &mut TestContext) -> Result<()> {
    sessions(ctx).await;
    messages(ctx).await;
    session_end(ctx).await;
    interview_questions(ctx).await;
    Ok(())
}

/// Session created earlier in this run, else a placeholder the API answers with 404.
fn session(ctx: &TestContext) -> (String, bool) {
    match ctx.chain.get_path_segment(SESSION_KEY) {
        Some(id) => (id, true),
        None => (PLACEHOLDER_SESSION.to_string(), false),
    }
}

async fn sessions(ctx: &mut TestContext) {
    ctx.describe("Chat API - Session Management");

    ctx.test("POST /sessions/batch - Batch create chat sessions", |ctx| {
        Box::pin(async move {
            // Arrange
            let body = json!({
                "audience_ids": [1, 2, 3],
                "account_id": ctx.config.test_account_id,
                "topic": "护肤品使用体验",
                "engine": "S",
            });

            // Act
            let response = ctx
                .client
                .post(&format!("{CHAT}/sessions/batch"), body, long(ctx))
                .await;

            // Assert
            assert::status_in(
                &response,
                &[200, 202, 400, 404, 422],
                Some("Batch create sessions should handle request"),
            )?;
            if response.ok() {
                if let Some(id) = response.json().pointer("/session_ids/0").filter(|v| !v.is_null()) {
                    ctx.chain.set(SESSION_KEY, id, "chat/sessions/batch");
                }
            }
            Ok(())
        })
    })
    .await;

    ctx.test("POST /sessions/batch - Missing account_id should fail", |ctx| {
        Box::pin(async move {
            let body = json!({ "audience_ids": [1, 2, 3], "topic": "Test Topic" });
            let response = ctx
                .client
                .post(&format!("{CHAT}/sessions/batch"), body, RequestOptions::new())
                .await;
            assert::http_error(&response, Some("Missing account_id should be rejected"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /sessions/batch - Empty audience_ids should fail", |ctx| {
        Box::pin(async move {
            let body = json!({
                "audience_ids": [],
                "account_id": ctx.config.test_account_id,
                "topic": "Test Topic",
            });
            let response = ctx
                .client
                .post(&format!("{CHAT}/sessions/batch"), body, RequestOptions::new())
                .await;
            assert::http_error(&response, Some("Empty audience_ids should be rejected"))?;
            Ok(())
        })
    })
    .await;
}

async fn messages(ctx: &mut TestContext) {
    ctx.describe("Chat API - Messages");

    ctx.test("POST /sessions/:id/messages - Send chat message", |ctx| {
        Box::pin(async move {
            let (id, created) = session(ctx);
            let body = json!({
                "content": "你好，请介绍一下你自己",
                "message_type": "text",
                "account_id": ctx.config.test_account_id,
                "engine": "S",
            });

            let response = ctx
                .client
                .post(&format!("{CHAT}/sessions/{id}/messages"), body, long(ctx))
                .await;

            if created {
                assert::http_ok(&response, Some("Send message should succeed"))?;
            } else {
                assert::status_in(&response, &[200, 404], Some("Send message should handle request"))?;
            }
            Ok(())
        })
    })
    .await;

    for (name, content, reason) in [
        (
            "POST /sessions/:id/messages - Missing content should fail",
            None,
            "Missing content should be rejected",
        ),
        (
            "POST /sessions/:id/messages - Empty content should fail",
            Some(""),
            "Empty content should be rejected",
        ),
    ] {
        ctx.test(name, move |ctx| {
            Box::pin(async move {
                let (id, _) = session(ctx);
                let mut body = json!({
                    "message_type": "text",
                    "account_id": ctx.config.test_account_id,
                });
                if let Some(content) = content {
                    body["content"] = json!(content);
                }
                let response = ctx
                    .client
                    .post(&format!("{CHAT}/sessions/{id}/messages"), body, RequestOptions::new())
                    .await;
                assert::http_error(&response, Some(reason))?;
                Ok(())
            })
        })
        .await;
    }
}

async fn session_end(ctx: &mut TestContext) {
    ctx.describe("Chat API - Session End");

    ctx.test("POST /sessions/:id/end - End chat session", |ctx| {
        Box::pin(async move {
            let (id, created) = session(ctx);
            let body = json!({
                "account_id": ctx.config.test_account_id,
                "audience_id": "user_12345",
                "generate_summary": true,
            });

            let response = ctx
                .client
                .post(&format!("{CHAT}/sessions/{id}/end"), body, long(ctx))
                .await;

            if created {
                assert::http_ok(&response, Some("End session should succeed"))?;
            } else {
                assert::status_in(&response, &[200, 404], Some("End session should handle request"))?;
            }
            Ok(())
        })
    })
    .await;

    ctx.test("POST /sessions/:id/end - Missing account_id should fail", |ctx| {
        Box::pin(async move {
            let (id, _) = session(ctx);
            let response = ctx
                .client
                .post(
                    &format!("{CHAT}/sessions/{id}/end"),
                    json!({ "audience_id": "user_12345" }),
                    RequestOptions::new(),
                )
                .await;
            assert::http_error(&response, Some("Missing account_id should be rejected"))?;
            Ok(())
        })
    })
    .await;
}

async fn interview_questions(ctx: &mut TestContext) {
    ctx.describe("Chat API - Interview Questions");

    ctx.test("POST /interview-questions/by-participant - Generate by participant", |ctx| {
        Box::pin(async move {
            let body = json!({
                "participant_id": 456,
                "topic": "护肤品购买决策",
                "background": "年轻女性护肤市场研究",
                "force_regenerate": false,
                "provider": "anthropic",
            });
            let response = ctx
                .client
                .post(&format!("{CHAT}/interview-questions/by-participant"), body, long(ctx))
                .await;
            assert::status_in(
                &response,
                &[200, 400, 404, 422],
                Some("Generate by participant should handle request"),
            )?;
            Ok(())
        })
    })
    .await;

    ctx.test(
        "POST /interview-questions/by-participant - Missing participant_id should fail",
        |ctx| {
            Box::pin(async move {
                let body = json!({ "topic": "护肤品购买决策", "background": "年轻女性护肤市场研究" });
                let response = ctx
                    .client
                    .post(
                        &format!("{CHAT}/interview-questions/by-participant"),
                        body,
                        RequestOptions::new(),
                    )
                    .await;
                assert::http_error(&response, Some("Missing participant_id should be rejected"))?;
                Ok(())
            })
        },
    )
    .await;

    ctx.test("POST /interview-questions - Generate interview questions", |ctx| {
        Box::pin(async move {
            let body = json!({
                "session_id": "session-uuid",
                "audience_id": "user_12345",
                "account_id": ctx.config.test_account_id,
                "topic": "护肤品购买决策",
                "background": "年轻女性护肤市场研究",
                "force_regenerate": false,
                "provider": "anthropic",
            });
            let response = ctx
                .client
                .post(&format!("{CHAT}/interview-questions"), body, long(ctx))
                .await;
            assert::status_in(
                &response,
                &[200, 400, 404, 422],
                Some("Generate interview questions should handle request"),
            )?;
            Ok(())
        })
    })
    .await;

    ctx.test("POST /interview-questions - Missing account_id should fail", |ctx| {
        Box::pin(async move {
            let body = json!({
                "session_id": "session-uuid",
                "audience_id": "user_12345",
                "topic": "护肤品购买决策",
            });
            let response = ctx
                .client
                .post(&format!("{CHAT}/interview-questions"), body, RequestOptions::new())
                .await;
            assert::http_error(&response, Some("Missing account_id should be rejected"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /sessions/:id/interview-questions - Get interview questions", |ctx| {
        Box::pin(async move {
            let path = format!(
                "{CHAT}/sessions/{PLACEHOLDER_SESSION}/interview-questions?audience_id=user_12345&account_id={}",
                ctx.config.test_account_id
            );
            let response = ctx.client.get(&path, RequestOptions::new()).await;
            assert::status_in(&response, &[200, 404], Some("Get interview questions should handle request"))?;
            Ok(())
        })
    })
    .await;
}
