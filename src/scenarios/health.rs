//! Liveness and readiness probes.

use futures::future::join_all;

use crate::errors::Result;
use crate::harness::assert;
use crate::harness::{TestContext, TestFuture};
use crate::http::API_KEY_HEADER;

use super::short;

const FAN_OUT: usize = 5;

pub fn run(ctx: &mut TestContext) -> TestFuture<'_> {
    Box::pin(run_suites(ctx))
}

async fn run_suites(ctx: &mut TestContext) -> Result<()> {
    ctx.describe("Health Check - /inference/health");

    ctx.test("GET /inference/health - Should return healthy status", |ctx| {
        Box::pin(async move {
            let response = ctx.client.get("/inference/health", short(ctx)).await;
            assert::http_ok(&response, Some("Health check should return 200"))?;
            assert::has_property(response.json(), "status", Some("Response should have status field"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /inference/health - Response time should be < 5s", |ctx| {
        Box::pin(async move {
            let response = ctx.client.get("/inference/health", short(ctx)).await;
            assert::response_time(&response, 5000, Some("Health check should respond within 5 seconds"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /inference/health - Should work without auth", |ctx| {
        Box::pin(async move {
            let opts = short(ctx).no_auth().header(API_KEY_HEADER, "");
            let response = ctx.client.get("/inference/health", opts).await;
            assert::ok(response.status() != 401, Some("Health check should not require authentication"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /inference/health - Concurrent requests should all respond", |ctx| {
        Box::pin(async move {
            let opts = short(ctx);
            let client = &ctx.client;
            let responses =
                join_all((0..FAN_OUT).map(|_| client.get("/inference/health", opts.clone()))).await;

            let responded = responses.iter().filter(|r| r.status() > 0).count();
            assert::equal(responded, FAN_OUT, Some("Every concurrent health check should respond"))?;
            Ok(())
        })
    })
    .await;

    ctx.describe("Ready Check - /inference/ready");

    ctx.test("GET /inference/ready - Should return ready status", |ctx| {
        Box::pin(async move {
            let response = ctx.client.get("/inference/ready", short(ctx)).await;
            assert::http_ok(&response, Some("Ready check should return 200"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /inference/ready - Response time should be < 5s", |ctx| {
        Box::pin(async move {
            let response = ctx.client.get("/inference/ready", short(ctx)).await;
            assert::response_time(&response, 5000, Some("Ready check should respond within 5 seconds"))?;
            Ok(())
        })
    })
    .await;

    ctx.describe("Vector Health - /api/v1/vector/health");

    ctx.test("GET /api/v1/vector/health - Should return vector service status", |ctx| {
        Box::pin(async move {
            let response = ctx.client.get("/api/v1/vector/health", short(ctx)).await;
            assert::http_ok(&response, Some("Vector health check should return 200"))?;
            assert::has_property(response.json(), "status", Some("Response should have status field"))?;
            Ok(())
        })
    })
    .await;

    ctx.test("GET /api/v1/vector/health - Should include service details", |ctx| {
        Box::pin(async move {
            let response = ctx.client.get("/api/v1/vector/health", short(ctx)).await;
            if response.ok() && response.json().get("services").is_some() {
                assert::has_property(response.json(), "services", Some("Response should have services field"))?;
            }
            Ok(())
        })
    })
    .await;

    ctx.describe("Avatar Health - /api/avatars/health");

    ctx.test("GET /api/avatars/health - Should return avatar service status", |ctx| {
        Box::pin(async move {
            let response = ctx.client.get("/api/avatars/health", short(ctx)).await;
            // avatar service is flaky; any response counts
            assert::ok(response.status() > 0, Some("Avatar health check should respond"))?;
            Ok(())
        })
    })
    .await;

    Ok(())
}
