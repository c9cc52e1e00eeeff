//! Feature-area test modules run against the remote API.

pub mod async_survey;
pub mod audience;
pub mod audience_generate;
pub mod avatar;
pub mod chat;
pub mod content;
pub mod content_generation;
pub mod focus_group;
pub mod health;
pub mod survey;
pub mod tasks;
pub mod vector;
pub mod workflow;

use serde_json::Value;

use crate::errors::Result;
use crate::harness::TestContext;
use crate::http::RequestOptions;
use crate::runner::{Registry, Tag, TestModule};

/// Default module registry, in execution order.
pub fn registry() -> Result<Registry> {
    let mut r = Registry::new();
    r.register(TestModule::new("health", "Health Check", health::run).tag(Tag::Smoke))?
        .register(TestModule::new("audience", "Audience Generation", audience::run))?
        .register(TestModule::new("focus-group", "Focus Group", focus_group::run))?
        .register(TestModule::new("vector", "Vector Search", vector::run).tag(Tag::Smoke))?
        .register(TestModule::new("content", "Content Generation", content::run))?
        .register(TestModule::new("avatar", "Avatar Management", avatar::run))?
        .register(TestModule::new("survey", "Async Survey", survey::run))?
        .register(TestModule::new("chat", "Chat Management", chat::run))?
        .register(TestModule::new("content-generation", "Content Generation V2", content_generation::run))?
        .register(TestModule::new("async-survey", "Async Survey Deployment", async_survey::run))?
        .register(TestModule::new("audience-generate", "Audience Generate", audience_generate::run))?
        .register(TestModule::new("tasks", "Task Management", tasks::run).tag(Tag::Workflow))?
        .register(TestModule::new("workflow", "Workflow", workflow::run).tag(Tag::Workflow))?;
    Ok(r)
}

pub(crate) fn short(ctx: &TestContext) -> RequestOptions {
    RequestOptions::new().timeout(ctx.config.timeouts.short())
}

pub(crate) fn long(ctx: &TestContext) -> RequestOptions {
    RequestOptions::new().timeout(ctx.config.timeouts.long())
}

pub(crate) fn very_long(ctx: &TestContext) -> RequestOptions {
    RequestOptions::new().timeout(ctx.config.timeouts.very_long())
}

/// First non-null field among `keys`, e.g. `task_id` falling back to `id`.
pub(crate) fn first_field(data: &Value, keys: &[&str]) -> Option<Value> {
    keys.iter()
        .filter_map(|k| data.get(*k))
        .find(|v| !v.is_null())
        .cloned()
}

/// Account id for request bodies: the chain (set by login) wins over config.
pub(crate) fn account_id(ctx: &TestContext) -> Value {
    ctx.chain
        .get("accountId")
        .cloned()
        .unwrap_or_else(|| Value::from(ctx.client.account_id()))
}
