//! Test-execution harness: suite labels, test cases, skips and their bookkeeping.
//!
//! All run state lives in one [`TestContext`] that is passed by `&mut` into every
//! suite and test body, so two contexts never share counters or chain values.

pub mod assert;
pub mod random;
pub mod results;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use colored::Colorize;
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::debug;

use crate::chain::TestChain;
use crate::config::Config;
use crate::errors::Result;
use crate::http::ApiClient;

pub use results::{ResultsAccumulator, TestOutcome, TestStatus};

/// Async test body borrowing the context for the duration of the test.
pub type TestFuture<'a> = BoxFuture<'a, Result<()>>;

pub struct TestContext {
    pub config: Config,
    pub client: ApiClient,
    pub chain: TestChain,
    pub results: ResultsAccumulator,
    suite: String,
}

impl TestContext {
    pub fn new(config: Config) -> Self {
        let client = ApiClient::new(&config);
        Self {
            config,
            client,
            chain: TestChain::new(),
            results: ResultsAccumulator::new(),
            suite: String::new(),
        }
    }

    pub fn suite(&self) -> &str {
        &self.suite
    }

    /// Start a new suite. Suites are flat; the latest label wins.
    pub fn describe(&mut self, name: &str) {
        self.suite = name.to_string();
        println!("\n{}", format!("▸ {name}").blue());
    }

    /// Run one test case to completion and record its outcome.
    ///
    /// Any `Err` from the body, assertion or otherwise, marks the test failed. A panic
    /// inside the body is caught and classified the same way.
    pub async fn test<F>(&mut self, name: &str, body: F) -> TestStatus
    where
        F: for<'a> FnOnce(&'a mut TestContext) -> TestFuture<'a>,
    {
        let started = Instant::now();
        let result = AssertUnwindSafe(body(self)).catch_unwind().await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let error = match result {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(panic) => Some(panic_message(panic)),
        };

        let status = match &error {
            None => {
                println!(
                    "{} {} {}",
                    "✓".green(),
                    name,
                    format!("({duration_ms}ms)").bright_black()
                );
                TestStatus::Passed
            }
            Some(msg) => {
                println!("{} {}", "✗".red(), name);
                println!("  {}", format!("Error: {msg}").red());
                TestStatus::Failed
            }
        };
        debug!(suite = %self.suite, test = name, ?status, duration_ms, "test finished");

        self.results.record(TestOutcome {
            suite: self.suite.clone(),
            name: name.to_string(),
            status,
            duration_ms,
            error,
            reason: None,
        });
        status
    }

    /// Record a skipped test without running anything.
    pub fn skip(&mut self, name: &str, reason: Option<&str>) {
        let note = match reason {
            Some(r) if !r.is_empty() => format!("(skipped: {r})"),
            _ => "(skipped)".to_string(),
        };
        println!("{} {} {}", "○".yellow(), name, note.bright_black());

        self.results.record(TestOutcome {
            suite: self.suite.clone(),
            name: name.to_string(),
            status: TestStatus::Skipped,
            duration_ms: 0,
            error: None,
            reason: reason.map(str::to_owned),
        });
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "test panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SuiteError;

    fn ctx() -> TestContext {
        TestContext::new(Config::default())
    }

    #[tokio::test]
    async fn test_pass_fail_and_skip_are_recorded_in_order() {
        let mut ctx = ctx();
        ctx.describe("Suite A");

        let s = ctx.test("passes", |_| Box::pin(async { Ok(()) })).await;
        assert_eq!(s, TestStatus::Passed);

        let s = ctx
            .test("fails on assertion", |_| {
                Box::pin(async {
                    assert::equal(1, 2, Some("numbers differ"))?;
                    Ok(())
                })
            })
            .await;
        assert_eq!(s, TestStatus::Failed);

        ctx.describe("Suite B");
        ctx.skip("skipped", Some("not ready"));

        assert_eq!(ctx.results.passed(), 1);
        assert_eq!(ctx.results.failed(), 1);
        assert_eq!(ctx.results.skipped(), 1);

        let log = ctx.results.outcomes();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0].suite, "Suite A");
        assert_eq!(log[1].error.as_deref(), Some("numbers differ"));
        assert_eq!(log[2].suite, "Suite B");
        assert_eq!(log[2].reason.as_deref(), Some("not ready"));
    }

    #[tokio::test]
    async fn test_any_error_counts_as_failure() {
        let mut ctx = ctx();
        ctx.test("usage error", |_| {
            Box::pin(async { Err(SuiteError::Usage("No taskId from previous step".into())) })
        })
        .await;
        assert_eq!(ctx.results.failed(), 1);
        assert_eq!(
            ctx.results.outcomes()[0].error.as_deref(),
            Some("Usage error: No taskId from previous step")
        );
    }

    #[tokio::test]
    #[allow(unreachable_code)]
    async fn test_panic_is_caught_and_recorded() {
        let mut ctx = ctx();
        ctx.test("panics", |_| {
            Box::pin(async {
                panic!("boom");
                Ok(())
            })
        })
        .await;
        ctx.test("still runs", |_| Box::pin(async { Ok(()) })).await;
        assert_eq!(ctx.results.failed(), 1);
        assert_eq!(ctx.results.passed(), 1);
        assert_eq!(ctx.results.outcomes()[0].error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_body_can_write_chain() {
        let mut ctx = ctx();
        ctx.test("producer", |ctx| {
            Box::pin(async move {
                ctx.chain.set("taskId", 42, "create");
                Ok(())
            })
        })
        .await;
        assert_eq!(ctx.chain.get_i64("taskId"), Some(42));
    }
}
