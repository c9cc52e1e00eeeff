use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{error, info, instrument};

use crate::errors::{Result, SuiteError};
use crate::harness::{ResultsAccumulator, TestContext, TestFuture};
use crate::report;

/// Selection labels attached to a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tag {
    /// Minimal fast-signal subset.
    Smoke,
    /// Order-dependent steps threaded through the chain.
    Workflow,
}

/// Entry point of a test module.
pub type ModuleFn = for<'a> fn(&'a mut TestContext) -> TestFuture<'a>;

#[derive(Clone)]
pub struct TestModule {
    pub key: String,
    pub display_name: String,
    pub tags: BTreeSet<Tag>,
    pub run: ModuleFn,
}

impl TestModule {
    pub fn new(key: impl Into<String>, display_name: impl Into<String>, run: ModuleFn) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            tags: BTreeSet::new(),
            run,
        }
    }

    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.insert(tag);
        self
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }
}

impl std::fmt::Debug for TestModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestModule")
            .field("key", &self.key)
            .field("display_name", &self.display_name)
            .field("tags", &self.tags)
            .finish()
    }
}

/// Modules in registration order; keys are unique.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    modules: Vec<TestModule>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, module: TestModule) -> Result<&mut Self> {
        if self.get(&module.key).is_some() {
            return Err(SuiteError::Config(format!(
                "Duplicate module key: {}",
                module.key
            )));
        }
        self.modules.push(module);
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<&TestModule> {
        self.modules.iter().find(|m| m.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestModule> {
        self.modules.iter()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.key.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Which modules a run executes. Resolution order: explicit key, then tag, then all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Module(String),
    Tagged(Tag),
    All,
}

impl Selection {
    pub fn from_flags(module: Option<String>, smoke: bool) -> Self {
        match (module, smoke) {
            (Some(key), _) => Selection::Module(key),
            (None, true) => Selection::Tagged(Tag::Smoke),
            (None, false) => Selection::All,
        }
    }

    /// An unknown explicit key is an error; tags and `All` may select nothing.
    pub fn resolve<'r>(&self, registry: &'r Registry) -> Result<Vec<&'r TestModule>> {
        match self {
            Selection::Module(key) => registry
                .get(key)
                .map(|m| vec![m])
                .ok_or_else(|| SuiteError::UnknownModule(key.clone())),
            Selection::Tagged(tag) => Ok(registry.iter().filter(|m| m.has_tag(*tag)).collect()),
            Selection::All => Ok(registry.iter().collect()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Persist a JSON report into this directory.
    pub report_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub total_time: Duration,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub report_path: Option<PathBuf>,
}

impl RunOutcome {
    /// 0 iff no test failed; skips do not count.
    pub fn exit_code(&self) -> i32 {
        if self.failed == 0 { 0 } else { 1 }
    }
}

pub fn exit_code(results: &ResultsAccumulator) -> i32 {
    if results.failed() == 0 { 0 } else { 1 }
}

/// Await each module in order. A module returning `Err` is logged and the run moves on.
pub async fn run_modules(ctx: &mut TestContext, modules: &[&TestModule]) {
    for (idx, module) in modules.iter().enumerate() {
        let m_t0 = Instant::now();
        info!(idx = idx + 1, key = %module.key, name = %module.display_name, "starting module");

        if let Err(e) = (module.run)(ctx).await {
            error!(key = %module.key, "Test execution error: {e}");
        }

        info!(
            key = %module.key,
            elapsed_ms = m_t0.elapsed().as_millis() as u64,
            "module finished"
        );
    }
}

/// Resolve the selection, run it against a fresh accumulator, summarize, optionally persist.
#[instrument(skip_all, fields(selection = ?selection))]
pub async fn execute(
    ctx: &mut TestContext,
    registry: &Registry,
    selection: &Selection,
    opts: &RunOptions,
) -> Result<RunOutcome> {
    // fatal before any test runs
    let modules = selection.resolve(registry)?;
    info!(count = modules.len(), "selected modules");

    ctx.results.reset();
    let t0 = Instant::now();

    run_modules(ctx, &modules).await;

    let total_time = t0.elapsed();
    report::print_summary(&ctx.results);
    println!("\nTotal time: {:.2}s", total_time.as_secs_f64());

    let report_path = match &opts.report_dir {
        Some(dir) => {
            let report = report::generate_report(&ctx.results, total_time, Utc::now());
            let path = report::write_report(dir, &report)?;
            println!("\nReport saved to: {}", path.display());
            Some(path)
        }
        None => None,
    };

    Ok(RunOutcome {
        total_time,
        passed: ctx.results.passed(),
        failed: ctx.results.failed(),
        skipped: ctx.results.skipped(),
        report_path,
    })
}
