use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use clap::{Parser, Subcommand};
use tracing::{info, instrument};

use crate::config::Config;
use crate::errors::Result;
use crate::harness::TestContext;
use crate::runner::{self, Registry, RunOptions, Selection};
use crate::scenarios;
use crate::server;

const BANNER_WIDTH: usize = 60;
const TITLE: &str = "Audience Research API Test Suite";

/// CLI
#[derive(Parser, Debug)]
#[command(
    name = "apisuite",
    version,
    about = "Black-box test runner for the Audience Research REST API.",
    long_about = "Black-box test runner for the Audience Research REST API.\n\n\
Modules run sequentially and share one chain of produced ids.\n\
Exit code is 0 when every test passed and 1 otherwise."
)]
pub struct Cli {
    /// Run a single module by key (takes priority over --smoke)
    #[arg(long, short = 'm', value_name = "KEY")]
    pub module: Option<String>,

    /// Run only modules tagged as smoke tests
    #[arg(long)]
    pub smoke: bool,

    /// Write a JSON report into the configured report directory
    #[arg(long)]
    pub report: bool,

    /// Log every request and response
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Optional YAML config file layered under the environment
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// List registered modules and exit
    #[arg(long)]
    pub list: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP trigger server
    Serve {
        /// Listen port (falls back to PORT, then 10000)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn rule() -> String {
    "═".repeat(BANNER_WIDTH)
}

pub fn print_banner() {
    println!("{}", rule());
    println!("  {TITLE}");
    println!("  {}", Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
    println!("{}", rule());
}

pub fn print_modules(registry: &Registry) {
    for m in registry.iter() {
        let tags: Vec<String> = m.tags.iter().map(|t| format!("{t:?}").to_lowercase()).collect();
        if tags.is_empty() {
            println!("{:<12} {}", m.key, m.display_name);
        } else {
            println!("{:<12} {} [{}]", m.key, m.display_name, tags.join(", "));
        }
    }
}

/// Load config, run the selected modules and return the process exit code.
#[instrument(skip_all, fields(module = ?cli.module, smoke = cli.smoke))]
pub async fn run_suite(cli: &Cli) -> Result<i32> {
    let registry = scenarios::registry()?;
    if cli.list {
        print_modules(&registry);
        return Ok(0);
    }

    print_banner();

    let mut cfg = Config::load(cli.config.as_deref())?;
    if cli.verbose {
        cfg.verbose = true;
    }
    info!(base_url = %cfg.base_url, "loaded config");

    let selection = Selection::from_flags(cli.module.clone(), cli.smoke);
    let opts = RunOptions {
        report_dir: cli.report.then(|| Path::new(&cfg.report.output_dir).to_path_buf()),
    };

    let mut ctx = TestContext::new(cfg);
    let outcome = runner::execute(&mut ctx, &registry, &selection, &opts).await?;

    info!(
        passed = outcome.passed,
        failed = outcome.failed,
        skipped = outcome.skipped,
        total_ms = outcome.total_time.as_millis() as u64,
        "run finished"
    );
    Ok(outcome.exit_code())
}

pub async fn run_server(port: Option<u16>) -> Result<()> {
    let port = server::resolve_port(port, std::env::var("PORT").ok())?;
    server::serve(port).await
}
