use std::{fs::File, path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{Result, SuiteError};


pub const DEFAULT_BASE_URL: &str = "https://ext.survy.ai";
pub const DEFAULT_API_KEY: &str = "outsea_fu9etech";

// ================== Public types ==================

/// Everything the runner and the test modules read at run time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub api_key: String,
    pub jwt_token: Option<String>,
    pub test_account_id: i64,
    pub timeouts: Timeouts,
    pub retry: Retry,
    pub test_data: TestData,
    pub report: ReportConfig,
    pub credentials: Option<Credentials>,
    pub verbose: bool,
}

/// Four timeout tiers, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub short_ms: u64,
    pub default_ms: u64,
    pub long_ms: u64,
    pub very_long_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Retry {
    /// 0 disables the retry middleware entirely.
    pub attempts: u32,
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TestData {
    pub user_input: String,
    pub product_name: String,
    pub segment_count: i64,
    pub audience_per_persona: i64,
    pub interview_transcript: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: String,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

// ================== Defaults ==================

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            jwt_token: None,
            test_account_id: 1,
            timeouts: Timeouts::default(),
            retry: Retry::default(),
            test_data: TestData::default(),
            report: ReportConfig::default(),
            credentials: None,
            verbose: false,
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            short_ms: 5_000,
            default_ms: 30_000,
            long_ms: 120_000,
            very_long_ms: 300_000,
        }
    }
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            attempts: 0,
            delay_ms: 1_000,
        }
    }
}

impl Default for TestData {
    fn default() -> Self {
        Self {
            user_input: "我想为一款面向年轻女性的护肤品寻找目标受众".to_string(),
            product_name: "测试护肤品".to_string(),
            segment_count: 3,
            audience_per_persona: 5,
            interview_transcript: "主持人：请介绍一下您平时的护肤习惯。受访者：我每天早晚都会洗脸，然后用爽肤水和面霜，比较看重天然成分。"
                .to_string(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: "./reports".to_string(),
            format: "json".to_string(),
        }
    }
}

impl Timeouts {
    pub fn short(&self) -> Duration {
        Duration::from_millis(self.short_ms)
    }
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_ms)
    }
    pub fn long(&self) -> Duration {
        Duration::from_millis(self.long_ms)
    }
    pub fn very_long(&self) -> Duration {
        Duration::from_millis(self.very_long_ms)
    }
}

// ================== Loading ==================

pub fn load_config_from_path<P: AsRef<Path>>(path: P) -> Result<Config> {
    let f = File::open(path)?;
    Ok(serde_yaml::from_reader(f)?)
}

impl Config {
    /// Defaults, then the optional YAML file, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        // a missing .env is normal
        let _ = dotenvy::dotenv();

        let mut cfg = match path {
            Some(p) => {
                debug!(path = %p.display(), "loading yaml config");
                load_config_from_path(p)?
            }
            None => Config::default(),
        };
        cfg.apply_env(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply environment overrides through `lookup` so tests can feed a fake environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("API_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = lookup("API_KEY") {
            self.api_key = v;
        }
        if let Some(v) = lookup("JWT_TOKEN").filter(|v| !v.is_empty()) {
            self.jwt_token = Some(v);
        }
        if let Some(v) = lookup("TEST_ACCOUNT_ID") {
            self.test_account_id = v.trim().parse().map_err(|_| {
                SuiteError::Config(format!("TEST_ACCOUNT_ID must be an integer, got '{v}'"))
            })?;
        }
        if let (Some(email), Some(password)) = (lookup("TEST_EMAIL"), lookup("TEST_PASSWORD")) {
            self.credentials = Some(Credentials { email, password });
        }
        if let Some(v) = lookup("VERBOSE") {
            self.verbose = v == "true";
        }
        if let Some(v) = lookup("REPORT_DIR") {
            self.report.output_dir = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url)
            .map_err(|e| SuiteError::Config(format!("invalid base_url '{}': {e}", self.base_url)))?;
        if self.timeouts.default_ms == 0 {
            return Err(SuiteError::Config("timeouts.default_ms must be > 0".into()));
        }
        Ok(())
    }
}
