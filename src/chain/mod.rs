//! Values handed from one test step to a later one.
//!
//! A single last-write-wins map plus an append-only history. Order of execution
//! decides availability: reading a key before its producer ran yields the default.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Result, SuiteError};

const DISPLAY_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainAction {
    Set,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainEntry {
    pub action: ChainAction,
    pub key: String,
    pub value: Value,
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default, Clone)]
pub struct TestChain {
    data: IndexMap<String, Value>,
    history: Vec<ChainEntry>,
}

impl TestChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`; values that fail to serialize are stored as null.
    pub fn set<V: Serialize>(&mut self, key: &str, value: V, source: &str) -> &mut Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.data.insert(key.to_string(), value.clone());
        self.history.push(ChainEntry {
            action: ChainAction::Set,
            key: key.to_string(),
            value,
            source: source.to_string(),
            timestamp: Utc::now(),
        });
        self
    }

    /// Current value; a stored null reads as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key).filter(|v| !v.is_null())
    }

    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).cloned().unwrap_or(default)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Value rendered for use in a URL path segment.
    pub fn get_path_segment(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::String(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// A consumer step calls this instead of silently hitting the API with a missing id.
    pub fn require(&self, key: &str) -> Result<String> {
        self.get_path_segment(key)
            .ok_or_else(|| SuiteError::Usage(format!("No {key} from previous step")))
    }

    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn get_all(&self) -> IndexMap<String, Value> {
        self.data.clone()
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.history.clear();
    }

    pub fn history(&self) -> Vec<ChainEntry> {
        self.history.clone()
    }

    /// Current state with long values truncated.
    pub fn render_state(&self) -> Vec<String> {
        self.data
            .iter()
            .map(|(k, v)| {
                let display = match v {
                    Value::String(s) => s.clone(),
                    Value::Object(_) | Value::Array(_) => {
                        v.to_string().chars().take(DISPLAY_LIMIT).collect()
                    }
                    other => other.to_string(),
                };
                format!("{k}: {display}")
            })
            .collect()
    }

    pub fn print_state(&self) {
        println!("\n📦 Test Chain State:");
        for line in self.render_state() {
            println!("  {line}");
        }
        println!();
    }
}
