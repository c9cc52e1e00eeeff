// src/errors/mod.rs
use thiserror::Error;

use crate::harness::assert::AssertionError;

/// Main error type for apisuite operations
#[derive(Error, Debug)]
pub enum SuiteError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("HTTP middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    #[error("JSON serialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    // Assertion messages are shown to the user verbatim.
    #[error(transparent)]
    Assertion(#[from] AssertionError),

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown module: {0}")]
    UnknownModule(String),

    #[error("Login failed: {0}")]
    Auth(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("Server error: {0}")]
    Server(String),
}

/// Convenience Result type that uses SuiteError
pub type Result<T> = std::result::Result<T, SuiteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SuiteError::Config("missing base url".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing base url");
    }

    #[test]
    fn test_assertion_error_is_transparent() {
        let err: SuiteError = AssertionError::new("Expected 1, got 2").into();
        assert_eq!(err.to_string(), "Expected 1, got 2");
    }

    #[test]
    fn test_usage_error() {
        let err = SuiteError::Usage("No taskId from previous step".to_string());
        assert!(err.to_string().contains("Usage error"));
    }
}
