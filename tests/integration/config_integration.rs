use std::io::Write;

use apisuite::config::{Config, load_config_from_path};
use apisuite::errors::SuiteError;

fn write_yaml(contents: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    f
}

#[test]
fn test_yaml_then_env_layering() {
    let yaml = r#"
base_url: https://staging.example.com
api_key: from-yaml
test_account_id: 5
timeouts:
  long_ms: 60000
retry:
  attempts: 2
test_data:
  segment_count: 4
report:
  output_dir: ./out
"#;
    let f = write_yaml(yaml);
    let mut cfg = load_config_from_path(f.path()).unwrap();

    assert_eq!(cfg.api_key, "from-yaml");
    assert_eq!(cfg.timeouts.long_ms, 60_000);
    // unspecified tiers keep their defaults
    assert_eq!(cfg.timeouts.short_ms, 5_000);
    assert_eq!(cfg.retry.attempts, 2);
    assert_eq!(cfg.test_data.segment_count, 4);

    cfg.apply_env(|key| match key {
        "API_KEY" => Some("from-env".to_string()),
        "TEST_EMAIL" => Some("qa@example.com".to_string()),
        "TEST_PASSWORD" => Some("secret".to_string()),
        _ => None,
    })
    .unwrap();
    cfg.validate().unwrap();

    assert_eq!(cfg.api_key, "from-env");
    assert_eq!(cfg.base_url, "https://staging.example.com");
    assert_eq!(cfg.report.output_dir, "./out");
    let creds = cfg.credentials.expect("credentials from env");
    assert_eq!(creds.email, "qa@example.com");
}

#[test]
fn test_half_credentials_are_ignored() {
    let mut cfg = Config::default();
    cfg.apply_env(|key| (key == "TEST_EMAIL").then(|| "qa@example.com".to_string()))
        .unwrap();
    assert!(cfg.credentials.is_none());
}

#[test]
fn test_malformed_yaml_is_an_error() {
    let f = write_yaml("timeouts: [not, a, map]");
    let err = load_config_from_path(f.path()).unwrap_err();
    assert!(matches!(err, SuiteError::SerdeYaml(_)));
}
