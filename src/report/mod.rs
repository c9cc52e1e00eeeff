//! Run summary and the persisted JSON report.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{Result, SuiteError};
use crate::harness::{ResultsAccumulator, TestOutcome};

const RULE_HEAVY: &str = "══════════════════════════════════════════════════";
const RULE_LIGHT: &str = "──────────────────────────────────────────────────";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Percentage rounded to one decimal, skips included in the denominator.
    pub pass_rate: f64,
}

impl Summary {
    pub fn from_results(results: &ResultsAccumulator) -> Self {
        let total = results.total();
        Self {
            total,
            passed: results.passed(),
            failed: results.failed(),
            skipped: results.skipped(),
            pass_rate: (pass_rate(results.passed(), total) * 10.0).round() / 10.0,
        }
    }
}

/// `passed / (passed + failed + skipped) * 100`, or 0 for an empty run.
pub fn pass_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub suite: String,
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub timestamp: DateTime<Utc>,
    pub total_time_ms: u64,
    pub summary: Summary,
    pub failures: Vec<Failure>,
    pub tests: Vec<TestOutcome>,
}

pub fn generate_report(results: &ResultsAccumulator, total_time: Duration, now: DateTime<Utc>) -> Report {
    Report {
        timestamp: now,
        total_time_ms: total_time.as_millis() as u64,
        summary: Summary::from_results(results),
        failures: results
            .failures()
            .map(|t| Failure {
                suite: t.suite.clone(),
                name: t.name.clone(),
                error: t.error.clone().unwrap_or_default(),
            })
            .collect(),
        tests: results.outcomes().to_vec(),
    }
}

/// Summary block lines, uncolored.
pub fn render_summary(summary: &Summary) -> Vec<String> {
    vec![
        format!("Total:   {}", summary.total),
        format!("Passed:  {}", summary.passed),
        format!("Failed:  {}", summary.failed),
        format!("Skipped: {}", summary.skipped),
        format!("Pass Rate: {:.1}%", summary.pass_rate),
    ]
}

pub fn print_summary(results: &ResultsAccumulator) {
    let summary = Summary::from_results(results);
    let lines = render_summary(&summary);

    println!("\n{RULE_HEAVY}");
    println!("{}", "Test Summary".blue());
    println!("{RULE_LIGHT}");
    println!("{}", lines[0]);
    println!("{}", lines[1].green());
    println!("{}", lines[2].red());
    println!("{}", lines[3].yellow());
    println!("{}", lines[4]);
    println!("{RULE_HEAVY}");
}

/// `test-report-<ISO timestamp with ':' and '.' replaced by '-'>.json`
pub fn report_file_name(timestamp: DateTime<Utc>) -> String {
    let iso = timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
    format!("test-report-{}.json", iso.replace([':', '.'], "-"))
}

/// Write `report` as pretty JSON into `dir`, creating the directory if needed.
pub fn write_report(dir: impl AsRef<Path>, report: &Report) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(report_file_name(report.timestamp));
    let json = serde_json::to_string_pretty(report)?;
    fs::write(&path, json).map_err(|e| {
        SuiteError::Report(format!("failed to write {}: {e}", path.display()))
    })?;
    info!(path = %path.display(), "report saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::TestStatus;
    use chrono::TimeZone;

    fn outcome(name: &str, status: TestStatus, error: Option<&str>) -> TestOutcome {
        TestOutcome {
            suite: "Suite".into(),
            name: name.into(),
            status,
            duration_ms: 3,
            error: error.map(str::to_owned),
            reason: None,
        }
    }

    fn sample() -> ResultsAccumulator {
        let mut acc = ResultsAccumulator::new();
        acc.record(outcome("a", TestStatus::Passed, None));
        acc.record(outcome("b", TestStatus::Failed, Some("Expected 1, got 2")));
        acc.record(outcome("c", TestStatus::Skipped, None));
        acc.record(outcome("d", TestStatus::Passed, None));
        acc
    }

    #[test]
    fn test_pass_rate_counts_skips() {
        assert_eq!(pass_rate(0, 0), 0.0);
        let s = Summary::from_results(&sample());
        assert_eq!(s.total, 4);
        assert_eq!(s.pass_rate, 50.0);
        assert_eq!(format!("{:.1}", pass_rate(2, 3)), "66.7");
    }

    #[test]
    fn test_render_summary_lines() {
        let lines = render_summary(&Summary::from_results(&sample()));
        assert_eq!(lines[1], "Passed:  2");
        assert_eq!(lines[2], "Failed:  1");
        assert_eq!(lines[4], "Pass Rate: 50.0%");
    }

    #[test]
    fn test_report_file_name_is_filesystem_safe() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        assert_eq!(report_file_name(ts), "test-report-2024-05-06T07-08-09-000Z.json");
    }

    #[test]
    fn test_generate_report_lists_failures() {
        let report = generate_report(&sample(), Duration::from_millis(1500), Utc::now());
        assert_eq!(report.total_time_ms, 1500);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "b");
        assert_eq!(report.failures[0].error, "Expected 1, got 2");
        assert_eq!(report.tests.len(), 4);
    }
}
