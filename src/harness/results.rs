use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
}

/// One finished test case. Never mutated after it is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestOutcome {
    pub suite: String,
    pub name: String,
    pub status: TestStatus,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Pass/fail/skip counters plus the ordered outcome log of one run.
#[derive(Debug, Default, Clone)]
pub struct ResultsAccumulator {
    passed: usize,
    failed: usize,
    skipped: usize,
    tests: Vec<TestOutcome>,
}

impl ResultsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The only mutation path, so counters always match the log.
    pub fn record(&mut self, outcome: TestOutcome) {
        match outcome.status {
            TestStatus::Passed => self.passed += 1,
            TestStatus::Failed => self.failed += 1,
            TestStatus::Skipped => self.skipped += 1,
        }
        self.tests.push(outcome);
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    pub fn outcomes(&self) -> &[TestOutcome] {
        &self.tests
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestOutcome> {
        self.tests.iter().filter(|t| t.status == TestStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, status: TestStatus) -> TestOutcome {
        TestOutcome {
            suite: "s".into(),
            name: name.into(),
            status,
            duration_ms: 0,
            error: None,
            reason: None,
        }
    }

    #[test]
    fn test_counts_match_partition() {
        let mut acc = ResultsAccumulator::new();
        let statuses = [
            TestStatus::Passed,
            TestStatus::Failed,
            TestStatus::Passed,
            TestStatus::Skipped,
            TestStatus::Passed,
        ];
        for (i, s) in statuses.iter().enumerate() {
            acc.record(outcome(&format!("t{i}"), *s));
        }
        assert_eq!(acc.passed(), 3);
        assert_eq!(acc.failed(), 1);
        assert_eq!(acc.skipped(), 1);
        assert_eq!(acc.outcomes().len(), 5);
        assert_eq!(acc.total(), 5);
        let names: Vec<_> = acc.outcomes().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["t0", "t1", "t2", "t3", "t4"]);
        assert_eq!(acc.failures().count(), 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut acc = ResultsAccumulator::new();
        acc.record(outcome("a", TestStatus::Failed));
        acc.reset();
        assert_eq!(acc.total(), 0);
        assert!(acc.outcomes().is_empty());
    }
}
