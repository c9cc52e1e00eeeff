// Integration tests for whole runs
//
// These tests drive scenario modules and the runner against a mock backend:
// - module outcomes for mocked success and validation responses
// - chain hand-off between producer and consumer steps
// - module selection and the persisted JSON report
// - YAML plus environment config layering

mod config_integration;
mod runner_integration;
mod scenarios_integration;
