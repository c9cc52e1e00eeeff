use apisuite::config::Config;
use apisuite::harness::TestContext;
use wiremock::MockServer;

pub const TEST_API_KEY: &str = "test-key";

/// Config pointed at `server` with short timeouts so failing mocks do not stall the suite.
pub fn config_for(server: &MockServer) -> Config {
    let mut cfg = Config {
        base_url: server.uri(),
        api_key: TEST_API_KEY.to_string(),
        ..Config::default()
    };
    cfg.timeouts.short_ms = 2_000;
    cfg.timeouts.default_ms = 2_000;
    cfg.timeouts.long_ms = 2_000;
    cfg.timeouts.very_long_ms = 2_000;
    cfg
}

pub fn context_for(server: &MockServer) -> TestContext {
    TestContext::new(config_for(server))
}
