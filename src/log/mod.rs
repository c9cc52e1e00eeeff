// src/log/mod.rs
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt};

/// Initialize tracing subscriber.
///
/// Behavior:
/// - Log level is read from `APISUITE_LOG_LEVEL` if set, otherwise falls back to `RUST_LOG` (via try_from_default_env),
///   then to `info` (`apisuite=debug,info` when `verbose` is set).
/// - Output format can be set via `APISUITE_LOG_FORMAT=json` to enable JSON output. Any other value uses the default
///   human-readable formatter.
///
/// Calling this more than once is a no-op; the first subscriber wins.
pub fn init_tracing(verbose: bool) {
    let fallback = default_filter(verbose);

    // Allow explicit APISUITE_LOG_LEVEL override, else fall back to RUST_LOG / default
    let filter = match std::env::var("APISUITE_LOG_LEVEL") {
        Ok(lvl) => EnvFilter::new(lvl),
        Err(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
    };

    // JSON output opt-in (APISUITE_LOG_FORMAT=json)
    let use_json = std::env::var("APISUITE_LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    // stdout belongs to the test report lines, diagnostics go to stderr
    let fmt_layer = if use_json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .boxed()
    };

    let subscriber = Registry::default()
        .with(filter)
        .with(fmt_layer)
        .with(ErrorLayer::default());

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

fn default_filter(verbose: bool) -> &'static str {
    if verbose { "apisuite=debug,info" } else { "info" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_filter_is_scoped_to_crate() {
        assert_eq!(default_filter(false), "info");
        let filter = default_filter(true);
        assert!(filter.starts_with("apisuite=debug"));
        assert!(EnvFilter::try_new(filter).is_ok());
    }
}
