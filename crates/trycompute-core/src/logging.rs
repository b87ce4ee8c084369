//! Global `tracing` subscriber setup.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Default directive when neither the config nor `RUST_LOG` provide one.
pub const DEFAULT_FILTER: &str = "info";

/// Pick the filter directive: explicit config first, then `RUST_LOG`, then
/// [`DEFAULT_FILTER`].
pub fn resolve_filter(explicit: Option<&str>, rust_log: Option<&str>) -> String {
    explicit
        .or(rust_log)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

/// Install the global fmt subscriber once. Later calls are ignored.
pub fn init_logging(filter: Option<&str>) {
    INIT.call_once(|| {
        let rust_log = std::env::var("RUST_LOG").ok();
        let directive = resolve_filter(filter, rust_log.as_deref());

        let env_filter = match EnvFilter::try_new(&directive) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("invalid log filter {directive:?} ({e}), using {DEFAULT_FILTER}");
                EnvFilter::new(DEFAULT_FILTER)
            }
        };

        // Another subscriber may already be installed (e.g. by a test harness).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .try_init();

        tracing::debug!("logging initialized with filter {directive:?}");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins() {
        assert_eq!(resolve_filter(Some("debug"), Some("warn")), "debug");
    }

    #[test]
    fn rust_log_used_when_no_explicit_filter() {
        assert_eq!(resolve_filter(None, Some("trycompute_gpu=trace")), "trycompute_gpu=trace");
    }

    #[test]
    fn blank_filters_fall_back_to_default() {
        assert_eq!(resolve_filter(None, None), DEFAULT_FILTER);
        assert_eq!(resolve_filter(Some("   "), None), DEFAULT_FILTER);
    }

    #[test]
    fn config_log_filter_takes_precedence_over_rust_log() {
        let config = crate::AppConfig::default()
            .with_overrides(|key| (key == crate::config::LOG_FILTER_ENV).then(|| "debug".to_string()));
        assert_eq!(
            resolve_filter(config.log_filter.as_deref(), Some("warn")),
            "debug"
        );

        let config = crate::AppConfig::default();
        assert_eq!(resolve_filter(config.log_filter.as_deref(), Some("warn")), "warn");
    }

    #[test]
    fn init_is_idempotent() {
        init_logging(Some("warn"));
        init_logging(Some("trace"));
    }
}
