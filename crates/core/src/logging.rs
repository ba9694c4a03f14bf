//! Structured logging infrastructure for wxresolve.
//!
//! Logs are written to stderr so that binaries can reserve stdout for the
//! decision value.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directive used when `RUST_LOG` is unset or invalid.
const DEFAULT_DIRECTIVE: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter())
}

fn default_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_DIRECTIVE)
}

/// Initialize the logging system with human-readable output.
///
/// Log level can be configured via the `RUST_LOG` environment variable.
/// If not set, defaults to `info` level.
///
/// # Example
/// ```no_run
/// use wxresolve_core::logging;
///
/// logging::init();
/// tracing::info!("Resolver started");
/// ```
pub fn init() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

/// Initialize the logging system with JSON output for batch environments.
///
/// # Example
/// ```no_run
/// use wxresolve_core::logging;
///
/// logging::init_json();
/// tracing::info!(namespace = "wxm.weather_data_dev", "Runner started");
/// ```
pub fn init_json() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_is_info() {
        assert_eq!(default_filter().to_string(), DEFAULT_DIRECTIVE);
    }
}
