//! Opt-in logging setup.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! up to the application. With the `tracing-subscriber` feature this module
//! installs one driven by environment variables:
//!
//! - `FIQL_DEBUG=true|1|yes` - enable debug logging
//! - `FIQL_LOG_LEVEL=trace|debug|info|warn|error` - set a specific level
//! - `FIQL_LOG_FORMAT=json|pretty|compact` - output format (default: json)
//!
//! ```rust,no_run
//! use fiql_query::logging;
//!
//! logging::init();
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// Check if debug logging is enabled via `FIQL_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    parse_flag(env::var("FIQL_DEBUG").ok().as_deref())
}

/// Get the configured log level.
///
/// `FIQL_LOG_LEVEL` wins when valid; otherwise "debug" if `FIQL_DEBUG` is
/// enabled, else "warn".
pub fn get_log_level() -> &'static str {
    resolve_level(env::var("FIQL_LOG_LEVEL").ok().as_deref(), is_debug_enabled())
}

/// Get the configured log format from `FIQL_LOG_FORMAT`.
pub fn get_log_format() -> &'static str {
    resolve_format(env::var("FIQL_LOG_FORMAT").ok().as_deref())
}

/// Install a subscriber if `FIQL_DEBUG` or `FIQL_LOG_LEVEL` asks for one.
///
/// Subsequent calls are no-ops.
pub fn init() {
    if !is_debug_enabled() && env::var("FIQL_LOG_LEVEL").is_err() {
        return;
    }
    init_with_level(get_log_level());
}

/// Install a subscriber at `level`, ignoring `FIQL_DEBUG`/`FIQL_LOG_LEVEL`.
///
/// Subsequent calls, including calls to [`init`], are no-ops.
pub fn init_with_level(level: &str) {
    INIT.call_once(|| {
        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = resolve_level(Some(level), false);
            let filter = EnvFilter::try_new(format!("fiql_query={level},fiql_sql={level}"))
                .unwrap_or_else(|_| EnvFilter::new("warn"));

            let format = get_log_format();
            let registry = tracing_subscriber::registry().with(filter);
            let installed = match format {
                "compact" => registry.with(fmt::layer().compact()).try_init(),
                "pretty" => registry.with(fmt::layer().pretty()).try_init(),
                _ => registry.with(fmt::layer().json()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(level = level, format = format, "fiql logging initialized");
            }
        }

        #[cfg(not(feature = "tracing-subscriber"))]
        let _ = level;
    });
}

fn parse_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
}

fn resolve_level(level: Option<&str>, debug: bool) -> &'static str {
    match level.map(str::to_lowercase).as_deref() {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("info") => "info",
        Some("warn") => "warn",
        Some("error") => "error",
        _ if debug => "debug",
        _ => "warn",
    }
}

fn resolve_format(format: Option<&str>) -> &'static str {
    match format.map(str::to_lowercase).as_deref() {
        Some("pretty") => "pretty",
        Some("compact") => "compact",
        _ => "json",
    }
}
