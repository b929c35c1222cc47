//! Subscriber setup; logs go to stderr so stdout stays the report

use gatecheck_core::config::LogFormat;
use std::io;
use tracing_subscriber::EnvFilter;

/// Directive used when neither `--log-level` nor `RUST_LOG` is set
pub const DEFAULT_DIRECTIVE: &str = "gatecheck=info";

/// Filter from an explicit level, else `RUST_LOG`, else the default
#[must_use]
pub fn filter(level: Option<&str>) -> EnvFilter {
    match level {
        Some(level) => EnvFilter::new(format!("gatecheck={level}")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE)),
    }
}

/// Install the global subscriber
///
/// A second call is a no-op.
pub fn init(level: Option<&str>, format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_writer(io::stderr);
    let _ = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
}
