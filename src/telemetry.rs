//! Logging setup.
//!
//! Logs go to stderr so that command output on stdout stays machine readable.
//! `RUST_LOG` overrides the default `info` level.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    #[default]
    Text,
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let registry = tracing_subscriber::registry().with(env_filter);
        // A subscriber installed elsewhere (e.g. by a test harness) wins.
        let _ = match format {
            LogFormat::Json => registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init(),
            LogFormat::Text => registry
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .try_init(),
        };
    });
}
