//! Tracing subscriber setup for binaries and tests.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter directives
pub const LOG_ENV: &str = "QUERYSPEC_LOG";

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Installs a console subscriber filtered by `QUERYSPEC_LOG` (default `info`).
///
/// Safe to call more than once; when another global subscriber is already
/// installed it is left in place.
pub fn init_logging() {
    LOGGING_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr),
        );

        // Another subscriber (a host application, a test harness) may own the global slot
        if subscriber.try_init().is_err() {
            tracing::debug!("global tracing subscriber already set, keeping it");
        }
    });
}
