//! Diagnostic logging setup
//!
//! Diagnostics go to stderr through `tracing`. The filter is read from
//! `LAUNCHER_LOG` (e.g. `LAUNCHER_LOG=debug` or
//! `LAUNCHER_LOG=launcher_config=trace`) and defaults to `warn`.

use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "LAUNCHER_LOG";

/// Filter used when `LAUNCHER_LOG` is unset or invalid
pub const DEFAULT_FILTER: &str = "warn";

/// Build the filter from `LAUNCHER_LOG`.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global stderr subscriber. Call once, early in `main`.
pub fn init() -> Result<(), SetGlobalDefaultError> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}
