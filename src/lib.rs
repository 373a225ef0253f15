//! Container launcher for Discourse-style applications
//!
//! Merges an application's layered YAML configuration (see
//! [`launcher_config`]), renders the build artifacts, and drives `docker`
//! as a child process group that can be interrupted cooperatively.

pub mod cancel;
pub mod commands;
pub mod docker;
pub mod error;
pub mod logging;
pub mod mock;
pub mod run;
pub mod signal;

pub use cancel::{CancelToken, HookGuard};
pub use commands::{Launcher, PupsOptions, RunArgs};
pub use error::{LauncherError, LOAD_ERROR_HINT};
pub use run::{
    Invocation, Orchestrator, RunError, RunOutcome, RunningProcess, Spawner, SystemSpawner,
    RETRY_EXIT_CODE,
};
pub use signal::{SignalAction, SignalBridge, SignalListener, SignalState};
