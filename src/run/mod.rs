//! Subprocess orchestration
//!
//! Runs one external command at a time in its own process group. While the
//! command runs, firing the [`CancelToken`] sends SIGINT to that group so the
//! child (and anything it started) can shut down cleanly. The exit code is
//! then classified:
//!
//! - `0` succeeded
//! - `77` asks the caller to retry the whole launch
//! - anything else failed, or aborted if cancellation had fired

mod spawner;

pub use spawner::{resolve_program, Invocation, RunningProcess, Spawner, SystemSpawner};

use std::io;
use std::sync::Arc;

use crate::cancel::CancelToken;

/// Exit code a child uses to request a retry
pub const RETRY_EXIT_CODE: i32 = 77;

/// Printed after a failed run
pub const BOOTSTRAP_FAILED_HINT: &str = "** FAILED TO BOOTSTRAP ** please scroll up and look for earlier error messages, there may be more than one.\n./discourse-doctor may help diagnose the problem.";

/// Errors running an invocation
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded,
    /// Child exited 77
    Retried,
    Failed { exit_code: i32 },
    /// Cancellation fired before or during the run. `None` when nothing
    /// was spawned.
    Aborted { exit_code: Option<i32> },
}

impl RunOutcome {
    /// Classify a child's exit code.
    pub fn classify(exit_code: i32, cancelled: bool) -> Self {
        match exit_code {
            0 => RunOutcome::Succeeded,
            RETRY_EXIT_CODE => RunOutcome::Retried,
            code if cancelled => RunOutcome::Aborted {
                exit_code: Some(code),
            },
            code => RunOutcome::Failed { exit_code: code },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded)
    }

    /// Exit status the launcher itself should use
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Succeeded => 0,
            RunOutcome::Retried => RETRY_EXIT_CODE,
            RunOutcome::Failed { .. } | RunOutcome::Aborted { .. } => 1,
        }
    }

    /// Message to print on stderr, if any
    pub fn message(&self) -> Option<String> {
        match self {
            RunOutcome::Succeeded | RunOutcome::Retried => None,
            RunOutcome::Failed { exit_code } => Some(format!(
                "run failed with exit code {}\n{}",
                exit_code, BOOTSTRAP_FAILED_HINT
            )),
            RunOutcome::Aborted {
                exit_code: Some(code),
            } => Some(format!("Aborted with exit code {}", code)),
            RunOutcome::Aborted { exit_code: None } => Some("Aborted".to_string()),
        }
    }
}

/// Runs invocations through a [`Spawner`], bridging cancellation to the
/// child's process group
#[derive(Clone)]
pub struct Orchestrator {
    spawner: Arc<dyn Spawner>,
}

impl Orchestrator {
    pub fn new(spawner: Arc<dyn Spawner>) -> Self {
        Self { spawner }
    }

    /// Orchestrator backed by real processes
    pub fn system() -> Self {
        Self::new(Arc::new(SystemSpawner))
    }

    /// Run `invocation` to completion.
    ///
    /// Nothing is spawned if `token` already fired. Otherwise at most one
    /// SIGINT reaches the child's group, and only while it is running.
    pub fn run(&self, invocation: &Invocation, token: &CancelToken) -> Result<RunOutcome, RunError> {
        if token.is_cancelled() {
            tracing::info!(command = %invocation.command_line(), "cancelled before start");
            return Ok(RunOutcome::Aborted { exit_code: None });
        }

        tracing::info!(command = %invocation.command_line(), "starting");
        let mut process = self
            .spawner
            .spawn(invocation)
            .map_err(|source| RunError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;
        let pgid = process.pid();

        let spawner = Arc::clone(&self.spawner);
        let hook = token.on_cancel(move || match spawner.interrupt_group(pgid) {
            Ok(()) => tracing::info!(pgid, "sent SIGINT to process group"),
            Err(e) => tracing::warn!(pgid, error = %e, "failed to interrupt process group"),
        });

        let waited = process.wait();
        // The group id may be reused once reaped.
        drop(hook);

        let exit_code = waited.map_err(|source| RunError::Wait {
            program: invocation.program.clone(),
            source,
        })?;

        let outcome = RunOutcome::classify(exit_code, token.is_cancelled());
        tracing::info!(pgid, exit_code, outcome = ?outcome, "finished");
        Ok(outcome)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator").finish_non_exhaustive()
    }
}
