//! Top-level launcher errors

use std::io;
use std::path::PathBuf;

use launcher_config::ConfigError;

use crate::run::RunError;

/// Printed for any failure loading an application's YAML
pub const LOAD_ERROR_HINT: &str =
    "YAML syntax error. Please check your containers/*.yml config files.";

#[derive(Debug, thiserror::Error)]
pub enum LauncherError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove {path}: {source}")]
    Clean {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to install signal handler: {0}")]
    SignalInstall(#[from] ctrlc::Error),

    #[error("{0}")]
    UnknownParseType(String),
}

impl LauncherError {
    /// True when the application's configuration could not be loaded
    pub fn is_load_error(&self) -> bool {
        matches!(self, LauncherError::Config(e) if e.is_load_error())
    }
}

pub type Result<T> = std::result::Result<T, LauncherError>;
