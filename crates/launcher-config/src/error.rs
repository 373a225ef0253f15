//! Errors raised while loading configs and writing artifacts.

use std::path::PathBuf;

/// Config loading and rendering errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config not found: {path}")]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("template not found: {path}")]
    TemplateNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse template {path}: {source}")]
    TemplateParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("error writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error serializing compose file for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl ConfigError {
    /// True for errors raised while reading or parsing YAML layers.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            ConfigError::NotFound { .. }
                | ConfigError::Parse { .. }
                | ConfigError::TemplateNotFound { .. }
                | ConfigError::TemplateParse { .. }
        )
    }

    /// Path the error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            ConfigError::NotFound { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::TemplateNotFound { path, .. }
            | ConfigError::TemplateParse { path, .. }
            | ConfigError::Write { path, .. }
            | ConfigError::Serialize { path, .. } => path,
        }
    }
}

/// Result alias for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;
