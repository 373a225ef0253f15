//! Writes rendered artifacts into an application's output directory.
//!
//! Writes are sequential and not rolled back: when a later write fails,
//! files written before it stay on disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{ConfigError, ConfigResult};
use crate::render::{compose::render_compose, dockerfile::render_dockerfile, env::render_env};

/// `pups` arguments used for images built through docker-compose.
pub const COMPOSE_PUPS_ARGS: &str = "--skip-tags=precompile,migrate,db";

/// File locations for one application's artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
    pub yaml_config: PathBuf,
    pub env: PathBuf,
    pub dockerfile: PathBuf,
    pub compose: PathBuf,
}

impl ArtifactPaths {
    pub fn new(dir: &Path, name: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            yaml_config: dir.join(Self::yaml_config_name(name)),
            env: dir.join(format!("{}.env", name)),
            dockerfile: dir.join(format!("Dockerfile.{}", name)),
            compose: dir.join("docker-compose.yaml"),
        }
    }

    /// Payload file name relative to the output directory.
    pub fn yaml_config_name(name: &str) -> String {
        format!("{}.config.yaml", name)
    }

    /// All generated files, in write order.
    pub fn files(&self) -> [&Path; 4] {
        [&self.env, &self.yaml_config, &self.dockerfile, &self.compose]
    }
}

fn write_file(path: &Path, contents: &str) -> ConfigResult<()> {
    fs::write(path, contents).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote artifact");
    Ok(())
}

/// Write `<name>.config.yaml`, the concatenated raw layers.
pub fn write_yaml_config(config: &Config, dir: &Path) -> ConfigResult<PathBuf> {
    let path = ArtifactPaths::new(dir, &config.name).yaml_config;
    write_file(&path, &config.raw_yaml())?;
    Ok(path)
}

/// Write `<name>.env`.
pub fn write_env(config: &Config, dir: &Path) -> ConfigResult<PathBuf> {
    let path = ArtifactPaths::new(dir, &config.name).env;
    write_file(&path, &render_env(config))?;
    Ok(path)
}

/// Write the payload, then `Dockerfile.<name>` that consumes it.
pub fn write_dockerfile(
    config: &Config,
    dir: &Path,
    pups_args: &str,
    bake_env: bool,
) -> ConfigResult<PathBuf> {
    write_yaml_config(config, dir)?;

    let path = ArtifactPaths::new(dir, &config.name).dockerfile;
    let payload = ArtifactPaths::yaml_config_name(&config.name);
    write_file(&path, &render_dockerfile(config, &payload, pups_args, bake_env))?;
    Ok(path)
}

/// Write the full compose setup: env file, payload, Dockerfile and
/// `docker-compose.yaml`.
pub fn write_compose(config: &Config, dir: &Path, bake_env: bool) -> ConfigResult<PathBuf> {
    write_env(config, dir)?;
    write_dockerfile(config, dir, COMPOSE_PUPS_ARGS, bake_env)?;

    let path = ArtifactPaths::new(dir, &config.name).compose;
    let yaml = render_compose(config)
        .to_yaml()
        .map_err(|source| ConfigError::Serialize {
            path: path.clone(),
            source,
        })?;
    write_file(&path, &yaml)?;
    Ok(path)
}
