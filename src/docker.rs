//! Docker command lines for each launcher operation
//!
//! These only build [`Invocation`]s; running them is the orchestrator's job.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use launcher_config::render::{
    env_array, label_args, link_args, port_args, render_dockerfile, volume_args, ArtifactPaths,
    COMPOSE_PUPS_ARGS,
};
use launcher_config::{Config, PUPS_BINARY, SHM_SIZE};

use crate::run::Invocation;

pub const DOCKER: &str = "docker";

/// Prefix for the name of a processor container
pub const BUILD_CONTAINER_PREFIX: &str = "discourse-build-";

/// Processor arguments for `configure`
pub const CONFIGURE_PUPS_ARGS: &str = "--tags=db,precompile";

/// Processor arguments for `migrate`
pub const MIGRATE_PUPS_ARGS: &str = "--tags=db,migrate";

/// Passed through from the launcher's environment unless the config sets them
const INHERITED_ENV: [&str; 2] = ["PATH", "HOME"];

/// Child environment: the substituted config env, the inherited lookup and
/// credential locations, plus plain build output.
pub fn child_env(config: &Config) -> Vec<(String, String)> {
    let mut env = env_array(config);
    for key in INHERITED_ENV {
        if env.iter().any(|(k, _)| k == key) {
            continue;
        }
        if let Some(value) = std::env::var_os(key) {
            env.push((key.to_string(), value.to_string_lossy().into_owned()));
        }
    }
    env.push(("BUILDKIT_PROGRESS".to_string(), "plain".to_string()));
    env
}

/// `docker build` for the base image, with the Dockerfile on stdin.
///
/// Runs in `dir`, which must already hold the payload written by
/// [`launcher_config::render::write_yaml_config`].
pub fn build_invocation(config: &Config, dir: &Path, bake_env: bool) -> Invocation {
    let payload = ArtifactPaths::yaml_config_name(&config.name);
    let dockerfile = render_dockerfile(config, &payload, COMPOSE_PUPS_ARGS, bake_env);

    let mut invocation = Invocation::new(DOCKER).arg("build");
    for key in config.env.keys() {
        invocation = invocation.args(["--build-arg", key.as_str()]);
    }
    invocation = invocation.args([
        "--force-rm".to_string(),
        "-t".to_string(),
        config.local_image(),
        format!("--shm-size={}", SHM_SIZE),
        "-f".to_string(),
        "-".to_string(),
        ".".to_string(),
    ]);

    invocation.work_dir = Some(dir.to_path_buf());
    invocation.env = Some(child_env(config));
    invocation.stdin = Some(dockerfile);
    invocation
}

/// Options for a processor run inside the local image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PupsRun {
    pub pups_args: String,
    pub skip_ember: bool,
    pub container_name: String,
    /// Pass `--rm` so docker deletes the container on exit
    pub remove_container: bool,
}

impl PupsRun {
    /// Run with a fresh `discourse-build-<uuid>` container name.
    pub fn new(pups_args: impl Into<String>, skip_ember: bool) -> Self {
        Self {
            pups_args: pups_args.into(),
            skip_ember,
            container_name: format!("{}{}", BUILD_CONTAINER_PREFIX, uuid::Uuid::new_v4()),
            remove_container: true,
        }
    }
}

/// `docker run` feeding the raw payload to the processor over stdin.
pub fn pups_invocation(config: &Config, run: &PupsRun) -> Invocation {
    let mut invocation = Invocation::new(DOCKER).arg("run");
    for key in config.env.keys() {
        invocation = invocation.args(["-e", key.as_str()]);
    }
    if run.skip_ember {
        invocation = invocation.args(["-e", "SKIP_EMBER_CLI_COMPILE=1"]);
    }
    invocation = invocation
        .args(label_args(config))
        .args(port_args(config))
        .args(volume_args(config))
        .args(link_args(config));
    if run.remove_container {
        invocation = invocation.arg("--rm");
    }
    invocation = invocation.args([
        format!("--shm-size={}", SHM_SIZE),
        "--name".to_string(),
        run.container_name.clone(),
        "-i".to_string(),
        config.local_image(),
        "/bin/bash".to_string(),
        "-c".to_string(),
        format!("{} --stdin {}", PUPS_BINARY, run.pups_args),
    ]);

    invocation.env = Some(child_env(config));
    invocation.stdin = Some(config.raw_yaml());
    invocation
}

/// `docker rm` of a processor container kept for committing.
pub fn remove_container_invocation(container_name: &str) -> Invocation {
    Invocation::new(DOCKER).args(["rm", container_name])
}

/// `docker commit` of a processor container into the local image.
pub fn commit_invocation(config: &Config, container_name: &str, created: DateTime<Utc>) -> Invocation {
    Invocation::new(DOCKER).args([
        "commit".to_string(),
        "--change".to_string(),
        format!(
            "LABEL org.opencontainers.image.created=\"{}\"",
            created.to_rfc3339_opts(SecondsFormat::Secs, true)
        ),
        container_name.to_string(),
        config.local_image(),
    ])
}
