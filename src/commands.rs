//! Launcher operations
//!
//! Each operation loads one application's configuration, then either renders
//! artifacts or drives docker through the [`Orchestrator`]. Operations that
//! run a child return its [`RunOutcome`]; the caller maps that to an exit
//! status.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use launcher_config::render::{
    render_fragment, write_compose, write_yaml_config, ArtifactPaths, FragmentKind,
};
use launcher_config::{load_config, Config};

use crate::cancel::CancelToken;
use crate::docker::{
    build_invocation, commit_invocation, pups_invocation, remove_container_invocation, PupsRun,
    CONFIGURE_PUPS_ARGS, MIGRATE_PUPS_ARGS,
};
use crate::error::{LauncherError, Result};
use crate::run::{Orchestrator, RunOutcome};

/// Where configuration is read from and artifacts are written to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunArgs {
    /// Directory holding `<name>.yml`
    pub conf_dir: PathBuf,
    /// Directory template paths are resolved against
    pub templates_dir: PathBuf,
    /// Parent of the per-application output directories
    pub output_dir: PathBuf,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            conf_dir: PathBuf::from("./containers"),
            templates_dir: PathBuf::from("."),
            output_dir: PathBuf::from("./tmp"),
        }
    }
}

/// Options for a processor run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PupsOptions {
    pub pups_args: String,
    pub skip_ember: bool,
    /// Commit the container to `local_discourse/<name>` afterwards
    pub commit: bool,
}

/// Runs launcher operations for one invocation of the CLI
#[derive(Debug, Clone)]
pub struct Launcher {
    args: RunArgs,
    orchestrator: Orchestrator,
    token: CancelToken,
}

impl Launcher {
    pub fn new(args: RunArgs, orchestrator: Orchestrator, token: CancelToken) -> Self {
        Self {
            args,
            orchestrator,
            token,
        }
    }

    pub fn args(&self) -> &RunArgs {
        &self.args
    }

    /// Load `<name>.yml` with its templates.
    pub fn load(&self, name: &str) -> Result<Config> {
        Ok(load_config(
            &self.args.conf_dir,
            name,
            true,
            &self.args.templates_dir,
        )?)
    }

    /// Output directory owned by application `name`
    pub fn output_dir(&self, name: &str) -> PathBuf {
        self.args.output_dir.join(name)
    }

    fn ensure_output_dir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.output_dir(name);
        fs::create_dir_all(&dir).map_err(|source| LauncherError::OutputDir {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }

    /// Build the base image with the Dockerfile on stdin.
    ///
    /// Generated files are cleaned up after a successful build.
    pub fn build(&self, name: &str, bake_env: bool) -> Result<RunOutcome> {
        let config = self.load(name)?;
        let dir = self.ensure_output_dir(name)?;
        write_yaml_config(&config, &dir)?;

        let outcome = self
            .orchestrator
            .run(&build_invocation(&config, &dir, bake_env), &self.token)?;
        if outcome.is_success() {
            self.clean_quietly(name);
        }
        Ok(outcome)
    }

    /// Run the processor inside `local_discourse/<name>`.
    pub fn pups(&self, name: &str, options: &PupsOptions) -> Result<RunOutcome> {
        let config = self.load(name)?;
        let mut run = PupsRun::new(options.pups_args.clone(), options.skip_ember);
        // A committed container must outlive the run.
        run.remove_container = !options.commit;

        let outcome = self
            .orchestrator
            .run(&pups_invocation(&config, &run), &self.token)?;
        if !options.commit {
            if outcome.is_success() {
                self.clean_quietly(name);
            }
            return Ok(outcome);
        }

        let result = if outcome.is_success() {
            self.clean_quietly(name);
            self.orchestrator.run(
                &commit_invocation(&config, &run.container_name, Utc::now()),
                &self.token,
            )
        } else {
            Ok(outcome)
        };
        self.remove_container(&run.container_name);
        Ok(result?)
    }

    /// Runs even after an interrupt, so it does not observe `self.token`.
    fn remove_container(&self, container_name: &str) {
        match self
            .orchestrator
            .run(&remove_container_invocation(container_name), &CancelToken::new())
        {
            Ok(RunOutcome::Succeeded) => {}
            Ok(outcome) => tracing::warn!(
                container = %container_name,
                outcome = ?outcome,
                "failed to remove processor container"
            ),
            Err(e) => tracing::warn!(
                container = %container_name,
                error = %e,
                "failed to remove processor container"
            ),
        }
    }

    /// Precompile and save an image with all dependencies baked in.
    pub fn configure(&self, name: &str) -> Result<RunOutcome> {
        self.pups(
            name,
            &PupsOptions {
                pups_args: CONFIGURE_PUPS_ARGS.to_string(),
                skip_ember: false,
                commit: true,
            },
        )
    }

    /// Run migrations in the local image.
    pub fn migrate(&self, name: &str) -> Result<RunOutcome> {
        self.pups(
            name,
            &PupsOptions {
                pups_args: MIGRATE_PUPS_ARGS.to_string(),
                skip_ember: true,
                commit: false,
            },
        )
    }

    /// Write the docker-compose setup; returns the output directory.
    pub fn docker_compose(&self, name: &str, bake_env: bool) -> Result<PathBuf> {
        let config = self.load(name)?;
        let dir = self.ensure_output_dir(name)?;
        write_compose(&config, &dir, bake_env)?;
        Ok(dir)
    }

    /// The concatenated raw layers in processor format.
    pub fn raw_yaml(&self, name: &str) -> Result<String> {
        Ok(self.load(name)?.raw_yaml())
    }

    /// One command-line fragment, by type name.
    pub fn parse(&self, name: &str, kind: &str, docker_args: &str) -> Result<String> {
        let kind: FragmentKind = kind.parse().map_err(LauncherError::UnknownParseType)?;
        let config = self.load(name)?;
        Ok(render_fragment(&config, kind, docker_args))
    }

    /// Remove generated files, then the output directory itself.
    ///
    /// Missing files are skipped; the directory must exist and be empty
    /// afterwards.
    pub fn clean(&self, name: &str) -> Result<()> {
        let paths = ArtifactPaths::new(&self.output_dir(name), name);
        for file in paths.files() {
            remove_if_present(file)?;
        }
        fs::remove_dir(&paths.dir).map_err(|source| LauncherError::Clean {
            path: paths.dir.clone(),
            source,
        })?;
        tracing::debug!(dir = %paths.dir.display(), "cleaned output directory");
        Ok(())
    }

    fn clean_quietly(&self, name: &str) {
        if let Err(e) = self.clean(name) {
            tracing::debug!(error = %e, "clean after run skipped");
        }
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(LauncherError::Clean {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    use crate::mock::MockSpawner;

    fn launcher(root: &Path) -> Launcher {
        let args = RunArgs {
            conf_dir: root.join("containers"),
            templates_dir: root.to_path_buf(),
            output_dir: root.join("tmp"),
        };
        Launcher::new(
            args,
            Orchestrator::new(Arc::new(MockSpawner::default())),
            CancelToken::new(),
        )
    }

    #[test]
    fn test_default_run_args() {
        let args = RunArgs::default();
        assert_eq!(args.conf_dir, PathBuf::from("./containers"));
        assert_eq!(args.templates_dir, PathBuf::from("."));
        assert_eq!(args.output_dir, PathBuf::from("./tmp"));
    }

    #[test]
    fn test_missing_config_is_load_error() {
        let dir = TempDir::new().unwrap();
        let err = launcher(dir.path()).raw_yaml("nope").unwrap_err();
        assert!(err.is_load_error());
    }

    #[test]
    fn test_unknown_parse_type_checked_first() {
        let dir = TempDir::new().unwrap();
        let err = launcher(dir.path()).parse("nope", "bogus", "").unwrap_err();
        assert!(matches!(err, LauncherError::UnknownParseType(_)));
        assert!(!err.is_load_error());
    }

    #[test]
    fn test_clean_missing_dir_errors() {
        let dir = TempDir::new().unwrap();
        let err = launcher(dir.path()).clean("web").unwrap_err();
        assert!(matches!(err, LauncherError::Clean { .. }));
    }

    #[test]
    fn test_clean_removes_known_files_only() {
        let dir = TempDir::new().unwrap();
        let launcher = launcher(dir.path());
        let out = launcher.output_dir("web");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("web.env"), "").unwrap();
        fs::write(out.join("Dockerfile.web"), "").unwrap();

        launcher.clean("web").unwrap();
        assert!(!out.exists());

        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("notes.txt"), "").unwrap();
        assert!(launcher.clean("web").is_err());
        assert!(out.join("notes.txt").exists());
    }
}
