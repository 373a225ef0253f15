//! Launcher CLI
//!
//! Entry point for the `launcher` command-line tool.

use clap::{Parser, Subcommand};
use launcher::{
    logging, CancelToken, Launcher, LauncherError, Orchestrator, PupsOptions, RunArgs,
    RunOutcome, SignalBridge, LOAD_ERROR_HINT,
};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "launcher")]
#[command(about = "Build and configure application containers from layered YAML", version)]
struct Cli {
    /// Directory holding <config>.yml files
    #[arg(long, global = true, default_value = "./containers")]
    conf_dir: PathBuf,

    /// Directory template paths are resolved against
    #[arg(long, global = true, default_value = ".")]
    templates_dir: PathBuf,

    /// Parent directory for generated files
    #[arg(long, global = true, default_value = "./tmp")]
    build_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a base image with no dependencies
    Build {
        /// Bake the configured environment into the image
        #[arg(short = 'e', long)]
        bake_env: bool,

        config: String,
    },

    /// Configure and save an image with all dependencies and environment
    /// baked in. Updates themes and precompiles all assets.
    Configure { config: String },

    /// Run migration tasks on an image
    Migrate { config: String },

    /// Run pups inside the local image
    Pups {
        /// Additional pups arguments
        #[arg(short = 'p', long, default_value = "")]
        pups_args: String,

        /// Commit the resulting container to local_discourse/<config>
        #[arg(short = 's', long)]
        save: bool,

        /// Skip ember compile
        #[arg(long)]
        skip_ember: bool,

        config: String,
    },

    /// Create docker compose setup
    DockerCompose {
        /// Bake the configured environment into the image after build.
        /// Requires a 'source <config>.env' before running.
        #[arg(short = 'e', long)]
        bake_env: bool,

        config: String,
    },

    /// Print raw config, concatenated in pups format
    RawYaml { config: String },

    /// Parse and print config for docker
    Parse {
        /// Type of docker run argument to print. One of: ports, env, labels,
        /// args, volumes, links, run-image, boot-command, base-image, update-pups
        #[arg(short = 't', long = "type")]
        kind: String,

        /// Extra arguments to pass when running docker
        #[arg(long, default_value = "")]
        docker_args: String,

        config: String,
    },

    /// Clean generated files for config
    Clean { config: String },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init() {
        eprintln!("Error initializing logging: {}", e);
    }

    let token = CancelToken::new();
    let bridge = SignalBridge::new(token.clone());
    let listener = match bridge.install() {
        Ok(listener) => listener,
        Err(e) => fail(&LauncherError::from(e)),
    };

    let args = RunArgs {
        conf_dir: cli.conf_dir,
        templates_dir: cli.templates_dir,
        output_dir: cli.build_dir,
    };
    let launcher = Launcher::new(args, Orchestrator::system(), token);

    let result = run_command(&launcher, cli.command);
    drop(listener);

    match result {
        Ok(outcome) => finish(outcome),
        Err(e) => fail(&e),
    }
}

fn run_command(launcher: &Launcher, command: Commands) -> Result<RunOutcome, LauncherError> {
    match command {
        Commands::Build { bake_env, config } => launcher.build(&config, bake_env),
        Commands::Configure { config } => launcher.configure(&config),
        Commands::Migrate { config } => launcher.migrate(&config),
        Commands::Pups {
            pups_args,
            save,
            skip_ember,
            config,
        } => launcher.pups(
            &config,
            &PupsOptions {
                pups_args,
                skip_ember,
                commit: save,
            },
        ),
        Commands::DockerCompose { bake_env, config } => {
            launcher.docker_compose(&config, bake_env)?;
            Ok(RunOutcome::Succeeded)
        }
        Commands::RawYaml { config } => {
            print!("{}", launcher.raw_yaml(&config)?);
            Ok(RunOutcome::Succeeded)
        }
        Commands::Parse {
            kind,
            docker_args,
            config,
        } => {
            print!("{}", launcher.parse(&config, &kind, &docker_args)?);
            Ok(RunOutcome::Succeeded)
        }
        Commands::Clean { config } => {
            launcher.clean(&config)?;
            Ok(RunOutcome::Succeeded)
        }
    }
}

fn finish(outcome: RunOutcome) -> ! {
    if let Some(message) = outcome.message() {
        eprintln!("{}", message);
    }
    process::exit(outcome.exit_code());
}

fn fail(error: &LauncherError) -> ! {
    if error.is_load_error() {
        eprintln!("{}", LOAD_ERROR_HINT);
    }
    eprintln!("Error: {}", error);
    process::exit(1);
}
