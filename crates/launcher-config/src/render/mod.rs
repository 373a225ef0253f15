//! Renderers that turn a merged [`Config`](crate::Config) into build artifacts
//!
//! Every renderer is a pure function of the config; [`write`] puts the
//! results on disk.

pub mod cli;
pub mod compose;
pub mod dockerfile;
pub mod env;
pub mod write;

pub use cli::{label_args, link_args, port_args, render_fragment, volume_args, FragmentKind};
pub use compose::{
    is_named_volume, render_compose, ComposeBuild, ComposeFile, ComposeService, ComposeServices,
};
pub use dockerfile::render_dockerfile;
pub use env::{env_array, render_env};
pub use write::{
    write_compose, write_dockerfile, write_env, write_yaml_config, ArtifactPaths,
    COMPOSE_PUPS_ARGS,
};
