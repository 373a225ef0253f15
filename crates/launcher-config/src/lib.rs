//! Layered YAML configuration for the launcher.
//!
//! An application is described by one base document (`<name>.yml`) which
//! lists reusable template fragments. The loader merges the templates in
//! listed order and the base document last, producing a [`Config`] that the
//! renderers turn into an env file, a Dockerfile, a compose descriptor and
//! the raw payload consumed by `pups` inside the container.

mod config;
mod defaults;
mod error;
mod layer;
mod loader;
mod merge;
pub mod render;
mod schema;

pub use config::{substitute_name, Config};
pub use defaults::{
    default_base_image, DEFAULT_BOOT_COMMAND, FILE_SEPARATOR, PUPS_BINARY, SELF_NAME_PLACEHOLDER,
    SHM_SIZE,
};
pub use error::{ConfigError, ConfigResult};
pub use layer::{Layer, LayerOrigin};
pub use loader::load_config;
pub use merge::OverrideMerge;
pub use schema::{ConfigDoc, LinkBinding, LinkEntry, VolumeBinding, VolumeEntry};
