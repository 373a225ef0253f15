//! Built-in defaults and fixed tokens shared by the loader and renderers.

/// Boot command used when a config doesn't set one, or forces the default.
pub const DEFAULT_BOOT_COMMAND: &str = "/sbin/boot";

/// Placeholder replaced with the application name at render time.
pub const SELF_NAME_PLACEHOLDER: &str = "{{config}}";

/// Separator between raw layers in the concatenated payload.
///
/// The spelling is what `pups` splits on; do not correct it.
pub const FILE_SEPARATOR: &str = "_FILE_SEPERATOR_";

/// Location of the configuration processor inside the image.
pub const PUPS_BINARY: &str = "/usr/local/bin/pups";

/// Shared memory size for build and run containers.
pub const SHM_SIZE: &str = "512m";

const BASE_IMAGE_AARCH64: &str = "discourse/base:aarch64";
const BASE_IMAGE_AMD64: &str = "discourse/base:2.0.20231004-0028";

/// Platform-appropriate default base image.
pub fn default_base_image() -> &'static str {
    if cfg!(target_arch = "aarch64") {
        BASE_IMAGE_AARCH64
    } else {
        BASE_IMAGE_AMD64
    }
}
