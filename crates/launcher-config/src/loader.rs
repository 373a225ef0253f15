//! Loads an application config and its templates from disk.

use std::path::Path;

use crate::config::Config;
use crate::error::ConfigResult;
use crate::layer::{Layer, LayerOrigin};

/// Load `<base_dir>/<name>.yml` and merge its templates.
///
/// Templates named in the base document are read from `template_dir` and
/// merged in listed order, then the base document is merged last so its
/// fields win. A missing or malformed template aborts the whole load.
/// With `include_templates == false` only the base document is merged.
pub fn load_config(
    base_dir: &Path,
    name: &str,
    include_templates: bool,
    template_dir: &Path,
) -> ConfigResult<Config> {
    let mut config = Config::new(name);

    let base_path = base_dir.join(format!("{}.yml", name));
    let base = Layer::read(&base_path, LayerOrigin::Base)?;

    if include_templates {
        for template in &base.doc().templates {
            let layer = Layer::read(&template_dir.join(template), LayerOrigin::Template)?;
            config.merge_layer(layer);
        }
    }

    config.merge_layer(base);

    tracing::debug!(
        name,
        layers = config.layers().len(),
        "merged application config"
    );
    Ok(config)
}
