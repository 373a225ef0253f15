//! Merged application configuration

use std::collections::BTreeMap;

use crate::defaults::{
    default_base_image, DEFAULT_BOOT_COMMAND, FILE_SEPARATOR, SELF_NAME_PLACEHOLDER,
};
use crate::layer::Layer;
use crate::merge::OverrideMerge;
use crate::schema::{LinkBinding, VolumeBinding};

/// Result of folding every layer of an application together.
///
/// Maps are ordered by key, so everything rendered from them is
/// deterministic.
#[derive(Debug, Clone)]
pub struct Config {
    /// Application name (the base document's file stem)
    pub name: String,
    pub base_image: String,
    pub run_image: String,
    pub boot_command: String,
    pub no_boot_command: bool,
    pub update_pups: bool,
    pub docker_args: String,
    pub templates: Vec<String>,
    pub expose: Vec<String>,
    pub params: BTreeMap<String, String>,
    pub env: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
    pub volumes: Vec<VolumeBinding>,
    pub links: Vec<LinkBinding>,
    layers: Vec<Layer>,
}

impl Config {
    /// Empty accumulator seeded with built-in defaults.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_image: default_base_image().to_string(),
            run_image: String::new(),
            boot_command: DEFAULT_BOOT_COMMAND.to_string(),
            no_boot_command: false,
            update_pups: false,
            docker_args: String::new(),
            templates: Vec::new(),
            expose: Vec::new(),
            params: BTreeMap::new(),
            env: BTreeMap::new(),
            labels: BTreeMap::new(),
            volumes: Vec::new(),
            links: Vec::new(),
            layers: Vec::new(),
        }
    }

    /// Fold a layer into this config and retain its raw text.
    pub fn merge_layer(&mut self, layer: Layer) {
        let doc = layer.doc().clone();

        self.base_image.merge_from(doc.base_image);
        self.run_image.merge_from(doc.run_image);
        self.boot_command.merge_from(doc.boot_command);
        self.no_boot_command.merge_from(doc.no_boot_command);
        self.update_pups.merge_from(doc.update_pups);
        self.docker_args.merge_from(doc.docker_args);
        self.templates.merge_from(doc.templates);
        self.expose.merge_from(doc.expose);
        self.params.merge_from(doc.params);
        self.env.merge_from(doc.env);
        self.labels.merge_from(doc.labels);
        self.volumes
            .merge_from(doc.volumes.into_iter().map(|v| v.volume).collect());
        self.links
            .merge_from(doc.links.into_iter().map(|l| l.link).collect());

        self.layers.push(layer);
    }

    /// Contributing layers: templates in listed order, then the base.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Raw layers joined with the `pups` file separator.
    pub fn raw_yaml(&self) -> String {
        self.layers
            .iter()
            .map(Layer::raw)
            .collect::<Vec<_>>()
            .join(FILE_SEPARATOR)
    }

    /// Boot command the image will run.
    ///
    /// `no_boot_command` always wins over an explicit `boot_command`.
    pub fn resolved_boot_command(&self) -> &str {
        if self.no_boot_command {
            DEFAULT_BOOT_COMMAND
        } else {
            &self.boot_command
        }
    }

    /// Replace the self-name placeholder with this config's name.
    pub fn substitute(&self, value: &str) -> String {
        substitute_name(value, &self.name)
    }

    /// Environment with placeholders substituted.
    pub fn resolved_env(&self) -> BTreeMap<String, String> {
        self.env
            .iter()
            .map(|(k, v)| (k.clone(), self.substitute(v)))
            .collect()
    }

    /// Labels with placeholders substituted.
    pub fn resolved_labels(&self) -> BTreeMap<String, String> {
        self.labels
            .iter()
            .map(|(k, v)| (k.clone(), self.substitute(v)))
            .collect()
    }

    /// Image tag used for locally built images.
    pub fn local_image(&self) -> String {
        format!("local_discourse/{}", self.name)
    }
}

/// Replace every `{{config}}` in `value` with `name`.
pub fn substitute_name(value: &str, name: &str) -> String {
    value.replace(SELF_NAME_PLACEHOLDER, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerOrigin;
    use std::path::Path;

    fn layer(origin: LayerOrigin, raw: &str) -> Layer {
        Layer::parse(Path::new("layer.yml"), origin, raw.to_string()).unwrap()
    }

    #[test]
    fn test_new_has_defaults() {
        let config = Config::new("app");
        assert_eq!(config.boot_command, DEFAULT_BOOT_COMMAND);
        assert_eq!(config.base_image, default_base_image());
        assert!(config.layers().is_empty());
    }

    #[test]
    fn test_forced_default_boot_wins() {
        let mut config = Config::new("app");
        config.merge_layer(layer(
            LayerOrigin::Base,
            "boot_command: /custom/boot\nno_boot_command: true\n",
        ));
        assert_eq!(config.boot_command, "/custom/boot");
        assert_eq!(config.resolved_boot_command(), DEFAULT_BOOT_COMMAND);
    }

    #[test]
    fn test_explicit_boot_command_without_force() {
        let mut config = Config::new("app");
        config.merge_layer(layer(LayerOrigin::Base, "boot_command: /custom/boot\n"));
        assert_eq!(config.resolved_boot_command(), "/custom/boot");
    }

    #[test]
    fn test_substitution_at_render_time_only() {
        let mut config = Config::new("foo");
        config.merge_layer(layer(LayerOrigin::Base, "env:\n  DB: '{{config}}-internal'\n"));
        assert_eq!(config.env["DB"], "{{config}}-internal");
        assert_eq!(config.resolved_env()["DB"], "foo-internal");
    }

    #[test]
    fn test_volume_list_replaced() {
        let mut config = Config::new("app");
        config.merge_layer(layer(
            LayerOrigin::Template,
            "volumes:\n  - volume: {host: /a, guest: /a}\n  - volume: {host: /b, guest: /b}\n",
        ));
        config.merge_layer(layer(
            LayerOrigin::Base,
            "volumes:\n  - volume: {host: data, guest: /data}\n",
        ));
        assert_eq!(config.volumes.len(), 1);
        assert_eq!(config.volumes[0].host, "data");
    }

    #[test]
    fn test_raw_yaml_order() {
        let mut config = Config::new("app");
        config.merge_layer(layer(LayerOrigin::Template, "params: {a: '1'}\n"));
        config.merge_layer(layer(LayerOrigin::Base, "params: {b: '2'}\n"));
        assert_eq!(
            config.raw_yaml(),
            format!("params: {{a: '1'}}\n{}params: {{b: '2'}}\n", FILE_SEPARATOR)
        );
    }
}
