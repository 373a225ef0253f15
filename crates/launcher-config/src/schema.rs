//! Strict YAML schema of a single config layer.
//!
//! Every recognized top-level key is listed here; anything else is a parse
//! error. `run` and `hooks` belong to `pups` and are only carried through
//! the raw payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

/// One parsed YAML document (base config or template)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigDoc {
    pub base_image: String,
    pub run_image: String,
    pub boot_command: String,
    /// Force the image to boot the default command.
    pub no_boot_command: bool,
    pub update_pups: bool,
    /// Extra arguments appended to `docker run`.
    pub docker_args: String,
    pub templates: Vec<String>,
    #[serde(deserialize_with = "scalar_list")]
    pub expose: Vec<String>,
    #[serde(deserialize_with = "scalar_map")]
    pub params: BTreeMap<String, String>,
    #[serde(deserialize_with = "scalar_map")]
    pub env: BTreeMap<String, String>,
    #[serde(deserialize_with = "scalar_map")]
    pub labels: BTreeMap<String, String>,
    pub volumes: Vec<VolumeEntry>,
    pub links: Vec<LinkEntry>,

    /// `pups` run directives, opaque to the merge.
    pub run: Option<Value>,
    /// `pups` hooks, opaque to the merge.
    pub hooks: Option<Value>,
}

/// `- volume: { host, guest }`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VolumeEntry {
    pub volume: VolumeBinding,
}

/// Host token (bind path or named volume) mounted at a guest path
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VolumeBinding {
    pub host: String,
    pub guest: String,
}

/// `- link: { name, alias }`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkEntry {
    pub link: LinkBinding,
}

/// Container link: target name plus alias inside this container
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkBinding {
    pub name: String,
    pub alias: String,
}

impl ConfigDoc {
    /// Parse a document, rejecting unknown keys.
    ///
    /// An empty (or comment-only) document parses to all defaults.
    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        match serde_yaml::from_str::<Value>(contents)? {
            Value::Null => Ok(Self::default()),
            value => serde_yaml::from_value(value),
        }
    }
}

/// Render a YAML scalar the way it reads in the source.
fn scalar_to_string<E: serde::de::Error>(value: Value) -> Result<String, E> {
    match value {
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        Value::Tagged(tagged) => scalar_to_string(tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => {
            Err(E::custom("expected a scalar value, found a collection"))
        }
    }
}

fn scalar_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?;
    raw.unwrap_or_default()
        .into_iter()
        .map(|(k, v)| scalar_to_string(v).map(|v| (k, v)))
        .collect()
}

fn scalar_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?;
    raw.unwrap_or_default()
        .into_iter()
        .map(scalar_to_string)
        .collect()
}
