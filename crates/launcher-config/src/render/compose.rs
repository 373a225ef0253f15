//! docker-compose descriptor generation

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::Serialize;

use crate::config::Config;
use crate::defaults::SHM_SIZE;

/// Env keys forced on so the container creates and migrates its database.
const BOOT_FLAGS: &[(&str, &str)] = &[("CREATE_DB_ON_BOOT", "1"), ("MIGRATE_ON_BOOT", "1")];

/// Top-level compose document
#[derive(Debug, Clone, Serialize)]
pub struct ComposeFile {
    pub services: ComposeServices,
    /// Named (docker-managed) volumes, declared without attributes
    pub volumes: BTreeMap<String, Option<()>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComposeServices {
    pub app: ComposeService,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComposeService {
    pub build: ComposeBuild,
    pub volumes: Vec<String>,
    pub links: Vec<String>,
    pub environment: BTreeMap<String, String>,
    pub ports: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComposeBuild {
    pub dockerfile: String,
    pub labels: BTreeMap<String, String>,
    pub shm_size: String,
    /// Build argument names only; values come from the caller's environment
    pub args: Vec<String>,
    pub no_cache: bool,
}

impl ComposeFile {
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// A named volume starts with a letter; bind mounts start with `/` or `.`
const NAMED_VOLUME_PATTERN: &str = "^[A-Za-z]";

/// True when a volume host token names a docker volume rather than a bind
/// mount path.
pub fn is_named_volume(host: &str) -> bool {
    static NAMED: OnceLock<Option<Regex>> = OnceLock::new();
    NAMED
        .get_or_init(|| Regex::new(NAMED_VOLUME_PATTERN).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(host))
}

/// Build the compose document for `config`.
pub fn render_compose(config: &Config) -> ComposeFile {
    let mut environment = config.resolved_env();
    for (key, value) in BOOT_FLAGS {
        environment.insert(key.to_string(), value.to_string());
    }

    let volumes = config
        .volumes
        .iter()
        .map(|v| format!("{}:{}", v.host, v.guest))
        .collect();
    let named_volumes = config
        .volumes
        .iter()
        .filter(|v| is_named_volume(&v.host))
        .map(|v| (v.host.clone(), None))
        .collect();

    ComposeFile {
        services: ComposeServices {
            app: ComposeService {
                build: ComposeBuild {
                    dockerfile: format!("./Dockerfile.{}", config.name),
                    labels: config.resolved_labels(),
                    shm_size: SHM_SIZE.to_string(),
                    args: config.env.keys().cloned().collect(),
                    no_cache: true,
                },
                volumes,
                links: config
                    .links
                    .iter()
                    .map(|l| format!("{}:{}", l.name, l.alias))
                    .collect(),
                environment,
                ports: config.expose.clone(),
            },
        },
        volumes: named_volumes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{LinkBinding, VolumeBinding};
    use serde_yaml::Value;

    fn sample() -> Config {
        let mut config = Config::new("foo");
        config.env.insert("DB_HOST".into(), "{{config}}-internal".into());
        config.labels.insert("app_name".into(), "{{config}}".into());
        config.expose = vec!["80:80".into(), "2222".into()];
        config.volumes = vec![
            VolumeBinding { host: "data_volume".into(), guest: "/data".into() },
            VolumeBinding { host: "/srv/data".into(), guest: "/shared".into() },
        ];
        config.links = vec![LinkBinding { name: "db".into(), alias: "postgres".into() }];
        config
    }

    #[test]
    fn test_named_volume_detection() {
        assert!(is_named_volume("data_volume"));
        assert!(is_named_volume("Z"));
        assert!(!is_named_volume("/srv/data"));
        assert!(!is_named_volume("./relative"));
        assert!(!is_named_volume("1data"));
        assert!(!is_named_volume(""));
    }

    #[test]
    fn test_named_volume_pattern_compiles() {
        assert!(Regex::new(NAMED_VOLUME_PATTERN).is_ok());
    }

    #[test]
    fn test_compose_structure() {
        let compose = render_compose(&sample());
        let app = &compose.services.app;

        assert_eq!(app.build.dockerfile, "./Dockerfile.foo");
        assert_eq!(app.build.shm_size, "512m");
        assert!(app.build.no_cache);
        assert_eq!(app.build.args, vec!["DB_HOST"]);
        assert_eq!(app.build.labels["app_name"], "foo");
        assert_eq!(app.environment["DB_HOST"], "foo-internal");
        assert_eq!(app.environment["CREATE_DB_ON_BOOT"], "1");
        assert_eq!(app.environment["MIGRATE_ON_BOOT"], "1");
        assert_eq!(app.links, vec!["db:postgres"]);
        assert_eq!(app.volumes, vec!["data_volume:/data", "/srv/data:/shared"]);
        assert_eq!(app.ports, vec!["80:80", "2222"]);
        assert_eq!(compose.volumes.keys().collect::<Vec<_>>(), vec!["data_volume"]);
    }

    #[test]
    fn test_boot_flags_override_configured_values() {
        let mut config = sample();
        config.env.insert("MIGRATE_ON_BOOT".into(), "0".into());
        let compose = render_compose(&config);
        assert_eq!(compose.services.app.environment["MIGRATE_ON_BOOT"], "1");
    }

    #[test]
    fn test_compose_yaml_output() {
        let yaml = render_compose(&sample()).to_yaml().unwrap();
        let doc: Value = serde_yaml::from_str(&yaml).unwrap();

        let volumes = doc["volumes"].as_mapping().unwrap();
        assert_eq!(volumes.len(), 1);
        assert!(volumes.contains_key("data_volume"));
        assert!(doc["volumes"]["data_volume"].is_null());
        assert_eq!(doc["services"]["app"]["build"]["no_cache"], Value::Bool(true));
        assert_eq!(
            doc["services"]["app"]["environment"]["DB_HOST"],
            Value::from("foo-internal")
        );
        assert!(!yaml.contains("{{config}}"));
    }
}
