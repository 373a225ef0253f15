//! End-to-end rendering of the `test` fixture application.

use std::fs;
use std::path::{Path, PathBuf};

use launcher_config::render::{
    render_compose, render_dockerfile, render_env, render_fragment, write_compose,
    write_yaml_config, ArtifactPaths, FragmentKind,
};
use launcher_config::{load_config, Config, FILE_SEPARATOR};
use tempfile::TempDir;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture() -> Config {
    load_config(&fixtures().join("containers"), "test", true, &fixtures()).unwrap()
}

#[test]
fn test_fixture_loads_templates_then_base() {
    let config = load_fixture();

    assert_eq!(config.layers().len(), 3);
    // web template was listed last, base sets it explicitly
    assert_eq!(config.env["UNICORN_WORKERS"], "3");
    assert_eq!(config.env["RAILS_ENV"], "production");
    assert_eq!(config.env["DISCOURSE_DB_SOCKET"], "/var/run/postgresql");
    assert_eq!(config.params["version"], "tests-passed");
    assert_eq!(config.params["db_shared_buffers"], "256MB");
}

#[test]
fn test_fixture_raw_yaml() {
    let raw = load_fixture().raw_yaml();

    assert!(raw.contains("DISCOURSE_DEVELOPER_EMAILS: 'me@example.com,you@example.com'"));
    assert!(raw.contains("version: tests-passed"));
    assert!(raw.contains("path: /etc/service/nginx/run"));

    let segments: Vec<&str> = raw.split(FILE_SEPARATOR).collect();
    assert_eq!(segments.len(), 3);
    assert_eq!(
        segments[0],
        fs::read_to_string(fixtures().join("templates/postgres.template.yml")).unwrap()
    );
    assert_eq!(
        segments[2],
        fs::read_to_string(fixtures().join("containers/test.yml")).unwrap()
    );
}

#[test]
fn test_placeholder_rendered_everywhere() {
    let config = load_fixture();

    let env = render_env(&config);
    assert!(env.contains("export DISCOURSE_REDIS_HOST=\"test-internal\""));
    assert!(!env.contains("{{config}}"));

    let dockerfile = render_dockerfile(&config, "test.config.yaml", "", true);
    assert!(dockerfile
        .lines()
        .any(|l| l.starts_with("ENV DISCOURSE_REDIS_HOST=") && l.contains("test-internal")));

    let compose = render_compose(&config);
    assert_eq!(
        compose.services.app.environment["DISCOURSE_REDIS_HOST"],
        "test-internal"
    );
    assert_eq!(compose.services.app.build.labels["app_name"], "test");
}

#[test]
fn test_named_volumes_declared() {
    let compose = render_compose(&load_fixture());
    assert!(compose.volumes.contains_key("data_volume"));
    assert!(!compose.volumes.contains_key("/var/discourse/shared/standalone"));
}

#[test]
fn test_env_lines_sorted() {
    let env = render_env(&load_fixture());
    let keys: Vec<&str> = env
        .lines()
        .map(|l| l.trim_start_matches("export ").split('=').next().unwrap())
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn test_fragments_from_fixture() {
    let config = load_fixture();
    assert_eq!(
        render_fragment(&config, FragmentKind::Ports, ""),
        "-p 80:80 -p 443:443"
    );
    assert_eq!(
        render_fragment(&config, FragmentKind::Volumes, ""),
        "-v /var/discourse/shared/standalone:/shared -v data_volume:/var/log"
    );
    assert_eq!(render_fragment(&config, FragmentKind::Links, ""), "--link data:data");
}

#[test]
fn test_write_yaml_config_to_dir() {
    let out = TempDir::new().unwrap();
    let path = write_yaml_config(&load_fixture(), out.path()).unwrap();

    assert_eq!(path, out.path().join("test.config.yaml"));
    let contents = fs::read_to_string(path).unwrap();
    assert!(contents.contains("DISCOURSE_DEVELOPER_EMAILS: 'me@example.com,you@example.com'"));
}

#[test]
fn test_write_compose_setup() {
    let out = TempDir::new().unwrap();
    write_compose(&load_fixture(), out.path(), false).unwrap();

    let paths = ArtifactPaths::new(out.path(), "test");
    let env = fs::read_to_string(&paths.env).unwrap();
    assert!(env.contains("export DISCOURSE_HOSTNAME=\"test.example.com\""));
    let dockerfile = fs::read_to_string(&paths.dockerfile).unwrap();
    assert!(dockerfile.contains("RUN cat /temp-config.yaml"));
    let compose = fs::read_to_string(&paths.compose).unwrap();
    assert!(compose.contains("build:"));
    assert!(compose.contains("CREATE_DB_ON_BOOT"));
}
