//! Shell env file rendering.

use crate::config::Config;

/// One `export KEY="value"` line per env entry, ordered by key.
///
/// Values are placeholder-substituted and double quotes are escaped.
pub fn render_env(config: &Config) -> String {
    config
        .resolved_env()
        .into_iter()
        .map(|(key, value)| format!("export {}=\"{}\"", key, value.replace('"', "\\\"")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `KEY=value` pairs for a child process environment.
pub fn env_array(config: &Config) -> Vec<(String, String)> {
    config.resolved_env().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_env_sorted_and_escaped() {
        let mut config = Config::new("foo");
        config.env.insert("ZED".into(), "last".into());
        config.env.insert("ALPHA".into(), "say \"hi\"".into());
        config.env.insert("HOST".into(), "{{config}}-internal".into());

        assert_eq!(
            render_env(&config),
            "export ALPHA=\"say \\\"hi\\\"\"\n\
             export HOST=\"foo-internal\"\n\
             export ZED=\"last\""
        );
    }

    #[test]
    fn test_render_env_empty() {
        assert_eq!(render_env(&Config::new("foo")), "");
    }

    #[test]
    fn test_env_array_substituted() {
        let mut config = Config::new("foo");
        config.env.insert("HOST".into(), "{{config}}.local".into());
        assert_eq!(
            env_array(&config),
            vec![("HOST".to_string(), "foo.local".to_string())]
        );
    }
}
