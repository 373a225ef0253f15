//! Dockerfile generation.
//!
//! The payload is piped into `pups` and deleted in the same `RUN` step so
//! it never survives as its own image layer.

use crate::config::Config;
use crate::defaults::PUPS_BINARY;

/// Path the payload is copied to inside the build.
const TEMP_PAYLOAD: &str = "/temp-config.yaml";

/// Render the Dockerfile for `config`.
///
/// `payload` is the build-context path of the raw YAML payload and
/// `pups_args` extra arguments for the processor. With `bake_env` every env
/// key is also written to an `ENV` line, so its value ends up retrievable
/// from the built image.
pub fn render_dockerfile(config: &Config, payload: &str, pups_args: &str, bake_env: bool) -> String {
    let env = config.resolved_env();
    let mut lines = Vec::with_capacity(env.len() * 2 + 4);

    lines.push(format!("FROM {}", config.base_image));
    lines.extend(env.keys().map(|key| format!("ARG {}", key)));
    if bake_env {
        lines.extend(env.iter().map(|(key, value)| env_line(key, value)));
    }
    lines.push(format!("COPY {} {}", payload, TEMP_PAYLOAD));

    let pups = [PUPS_BINARY, pups_args.trim(), "--stdin"]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    lines.push(format!(
        "RUN cat {tmp} | {pups} && rm {tmp}",
        tmp = TEMP_PAYLOAD,
        pups = pups
    ));
    lines.push(format!("CMD {}", config.resolved_boot_command()));

    lines.join("\n")
}

/// Baked `ENV` line defaulting `key` to `value`.
///
/// A Dockerfile instruction cannot span lines, so a multi-line value is
/// left to the build argument alone.
fn env_line(key: &str, value: &str) -> String {
    if value.contains(['\n', '\r']) {
        format!("ENV {}=${{{}}}", key, key)
    } else {
        format!("ENV {}=\"${{{}:-{}}}\"", key, key, escape(value))
    }
}

/// Escape a value for the default of a double-quoted `${K:-...}` word.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '}') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
