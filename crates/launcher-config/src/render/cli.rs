//! `docker run` argument fragments
//!
//! The argument vectors feed invocations built by the launcher itself; the
//! string fragments are printed for shell scripts that assemble their own
//! `docker run` line.

use std::fmt;
use std::str::FromStr;

use crate::config::Config;

/// Kinds of fragment that can be printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Ports,
    Env,
    Labels,
    Args,
    Volumes,
    Links,
    RunImage,
    BootCommand,
    BaseImage,
    UpdatePups,
}

impl FragmentKind {
    pub const ALL: &'static [FragmentKind] = &[
        FragmentKind::Ports,
        FragmentKind::Env,
        FragmentKind::Labels,
        FragmentKind::Args,
        FragmentKind::Volumes,
        FragmentKind::Links,
        FragmentKind::RunImage,
        FragmentKind::BootCommand,
        FragmentKind::BaseImage,
        FragmentKind::UpdatePups,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentKind::Ports => "ports",
            FragmentKind::Env => "env",
            FragmentKind::Labels => "labels",
            FragmentKind::Args => "args",
            FragmentKind::Volumes => "volumes",
            FragmentKind::Links => "links",
            FragmentKind::RunImage => "run-image",
            FragmentKind::BootCommand => "boot-command",
            FragmentKind::BaseImage => "base-image",
            FragmentKind::UpdatePups => "update-pups",
        }
    }

    /// Comma separated list of accepted names, for error messages.
    pub fn names() -> String {
        Self::ALL
            .iter()
            .map(FragmentKind::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FragmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown parse type '{}', expected one of: {}", s, Self::names()))
    }
}

/// `-p host:container` for published ports, `--expose port` otherwise.
pub fn port_args(config: &Config) -> Vec<String> {
    config
        .expose
        .iter()
        .flat_map(|port| {
            let flag = if port.contains(':') { "-p" } else { "--expose" };
            [flag.to_string(), port.clone()]
        })
        .collect()
}

pub fn volume_args(config: &Config) -> Vec<String> {
    config
        .volumes
        .iter()
        .flat_map(|v| ["-v".to_string(), format!("{}:{}", v.host, v.guest)])
        .collect()
}

pub fn link_args(config: &Config) -> Vec<String> {
    config
        .links
        .iter()
        .flat_map(|l| ["--link".to_string(), format!("{}:{}", l.name, l.alias)])
        .collect()
}

/// `--label key=value` with placeholders substituted.
pub fn label_args(config: &Config) -> Vec<String> {
    config
        .resolved_labels()
        .into_iter()
        .flat_map(|(k, v)| ["--label".to_string(), format!("{}={}", k, v)])
        .collect()
}

/// Render one fragment as printed text.
///
/// `docker_args` are caller-supplied arguments prepended to the config's
/// own `docker_args` for [`FragmentKind::Args`].
pub fn render_fragment(config: &Config, kind: FragmentKind, docker_args: &str) -> String {
    match kind {
        FragmentKind::Ports => port_args(config).join(" "),
        FragmentKind::Env => config.env.keys().cloned().collect::<Vec<_>>().join("\n"),
        FragmentKind::Labels => label_args(config).join(" "),
        FragmentKind::Args => format!("{} {}", docker_args, config.docker_args)
            .trim()
            .to_string(),
        FragmentKind::Volumes => volume_args(config).join(" "),
        FragmentKind::Links => link_args(config).join(" "),
        FragmentKind::RunImage => config.run_image.clone(),
        FragmentKind::BootCommand => config.resolved_boot_command().to_string(),
        FragmentKind::BaseImage => config.base_image.clone(),
        FragmentKind::UpdatePups => config.update_pups.to_string(),
    }
}
