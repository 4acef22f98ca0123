//! INI config file and the precedence rules that turn flags + file into
//! [`Settings`].
//!
//! ```ini
//! [http]
//! url = https://jenkins.example.com
//! login = alice
//! api_token = 11aa22bb
//!
//! [ssh]
//! hostname = jenkins.example.com
//! port = 53801
//! known_hosts_file = ~/.ssh/known_hosts_jenkins  ; optional
//! ```
//!
//! Comments start with `#` or `;`, either on their own line or after
//! whitespace at the end of a value. Flags override the file, the file
//! overrides defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;
use jflint_kernel::{DEFAULT_SSH_PORT, HostKeyPolicy, Settings};
use thiserror::Error;
use tracing::debug;

use crate::args::Cli;

/// A line of the config file that could not be understood.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

impl ConfigError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Values read from the config file. Everything is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    pub http_url: Option<String>,
    pub http_login: Option<String>,
    pub http_api_token: Option<String>,
    pub ssh_hostname: Option<String>,
    pub ssh_port: Option<u16>,
    pub ssh_user: Option<String>,
    pub ssh_identity_files: Vec<PathBuf>,
    pub host_key_policy: Option<HostKeyPolicy>,
    pub known_hosts_file: Option<PathBuf>,
}

impl FileConfig {
    /// Parse INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut config = FileConfig::default();
        let mut section: Option<String> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(rest) = line.strip_prefix('[') {
                let name = rest
                    .strip_suffix(']')
                    .ok_or_else(|| ConfigError::new(line_no, "unterminated section header"))?;
                section = Some(name.trim().to_ascii_lowercase());
                continue;
            }

            let (key, value) = split_entry(line).ok_or_else(|| {
                ConfigError::new(line_no, format!("expected `key = value`, got `{line}`"))
            })?;
            let Some(section) = section.as_deref() else {
                let message = format!("`{key}` appears before any section");
                return Err(ConfigError::new(line_no, message));
            };

            match (section, key.to_ascii_lowercase().as_str()) {
                ("http", "url") => config.http_url = Some(value.to_string()),
                ("http", "login") => config.http_login = Some(value.to_string()),
                ("http", "api_token") => config.http_api_token = Some(value.to_string()),
                ("ssh", "hostname") => config.ssh_hostname = Some(value.to_string()),
                ("ssh", "port") => {
                    let port = value.parse::<u16>().map_err(|_| {
                        let message =
                            format!("port must be a number between 0 and 65535, got `{value}`");
                        ConfigError::new(line_no, message)
                    })?;
                    config.ssh_port = Some(port);
                }
                ("ssh", "user") => config.ssh_user = Some(value.to_string()),
                ("ssh", "identity_file") => config.ssh_identity_files.push(expand_tilde(value)),
                ("ssh", "host_key_policy") => {
                    let policy = value
                        .parse()
                        .map_err(|e: String| ConfigError::new(line_no, e))?;
                    config.host_key_policy = Some(policy);
                }
                ("ssh", "known_hosts_file") => config.known_hosts_file = Some(expand_tilde(value)),
                (section, key) => debug!(section, key, "ignoring unknown config key"),
            }
        }

        Ok(config)
    }
}

/// Split `key = value` or `key: value` at whichever delimiter comes first.
fn split_entry(line: &str) -> Option<(&str, &str)> {
    let pos = line.find(['=', ':'])?;
    let key = line[..pos].trim();
    if key.is_empty() {
        return None;
    }
    Some((key, strip_inline_comment(&line[pos + 1..]).trim()))
}

/// Cut a trailing `; comment` or `# comment`. The marker must follow
/// whitespace, so `#` inside a URL fragment survives.
fn strip_inline_comment(value: &str) -> &str {
    let mut prev_is_space = false;
    for (idx, c) in value.char_indices() {
        if prev_is_space && (c == ';' || c == '#') {
            return &value[..idx];
        }
        prev_is_space = c.is_whitespace();
    }
    value
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(dirs) = BaseDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}

/// `<config dir>/jflint/config.ini`, e.g. `~/.config/jflint/config.ini`.
pub fn default_path() -> Option<PathBuf> {
    BaseDirs::new().map(|d| d.config_dir().join("jflint").join("config.ini"))
}

/// Load the config file.
///
/// An explicit path must exist. Without one, the default path is read if it
/// exists and otherwise an empty config is used.
pub fn load(explicit: Option<&Path>) -> Result<FileConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_path().filter(|p| p.is_file()) {
            Some(path) => path,
            None => {
                debug!("no config file found, using flags only");
                return Ok(FileConfig::default());
            }
        },
    };

    debug!(path = %path.display(), "reading config file");
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    FileConfig::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
}

/// Merge flags over file values into the settings for this run.
pub fn resolve(cli: &Cli, file: FileConfig) -> Settings {
    Settings {
        http_url: cli.jenkins_url.clone().or(file.http_url),
        http_login: cli.jenkins_login.clone().or(file.http_login),
        http_token: cli.jenkins_api_token.clone().or(file.http_api_token),
        ssh_hostname: cli.jenkins_hostname.clone().or(file.ssh_hostname),
        ssh_port: cli.jenkins_ssh_port.or(file.ssh_port).unwrap_or(DEFAULT_SSH_PORT),
        ssh_user: cli.ssh_user.clone().or(file.ssh_user),
        ssh_identity_files: if cli.ssh_identity.is_empty() {
            file.ssh_identity_files
        } else {
            cli.ssh_identity.clone()
        },
        host_key_policy: cli.host_key_policy.or(file.host_key_policy).unwrap_or_default(),
        known_hosts_file: cli.known_hosts.clone().or(file.known_hosts_file),
    }
    .normalized()
}
