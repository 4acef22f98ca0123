//! Resolved connection settings for a single lint run.
//!
//! `Settings` is built once (by the CLI from flags and the config file) and
//! then only ever borrowed. Nothing in the kernel mutates it.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Port used when no SSH port is configured.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// How to treat the controller's SSH host key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostKeyPolicy {
    /// The key must already be in `~/.ssh/known_hosts`.
    #[default]
    Strict,
    /// Unknown keys are recorded in `known_hosts`; changed keys are rejected.
    AcceptNew,
    /// Accept any key (insecure, for throwaway controllers).
    AcceptAll,
}

impl fmt::Display for HostKeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::AcceptNew => write!(f, "accept-new"),
            Self::AcceptAll => write!(f, "accept-all"),
        }
    }
}

impl FromStr for HostKeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "accept-new" | "accept_new" => Ok(Self::AcceptNew),
            "accept-all" | "accept_all" => Ok(Self::AcceptAll),
            other => Err(format!(
                "unknown host key policy '{other}' (expected strict, accept-new or accept-all)"
            )),
        }
    }
}

/// Everything the engine needs to reach the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Root URL of the Jenkins controller, e.g. `https://jenkins.example.com`.
    pub http_url: Option<String>,
    /// Login for HTTP Basic auth.
    pub http_login: Option<String>,
    /// API token paired with `http_login`.
    pub http_token: Option<String>,
    /// Hostname of the controller's SSH endpoint.
    pub ssh_hostname: Option<String>,
    /// Port of the controller's SSH endpoint.
    pub ssh_port: u16,
    /// Remote user. `None` means the local account name.
    pub ssh_user: Option<String>,
    /// Private keys to try after the agent. Empty means the usual defaults.
    pub ssh_identity_files: Vec<PathBuf>,
    /// Host key verification policy.
    pub host_key_policy: HostKeyPolicy,
    /// known_hosts file to check and record keys in. `None` means
    /// `~/.ssh/known_hosts`.
    pub known_hosts_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            http_url: None,
            http_login: None,
            http_token: None,
            ssh_hostname: None,
            ssh_port: DEFAULT_SSH_PORT,
            ssh_user: None,
            ssh_identity_files: Vec::new(),
            host_key_policy: HostKeyPolicy::default(),
            known_hosts_file: None,
        }
    }
}

impl Settings {
    /// Settings that validate over HTTP against `url`.
    pub fn http(url: impl Into<String>) -> Self {
        Self {
            http_url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Settings that validate over SSH against `hostname:22`.
    pub fn ssh(hostname: impl Into<String>) -> Self {
        Self {
            ssh_hostname: Some(hostname.into()),
            ..Self::default()
        }
    }

    /// Attach HTTP Basic credentials.
    pub fn with_credentials(mut self, login: impl Into<String>, token: impl Into<String>) -> Self {
        self.http_login = Some(login.into());
        self.http_token = Some(token.into());
        self
    }

    /// Set the SSH port.
    pub fn with_ssh_port(mut self, port: u16) -> Self {
        self.ssh_port = port;
        self
    }

    /// Set the remote SSH user.
    pub fn with_ssh_user(mut self, user: impl Into<String>) -> Self {
        self.ssh_user = Some(user.into());
        self
    }

    /// Add a private key file to try after the agent.
    pub fn with_identity_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ssh_identity_files.push(path.into());
        self
    }

    /// Set the host key policy and, optionally, a non-default known_hosts file.
    pub fn with_host_keys(mut self, policy: HostKeyPolicy, known_hosts: Option<PathBuf>) -> Self {
        self.host_key_policy = policy;
        self.known_hosts_file = known_hosts;
        self
    }

    /// Turn empty strings into `None` so "configured" always means non-empty.
    pub fn normalized(mut self) -> Self {
        for field in [
            &mut self.http_url,
            &mut self.http_login,
            &mut self.http_token,
            &mut self.ssh_hostname,
            &mut self.ssh_user,
        ] {
            if field.as_deref().is_some_and(|s| s.trim().is_empty()) {
                *field = None;
            }
        }
        self
    }

    /// The configured controller URL, if non-empty.
    pub fn http_url(&self) -> Option<&str> {
        non_empty(&self.http_url)
    }

    /// The configured SSH hostname, if non-empty.
    pub fn ssh_hostname(&self) -> Option<&str> {
        non_empty(&self.ssh_hostname)
    }

    /// Login and token, only when both are present.
    ///
    /// A login without a token (or the reverse) is treated as no credentials.
    pub fn http_credentials(&self) -> Option<(&str, &str)> {
        Some((non_empty(&self.http_login)?, non_empty(&self.http_token)?))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
