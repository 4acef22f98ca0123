//! russh client handler: host key verification and connect-error classification.

use std::path::PathBuf;

use russh::client;
use russh::keys::PublicKey;
use russh::keys::known_hosts;
use tracing::{info, warn};

use crate::error::SshConnectError;
use crate::settings::HostKeyPolicy;

/// Checks the server key against known_hosts per the configured policy.
pub(super) struct HostKeyCheck {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
    /// `None` means `~/.ssh/known_hosts`.
    known_hosts: Option<PathBuf>,
}

impl HostKeyCheck {
    pub(super) fn new(
        host: &str,
        port: u16,
        policy: HostKeyPolicy,
        known_hosts: Option<PathBuf>,
    ) -> Self {
        Self {
            host: host.to_string(),
            port,
            policy,
            known_hosts,
        }
    }

    fn is_known(&self, key: &PublicKey) -> Result<bool, russh::keys::Error> {
        match &self.known_hosts {
            Some(path) => known_hosts::check_known_hosts_path(&self.host, self.port, key, path),
            None => known_hosts::check_known_hosts(&self.host, self.port, key),
        }
    }

    fn learn(&self, key: &PublicKey) -> Result<(), russh::keys::Error> {
        match &self.known_hosts {
            Some(path) => known_hosts::learn_known_hosts_path(&self.host, self.port, key, path),
            None => known_hosts::learn_known_hosts(&self.host, self.port, key),
        }
    }
}

/// Failures raised while the connection is being set up.
#[derive(Debug)]
pub(super) enum HandlerError {
    Russh(russh::Error),
    UnknownHostKey,
    ChangedHostKey { line: usize },
    KnownHosts(String),
}

impl From<russh::Error> for HandlerError {
    fn from(err: russh::Error) -> Self {
        HandlerError::Russh(err)
    }
}

impl HandlerError {
    /// Fold into the public error kinds.
    pub(super) fn classify(self, host: &str, port: u16) -> SshConnectError {
        match self {
            HandlerError::Russh(err) => classify_russh(err, host, port),
            HandlerError::UnknownHostKey => SshConnectError::HostKey {
                host: host.to_string(),
                reason: "the key is not in known_hosts \
                         (use --host-key-policy accept-new to record it)"
                    .to_string(),
            },
            HandlerError::ChangedHostKey { line } => SshConnectError::HostKey {
                host: host.to_string(),
                reason: format!(
                    "the key differs from the one recorded in known_hosts line {line}"
                ),
            },
            HandlerError::KnownHosts(reason) => SshConnectError::HostKey {
                host: host.to_string(),
                reason,
            },
        }
    }
}

/// Map a russh error raised while connecting.
pub(super) fn classify_russh(err: russh::Error, host: &str, port: u16) -> SshConnectError {
    match err {
        russh::Error::IO(source) => SshConnectError::Socket {
            addr: format!("{host}:{port}"),
            source,
        },
        russh::Error::UnknownKey => SshConnectError::HostKey {
            host: host.to_string(),
            reason: "the server key was rejected".to_string(),
        },
        russh::Error::Disconnect => {
            SshConnectError::Protocol("the server closed the connection".to_string())
        }
        other => SshConnectError::Protocol(other.to_string()),
    }
}

impl client::Handler for HostKeyCheck {
    type Error = HandlerError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        if self.policy == HostKeyPolicy::AcceptAll {
            warn!(host = %self.host, "accepting SSH host key without verification");
            return Ok(true);
        }

        match self.is_known(server_public_key) {
            Ok(true) => Ok(true),
            Ok(false) if self.policy == HostKeyPolicy::AcceptNew => {
                self.learn(server_public_key).map_err(|e| {
                    HandlerError::KnownHosts(format!("could not record the key: {e}"))
                })?;
                info!(host = %self.host, port = self.port, "recorded new SSH host key");
                Ok(true)
            }
            Ok(false) => Err(HandlerError::UnknownHostKey),
            Err(russh::keys::Error::KeyChanged { line }) => {
                Err(HandlerError::ChangedHostKey { line })
            }
            Err(e) => Err(HandlerError::KnownHosts(e.to_string())),
        }
    }
}
