//! russh-backed [`RemoteShell`].

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use directories::BaseDirs;
use russh::keys::PrivateKeyWithHashAlg;
use russh::{ChannelMsg, Disconnect, client};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::handler::{HostKeyCheck, classify_russh};
use super::{RemoteOutput, RemoteShell};
use crate::error::{LintError, SshConnectError};
use crate::settings::Settings;

/// An authenticated connection to the controller's SSH endpoint.
pub struct SshSession {
    handle: client::Handle<HostKeyCheck>,
    host: String,
    port: u16,
}

impl SshSession {
    /// Connect and authenticate with ambient credentials.
    ///
    /// Identities offered by the SSH agent are tried first, then each key
    /// file. There is no password fallback. If authentication fails the
    /// connection is closed before the error is returned.
    pub async fn connect(settings: &Settings) -> Result<Self, SshConnectError> {
        let host = settings
            .ssh_hostname()
            .ok_or_else(|| SshConnectError::Other("no SSH hostname configured".to_string()))?;
        let port = settings.ssh_port;
        let user = settings.ssh_user.clone().unwrap_or_else(local_user);

        let config = Arc::new(client::Config::default());
        let handler = HostKeyCheck::new(
            host,
            port,
            settings.host_key_policy,
            settings.known_hosts_file.clone(),
        );
        let handle = client::connect(config, (host, port), handler)
            .await
            .map_err(|e| e.classify(host, port))?;
        info!(host, port, "SSH connection established");

        let mut session = SshSession {
            handle,
            host: host.to_string(),
            port,
        };

        let identity_files = if settings.ssh_identity_files.is_empty() {
            default_identity_files()
        } else {
            settings.ssh_identity_files.clone()
        };

        match session.authenticate(&user, &identity_files).await {
            Ok(()) => Ok(session),
            Err(e) => {
                session.disconnect().await;
                Err(e)
            }
        }
    }

    async fn authenticate(
        &mut self,
        user: &str,
        identity_files: &[PathBuf],
    ) -> Result<(), SshConnectError> {
        #[cfg(unix)]
        if self.authenticate_with_agent(user).await {
            return Ok(());
        }

        for key_path in identity_files {
            if !key_path.exists() {
                continue;
            }
            debug!(key = %key_path.display(), "trying SSH key");

            let key_pair = match russh::keys::load_secret_key(key_path, None) {
                Ok(k) => k,
                Err(e) => {
                    debug!(key = %key_path.display(), %e, "failed to load key, trying next");
                    continue;
                }
            };
            let key_with_hash = PrivateKeyWithHashAlg::new(Arc::new(key_pair), None);

            let result = self
                .handle
                .authenticate_publickey(user, key_with_hash)
                .await
                .map_err(|e| classify_russh(e, &self.host, self.port))?;
            if result.success() {
                info!(user, key = %key_path.display(), "SSH authentication successful");
                return Ok(());
            }
            debug!(key = %key_path.display(), "key not accepted, trying next");
        }

        Err(SshConnectError::Authentication {
            user: user.to_string(),
            host: self.host.clone(),
        })
    }

    #[cfg(unix)]
    async fn authenticate_with_agent(&mut self, user: &str) -> bool {
        use russh::keys::agent::client::AgentClient;

        let mut agent = match AgentClient::connect_env().await {
            Ok(agent) => agent,
            Err(e) => {
                debug!(%e, "no SSH agent available");
                return false;
            }
        };
        let identities = match agent.request_identities().await {
            Ok(ids) => ids,
            Err(e) => {
                debug!(%e, "SSH agent did not list identities");
                return false;
            }
        };

        for key in identities {
            match self
                .handle
                .authenticate_publickey_with(user, key, None, &mut agent)
                .await
            {
                Ok(result) if result.success() => {
                    info!(user, "SSH authentication successful via agent");
                    return true;
                }
                Ok(_) => debug!("agent identity not accepted, trying next"),
                Err(e) => debug!(?e, "agent signing failed, trying next"),
            }
        }
        false
    }

    async fn disconnect(&self) {
        if let Err(e) = self
            .handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
        {
            debug!(%e, "SSH disconnect failed");
        }
    }
}

#[async_trait]
impl RemoteShell for SshSession {
    async fn exec_with_stdin(
        &self,
        command: &str,
        input: &[u8],
    ) -> Result<RemoteOutput, LintError> {
        let channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| LintError::Transport(format!("failed to open SSH channel: {e}")))?;
        channel
            .exec(true, command)
            .await
            .map_err(|e| LintError::Transport(format!("failed to exec {command}: {e}")))?;

        // The read half has to be drained while stdin is written, otherwise
        // window-adjust messages back up and the session stalls.
        let (mut read_half, write_half) = channel.split();
        let mut drain = tokio::spawn(async move {
            let mut output = RemoteOutput::default();
            let mut stdout = Vec::new();
            let mut stderr = Vec::new();
            // ExitStatus often arrives after Eof, so only Close ends the loop.
            while let Some(msg) = read_half.wait().await {
                match msg {
                    ChannelMsg::Data { data } => stdout.extend_from_slice(&data),
                    ChannelMsg::ExtendedData { data, ext: 1 } => stderr.extend_from_slice(&data),
                    ChannelMsg::ExitStatus { exit_status } => {
                        output.exit_status = Some(exit_status)
                    }
                    ChannelMsg::Close => break,
                    _ => {}
                }
            }
            output.stdout = String::from_utf8_lossy(&stdout).into_owned();
            output.stderr = String::from_utf8_lossy(&stderr).into_owned();
            output
        });

        let mut writer = write_half.make_writer();
        let write_stdin = async {
            writer.write_all(input).await?;
            // Shutdown sends EOF to the remote stdin.
            writer.shutdown().await
        };

        // The command may exit without reading all of stdin. Once the channel
        // is closed the window never reopens, so the write must not be awaited
        // on its own.
        let (drained, write_error) = tokio::select! {
            written = write_stdin => (drain.await, written.err()),
            drained = &mut drain => {
                debug!(command, "remote command finished before reading all of stdin");
                (drained, None)
            }
        };

        let output = drained
            .map_err(|e| LintError::Transport(format!("channel drain failed: {e}")))?;
        // A write into a channel the command already closed fails, but the
        // exit status it left behind still stands.
        if let Some(e) = write_error {
            if output.exit_status.is_none() {
                return Err(LintError::Transport(format!("failed to write stdin: {e}")));
            }
            debug!(command, error = %e, "stdin write cut short by remote exit");
        }
        debug!(
            command,
            exit_status = ?output.exit_status,
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            "remote command completed"
        );
        Ok(output)
    }

    async fn close(&self) {
        self.disconnect().await;
        debug!(host = %self.host, "SSH session closed");
    }
}

/// Local account name, used when no SSH user is configured.
fn local_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_else(|_| "root".to_string())
}

/// `~/.ssh/id_ed25519`, `~/.ssh/id_ecdsa`, `~/.ssh/id_rsa`.
fn default_identity_files() -> Vec<PathBuf> {
    let Some(dirs) = BaseDirs::new() else {
        return Vec::new();
    };
    let ssh_dir = dirs.home_dir().join(".ssh");
    ["id_ed25519", "id_ecdsa", "id_rsa"]
        .iter()
        .map(|name| ssh_dir.join(name))
        .collect()
}
