//! SSH validator: one session, one `declarative-linter` run per file.
//!
//! Jenkins' SSH endpoint exposes the declarative linter as a CLI command that
//! reads a Jenkinsfile on stdin and exits non-zero when it finds problems:
//!
//! ```text
//! ssh -p 53801 jenkins.example.com declarative-linter < Jenkinsfile
//! ```
//!
//! The session sits behind the [`RemoteShell`] trait. [`SshSession`] is the
//! russh implementation.

mod handler;
mod session;

pub use session::SshSession;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::LintError;
use crate::outcome::{FileReport, ValidationOutcome};
use crate::target;

/// The remote linter. Invoked with no arguments.
pub const LINTER_COMMAND: &str = "declarative-linter";

/// What a remote command left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteOutput {
    /// `None` if the channel closed without an exit status.
    pub exit_status: Option<u32>,
    pub stdout: String,
    pub stderr: String,
}

impl RemoteOutput {
    pub fn new(exit_status: u32, stdout: impl Into<String>) -> Self {
        Self {
            exit_status: Some(exit_status),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }
}

/// An open session that can run commands with piped stdin.
#[async_trait]
pub trait RemoteShell: Send + Sync {
    /// Run `command`, write `input` to its stdin, close stdin and wait for exit.
    async fn exec_with_stdin(&self, command: &str, input: &[u8]) -> Result<RemoteOutput, LintError>;

    /// Close the session. Called exactly once, after the last file.
    async fn close(&self);
}

/// Map a finished linter run to an outcome.
pub fn interpret_linter(output: &RemoteOutput) -> ValidationOutcome {
    match output.exit_status {
        Some(0) => ValidationOutcome::Pass,
        Some(_) => {
            let captured = if output.stdout.trim().is_empty() {
                &output.stderr
            } else {
                &output.stdout
            };
            ValidationOutcome::fail(captured.trim_end())
        }
        None => ValidationOutcome::fail(format!("{LINTER_COMMAND} exited without status")),
    }
}

async fn validate_file<S: RemoteShell + ?Sized>(shell: &S, path: &Path) -> ValidationOutcome {
    let bytes = match target::read_bytes(path).await {
        Ok(bytes) => bytes,
        Err(outcome) => return outcome,
    };
    debug!(file = %path.display(), bytes = bytes.len(), "streaming to {LINTER_COMMAND}");
    match shell.exec_with_stdin(LINTER_COMMAND, &bytes).await {
        Ok(output) => interpret_linter(&output),
        Err(e) => {
            warn!(file = %path.display(), %e, "linter invocation failed");
            ValidationOutcome::fail(format!("failed to execute {LINTER_COMMAND}: {e}"))
        }
    }
}

/// Validate `files` in order over `shell`, then close it.
///
/// Nothing in the loop can abort it: exec failures become per-file outcomes,
/// so the session is always closed after the last file.
pub async fn validate_over_ssh<S: RemoteShell + ?Sized>(
    shell: &S,
    files: &[PathBuf],
) -> Vec<FileReport> {
    let mut reports = Vec::with_capacity(files.len());
    for path in files {
        let outcome = validate_file(shell, path).await;
        info!(file = %path.display(), pass = outcome.is_pass(), "validated over ssh");
        reports.push(FileReport::new(path.clone(), outcome));
    }
    shell.close().await;
    reports
}
