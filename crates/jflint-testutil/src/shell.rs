//! A scripted [`RemoteShell`].

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use jflint_kernel::LintError;
use jflint_kernel::ssh::{RemoteOutput, RemoteShell};

/// One command the shell was asked to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCall {
    pub command: String,
    pub input: Vec<u8>,
}

/// Replays queued results, then exits 0 for everything else.
#[derive(Debug, Default)]
pub struct ScriptedShell {
    replies: Mutex<VecDeque<Result<RemoteOutput, String>>>,
    calls: Mutex<Vec<ShellCall>>,
    closed: AtomicUsize,
}

impl ScriptedShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next command.
    pub fn then(self, output: RemoteOutput) -> Self {
        lock(&self.replies).push_back(Ok(output));
        self
    }

    /// Queue a channel failure for the next command.
    pub fn then_error(self, message: impl Into<String>) -> Self {
        lock(&self.replies).push_back(Err(message.into()));
        self
    }

    /// Every command run so far.
    pub fn calls(&self) -> Vec<ShellCall> {
        lock(&self.calls).clone()
    }

    /// How many times `close` was called.
    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl RemoteShell for ScriptedShell {
    async fn exec_with_stdin(
        &self,
        command: &str,
        input: &[u8],
    ) -> Result<RemoteOutput, LintError> {
        lock(&self.calls).push(ShellCall {
            command: command.to_string(),
            input: input.to_vec(),
        });
        match lock(&self.replies).pop_front() {
            Some(Ok(output)) => Ok(output),
            Some(Err(message)) => Err(LintError::Transport(message)),
            None => Ok(RemoteOutput::new(0, "Jenkinsfile successfully validated.\n")),
        }
    }

    async fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}
