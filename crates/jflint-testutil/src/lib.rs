//! Test utilities for jflint.
//!
//! - [`MockController`]: a loopback HTTP server that answers like a Jenkins
//!   controller's crumb issuer and pipeline validator, recording every request
//! - [`ScriptedShell`]: a [`RemoteShell`](jflint_kernel::ssh::RemoteShell) that
//!   replays canned linter results
//! - [`MockSshd`]: a loopback SSH server running a fake `declarative-linter`
//! - [`write_jenkinsfile`]: drop a Jenkinsfile into a directory

pub mod controller;
pub mod shell;
pub mod sshd;

pub use controller::{ControllerScript, MockController, RecordedRequest};
pub use shell::{ScriptedShell, ShellCall};
pub use sshd::{ExecRecord, LinterReply, MockSshd, write_client_key};

use std::path::{Path, PathBuf};

/// A Jenkinsfile the controller would accept.
pub const VALID_JENKINSFILE: &str = "pipeline {\n    agent any\n    stages {\n        stage('Build') {\n            steps {\n                echo 'building'\n            }\n        }\n    }\n}\n";

/// A Jenkinsfile with a missing `agent` section.
pub const INVALID_JENKINSFILE: &str = "pipeline {\n    stages {\n        stage('Build') {\n            steps { echo 'building' }\n        }\n    }\n}\n";

/// Response body of a clean validation.
pub const VALIDATED: &str = "Jenkinsfile successfully validated.\n";

/// Response body of a rejected validation.
pub const REJECTED: &str = "Errors encountered validating Jenkinsfile:\nWorkflowScript: 1: Missing required section \"agent\" @ line 1, column 1.\n";

/// Write `contents` to `dir/name`, creating parent directories.
pub fn write_jenkinsfile(dir: &Path, name: &str, contents: &str) -> std::io::Result<PathBuf> {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, contents)?;
    Ok(path)
}
