//! SSH validator against a scripted remote shell.

use jflint_kernel::ssh::{LINTER_COMMAND, RemoteOutput, validate_over_ssh};
use jflint_kernel::{RunVerdict, ValidationOutcome, aggregate};
use jflint_testutil::{
    INVALID_JENKINSFILE, REJECTED, ScriptedShell, VALIDATED, VALID_JENKINSFILE, write_jenkinsfile,
};
use tempfile::TempDir;

#[tokio::test]
async fn exit_zero_passes() {
    let dir = TempDir::new().expect("tempdir");
    let file = write_jenkinsfile(dir.path(), "Jenkinsfile", VALID_JENKINSFILE).expect("write");
    let shell = ScriptedShell::new().then(RemoteOutput::new(0, VALIDATED));

    let reports = validate_over_ssh(&shell, &[file]).await;

    assert_eq!(reports[0].outcome, ValidationOutcome::Pass);
}

#[tokio::test]
async fn exit_one_fails_with_captured_output() {
    let dir = TempDir::new().expect("tempdir");
    let file = write_jenkinsfile(dir.path(), "Jenkinsfile", INVALID_JENKINSFILE).expect("write");
    let shell = ScriptedShell::new().then(RemoteOutput::new(1, REJECTED));

    let reports = validate_over_ssh(&shell, &[file]).await;

    assert_eq!(reports[0].outcome.diagnostic(), Some(REJECTED.trim_end()));
}

#[tokio::test]
async fn file_bytes_are_streamed_to_the_linter() {
    let dir = TempDir::new().expect("tempdir");
    let file = write_jenkinsfile(dir.path(), "Jenkinsfile", VALID_JENKINSFILE).expect("write");
    let shell = ScriptedShell::new();

    validate_over_ssh(&shell, &[file]).await;

    let calls = shell.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].command, LINTER_COMMAND);
    assert_eq!(calls[0].input, VALID_JENKINSFILE.as_bytes());
}

#[tokio::test]
async fn missing_file_skips_remote_call_and_later_files_still_run() {
    let dir = TempDir::new().expect("tempdir");
    let missing = dir.path().join("nope/Jenkinsfile");
    let present = write_jenkinsfile(dir.path(), "Jenkinsfile", VALID_JENKINSFILE).expect("write");
    let shell = ScriptedShell::new();

    let reports = validate_over_ssh(&shell, &[missing.clone(), present.clone()]).await;

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].path, missing);
    assert_eq!(reports[0].outcome, ValidationOutcome::missing());
    assert_eq!(reports[1].path, present);
    assert!(reports[1].outcome.is_pass());
    assert_eq!(shell.calls().len(), 1, "only the existing file reaches the remote");
}

#[tokio::test]
async fn exec_failure_is_per_file_and_session_stays_open() {
    let dir = TempDir::new().expect("tempdir");
    let first = write_jenkinsfile(dir.path(), "a/Jenkinsfile", VALID_JENKINSFILE).expect("write");
    let second = write_jenkinsfile(dir.path(), "b/Jenkinsfile", VALID_JENKINSFILE).expect("write");
    let shell = ScriptedShell::new()
        .then_error("failed to open SSH channel: channel refused")
        .then(RemoteOutput::new(0, ""));

    let reports = validate_over_ssh(&shell, &[first, second]).await;

    let diagnostic = reports[0].outcome.diagnostic().unwrap_or_default();
    assert!(diagnostic.contains("channel refused"), "{diagnostic}");
    assert!(reports[1].outcome.is_pass());
    assert_eq!(shell.calls().len(), 2);
    assert_eq!(shell.close_count(), 1);
}

#[tokio::test]
async fn session_closed_exactly_once_even_when_everything_fails() {
    let dir = TempDir::new().expect("tempdir");
    let file = write_jenkinsfile(dir.path(), "Jenkinsfile", INVALID_JENKINSFILE).expect("write");
    let shell = ScriptedShell::new()
        .then(RemoteOutput::new(1, REJECTED))
        .then(RemoteOutput::new(1, REJECTED));

    let reports = validate_over_ssh(&shell, &[file.clone(), file]).await;

    assert_eq!(aggregate(reports.iter().map(|r| &r.outcome)), RunVerdict::Failed);
    assert_eq!(shell.close_count(), 1);
}

#[tokio::test]
async fn empty_list_runs_nothing() {
    let shell = ScriptedShell::new();

    let reports = validate_over_ssh(&shell, &[]).await;

    assert!(reports.is_empty());
    assert!(shell.calls().is_empty());
    assert_eq!(aggregate(reports.iter().map(|r| &r.outcome)), RunVerdict::Ok);
}
