//! End-to-end runs of `execute` against a loopback controller.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use jflint_cli::{Cli, execute};
use jflint_kernel::RunVerdict;
use jflint_testutil::{
    ControllerScript, INVALID_JENKINSFILE, MockController, REJECTED, VALID_JENKINSFILE,
    write_jenkinsfile,
};
use tempfile::TempDir;

/// A stream that refuses every write, like a closed pipe.
struct ClosedPipe;

impl Write for ClosedPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::from(io::ErrorKind::BrokenPipe))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::BrokenPipe))
    }
}

struct Output {
    verdict: RunVerdict,
    stdout: String,
    stderr: String,
}

async fn run(args: &[&str]) -> Output {
    let argv = std::iter::once("lint-jenkinsfile").chain(args.iter().copied());
    let cli = Cli::try_parse_from(argv).expect("args");
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let verdict = execute(&cli, &mut stdout, &mut stderr, false).await;
    Output {
        verdict,
        stdout: String::from_utf8(stdout).expect("utf8"),
        stderr: String::from_utf8(stderr).expect("utf8"),
    }
}

/// An empty config file, so a developer's own config never leaks into a test.
fn empty_config(dir: &Path) -> PathBuf {
    let path = dir.join("empty.ini");
    std::fs::write(&path, "").expect("write config");
    path
}

fn s(path: &Path) -> &str {
    path.to_str().expect("utf8 path")
}

#[tokio::test]
async fn rejected_file_fails_the_run() {
    let dir = TempDir::new().expect("tempdir");
    let config = empty_config(dir.path());
    let good = write_jenkinsfile(dir.path(), "good/Jenkinsfile", VALID_JENKINSFILE).expect("write");
    let bad = write_jenkinsfile(dir.path(), "bad/Jenkinsfile", INVALID_JENKINSFILE).expect("write");
    let controller = MockController::start(
        ControllerScript::new()
            .then_validate(200, "Jenkinsfile successfully validated.")
            .then_validate(200, REJECTED),
    )
    .await
    .expect("start controller");
    let url = controller.base_url();

    let out = run(&[
        "--config",
        s(&config),
        "--jenkins-url",
        url.as_str(),
        s(&good),
        s(&bad),
    ])
    .await;

    assert_eq!(out.verdict, RunVerdict::Failed);
    assert_eq!(out.verdict.exit_code(), 1);
    assert!(out.stdout.contains(&format!("FAIL {}", bad.display())), "{}", out.stdout);
    assert!(!out.stdout.contains(&good.display().to_string()), "{}", out.stdout);
    assert!(out.stderr.is_empty(), "{}", out.stderr);
}

#[tokio::test]
async fn all_valid_exits_zero() {
    let dir = TempDir::new().expect("tempdir");
    let config = empty_config(dir.path());
    let good = write_jenkinsfile(dir.path(), "Jenkinsfile", VALID_JENKINSFILE).expect("write");
    let controller = MockController::start(ControllerScript::new())
        .await
        .expect("start controller");
    let url = controller.base_url();

    let out = run(&[
        "--config",
        s(&config),
        "--jenkins-url",
        url.as_str(),
        "-v",
        s(&good),
    ])
    .await;

    assert_eq!(out.verdict, RunVerdict::Ok);
    assert!(out.stdout.starts_with("ok   "), "{}", out.stdout);
}

#[tokio::test]
async fn no_files_succeeds_without_contacting_controller() {
    let dir = TempDir::new().expect("tempdir");
    let config = empty_config(dir.path());
    let controller = MockController::start(ControllerScript::new())
        .await
        .expect("start controller");
    let url = controller.base_url();

    let out = run(&["--config", s(&config), "--jenkins-url", url.as_str()]).await;

    assert_eq!(out.verdict, RunVerdict::Ok);
    assert!(controller.requests().is_empty());
}

#[tokio::test]
async fn unconfigured_run_succeeds() {
    let dir = TempDir::new().expect("tempdir");
    let config = empty_config(dir.path());
    let bad = write_jenkinsfile(dir.path(), "Jenkinsfile", INVALID_JENKINSFILE).expect("write");

    let out = run(&["--config", s(&config), s(&bad)]).await;

    assert_eq!(out.verdict, RunVerdict::Ok);
    assert!(out.stdout.is_empty());
}

#[tokio::test]
async fn config_file_supplies_url_and_credentials() {
    let dir = TempDir::new().expect("tempdir");
    let good = write_jenkinsfile(dir.path(), "Jenkinsfile", VALID_JENKINSFILE).expect("write");
    let controller = MockController::start(ControllerScript::new())
        .await
        .expect("start controller");
    let config = dir.path().join("jflint.ini");
    std::fs::write(
        &config,
        format!("[http]\nurl = {}\nlogin = alice\napi_token = t0k3n\n", controller.base_url()),
    )
    .expect("write config");

    let out = run(&["--config", s(&config), s(&good)]).await;

    assert_eq!(out.verdict, RunVerdict::Ok);
    let requests = controller.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].header("authorization"), Some("Basic YWxpY2U6dDBrM24="));
}

#[tokio::test]
async fn flag_overrides_config_url() {
    let dir = TempDir::new().expect("tempdir");
    let good = write_jenkinsfile(dir.path(), "Jenkinsfile", VALID_JENKINSFILE).expect("write");
    let controller = MockController::start(ControllerScript::new())
        .await
        .expect("start controller");
    let config = dir.path().join("jflint.ini");
    // Nothing listens on port 9 of the loopback in the test environment.
    std::fs::write(&config, "[http]\nurl = http://127.0.0.1:9\n").expect("write config");
    let url = controller.base_url();

    let out = run(&["--config", s(&config), "--jenkins_url", url.as_str(), s(&good)]).await;

    assert_eq!(out.verdict, RunVerdict::Ok, "{}", out.stderr);
    assert_eq!(controller.validate_requests().len(), 1);
}

#[tokio::test]
async fn crumb_auth_failure_prints_one_error_line() {
    let dir = TempDir::new().expect("tempdir");
    let config = empty_config(dir.path());
    let good = write_jenkinsfile(dir.path(), "Jenkinsfile", VALID_JENKINSFILE).expect("write");
    let script = ControllerScript::new().crumb(401, "Authentication required");
    let controller = MockController::start(script).await.expect("start controller");
    let url = controller.base_url();

    let out = run(&["--config", s(&config), "--jenkins-url", url.as_str(), s(&good)]).await;

    assert_eq!(out.verdict, RunVerdict::Failed);
    assert!(out.stderr.starts_with("error: "), "{}", out.stderr);
    assert_eq!(out.stderr.lines().count(), 1, "{}", out.stderr);
    assert!(out.stdout.is_empty());
    assert!(controller.validate_requests().is_empty());
}

#[tokio::test]
async fn broken_config_fails_before_linting() {
    let dir = TempDir::new().expect("tempdir");
    let config = dir.path().join("jflint.ini");
    std::fs::write(&config, "[ssh]\nport = twenty-two\n").expect("write config");

    let out = run(&["--config", s(&config), "Jenkinsfile"]).await;

    assert_eq!(out.verdict, RunVerdict::Failed);
    assert!(out.stderr.contains("line 2"), "{}", out.stderr);
}

#[tokio::test]
async fn closed_stderr_still_fails_the_run() {
    let dir = TempDir::new().expect("tempdir");
    let config = dir.path().join("jflint.ini");
    std::fs::write(&config, "[ssh]\nport = twenty-two\n").expect("write config");
    let cli = Cli::try_parse_from(["lint-jenkinsfile", "--config", s(&config), "Jenkinsfile"])
        .expect("args");

    let verdict = execute(&cli, &mut ClosedPipe, &mut ClosedPipe, false).await;

    assert_eq!(verdict, RunVerdict::Failed);
}

#[tokio::test]
async fn closed_stderr_after_a_crumb_failure_still_fails_the_run() {
    let dir = TempDir::new().expect("tempdir");
    let config = empty_config(dir.path());
    let good = write_jenkinsfile(dir.path(), "Jenkinsfile", VALID_JENKINSFILE).expect("write");
    let script = ControllerScript::new().crumb(403, "Forbidden");
    let controller = MockController::start(script).await.expect("start controller");
    let url = controller.base_url();
    let args = [
        "lint-jenkinsfile",
        "--config",
        s(&config),
        "--jenkins-url",
        url.as_str(),
        s(&good),
    ];
    let cli = Cli::try_parse_from(args).expect("args");

    let verdict = execute(&cli, &mut ClosedPipe, &mut ClosedPipe, false).await;

    assert_eq!(verdict, RunVerdict::Failed);
}
