//! `lint-jenkinsfile`: a pre-commit hook that asks a Jenkins controller to
//! validate declarative Jenkinsfiles.
//!
//! The binary is a thin wrapper over [`execute`], which tests drive directly
//! with in-memory writers.

pub mod args;
pub mod config;
pub mod logging;
pub mod report;

use std::io::Write;

use jflint_kernel::RunVerdict;
use tracing::{debug, info};

pub use args::Cli;

/// Run one lint pass and write its output.
///
/// Run-fatal problems (bad config, crumb or connection failures) are printed
/// as a single `error:` line and turn into [`RunVerdict::Failed`].
pub async fn execute(
    cli: &Cli,
    stdout: &mut impl Write,
    stderr: &mut impl Write,
    color: bool,
) -> RunVerdict {
    let file_config = match config::load(cli.config.as_deref()) {
        Ok(file_config) => file_config,
        Err(e) => {
            fail(stderr, &format!("{e:#}"), color);
            return RunVerdict::Failed;
        }
    };
    let settings = config::resolve(cli, file_config);
    debug!(
        http_url = ?settings.http_url,
        ssh_hostname = ?settings.ssh_hostname,
        ssh_port = settings.ssh_port,
        files = cli.files.len(),
        "resolved settings"
    );

    match jflint_kernel::lint(&settings, &cli.files).await {
        Ok(run) => {
            match &run.ran {
                Ok(transport) => info!(%transport, files = run.files.len(), "lint finished"),
                Err(reason) => info!(%reason, "nothing to lint"),
            }
            if let Err(e) = report::write_report(stdout, &run, cli.verbose > 0, color) {
                debug!(error = %e, "failed to write report");
            }
            run.verdict()
        }
        Err(e) => {
            fail(stderr, &e, color);
            RunVerdict::Failed
        }
    }
}

/// Print a run-fatal error. The verdict is already decided, so a closed
/// stderr is only logged.
fn fail(stderr: &mut impl Write, message: &dyn std::fmt::Display, color: bool) {
    if let Err(e) = report::write_error(stderr, message, color) {
        debug!(error = %e, "failed to write error");
    }
}
