//! One lint run: select a transport, validate every file, report.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::error::LintError;
use crate::http::{self, ReqwestController};
use crate::outcome::RunReport;
use crate::settings::Settings;
use crate::ssh::{self, SshSession};
use crate::transport::{NoOpReason, Selection, TransportKind, select};

/// Validate `files` against the controller described by `settings`.
///
/// Per-file rejections are part of the returned report. An `Err` means the
/// run was aborted (crumb refused, SSH connect failed, network failure) and
/// the caller should treat it as a failed run.
pub async fn lint(settings: &Settings, files: &[PathBuf]) -> Result<RunReport, LintError> {
    match select(settings, files) {
        Selection::NoOp(reason) => {
            if reason == NoOpReason::ConfigurationIncomplete {
                warn!("{reason}; skipping {} file(s)", files.len());
            }
            Ok(RunReport::noop(reason))
        }
        Selection::Run(TransportKind::Http) => {
            let url = settings.http_url().unwrap_or_default();
            info!(url, files = files.len(), "linting over http");
            let controller = ReqwestController::new(url)?;
            let reports = http::validate_over_http(&controller, settings, files).await?;
            Ok(RunReport::new(TransportKind::Http, reports))
        }
        Selection::Run(TransportKind::Ssh) => {
            info!(
                host = settings.ssh_hostname().unwrap_or_default(),
                port = settings.ssh_port,
                files = files.len(),
                "linting over ssh"
            );
            let session = SshSession::connect(settings).await?;
            let reports = ssh::validate_over_ssh(&session, files).await;
            Ok(RunReport::new(TransportKind::Ssh, reports))
        }
    }
}
