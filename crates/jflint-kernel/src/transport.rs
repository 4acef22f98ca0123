//! Picks the one transport a run will use.

use std::fmt;
use std::path::PathBuf;

use crate::settings::Settings;

/// The two ways of reaching the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// REST validate endpoint behind a CSRF crumb.
    Http,
    /// `declarative-linter` over the controller's SSH endpoint.
    Ssh,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Ssh => write!(f, "ssh"),
        }
    }
}

/// Why a run did nothing. Both cases end with a passing verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    /// No files were passed in.
    NoFiles,
    /// Neither an HTTP URL nor an SSH hostname is configured.
    ConfigurationIncomplete,
}

impl fmt::Display for NoOpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFiles => write!(f, "no files to lint"),
            Self::ConfigurationIncomplete => {
                write!(f, "neither a Jenkins URL nor an SSH hostname is configured")
            }
        }
    }
}

/// Result of transport selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Run(TransportKind),
    NoOp(NoOpReason),
}

/// Choose the transport for `files`.
///
/// HTTP wins when both are configured; the two are never combined.
pub fn select(settings: &Settings, files: &[PathBuf]) -> Selection {
    if files.is_empty() {
        Selection::NoOp(NoOpReason::NoFiles)
    } else if settings.http_url().is_some() {
        Selection::Run(TransportKind::Http)
    } else if settings.ssh_hostname().is_some() {
        Selection::Run(TransportKind::Ssh)
    } else {
        Selection::NoOp(NoOpReason::ConfigurationIncomplete)
    }
}
