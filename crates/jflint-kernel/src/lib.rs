//! jflint-kernel: the validation engine behind `lint-jenkinsfile`.
//!
//! This crate provides:
//!
//! - **Settings**: the immutable connection settings for one run
//! - **Transport selection**: HTTP when a controller URL is configured, else SSH
//! - **HTTP validator**: crumb handshake, then one validate POST per file
//! - **SSH validator**: one session, one `declarative-linter` exec per file
//! - **Aggregation**: per-file outcomes folded into a [`RunVerdict`]
//!
//! The two transports sit behind object-safe traits ([`http::Controller`] and
//! [`ssh::RemoteShell`]) so the validators can be driven by scripted backends
//! in tests.
//!
//! # Example
//!
//! ```ignore
//! use jflint_kernel::{Settings, lint};
//!
//! let settings = Settings::http("https://jenkins.example.com");
//! let report = lint(&settings, &["Jenkinsfile".into()]).await?;
//! std::process::exit(report.verdict().exit_code().into());
//! ```

pub mod engine;
pub mod error;
pub mod http;
pub mod outcome;
pub mod settings;
pub mod ssh;
pub mod target;
pub mod transport;

pub use engine::lint;
pub use error::{LintError, SshConnectError};
pub use outcome::{FileReport, RunReport, RunVerdict, ValidationOutcome, aggregate};
pub use settings::{DEFAULT_SSH_PORT, HostKeyPolicy, Settings};
pub use transport::{NoOpReason, Selection, TransportKind, select};
