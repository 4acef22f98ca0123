//! Run-fatal errors.
//!
//! Per-file problems (a rejected Jenkinsfile, a missing file) are not errors;
//! they are recorded as [`ValidationOutcome::Fail`](crate::ValidationOutcome)
//! and the run continues. The types here abort the whole run.

use thiserror::Error;

/// Errors that stop a run before every file has been validated.
#[derive(Debug, Error)]
pub enum LintError {
    /// The crumb request was refused for lack of credentials.
    #[error(
        "the Jenkins controller requires authentication (crumb request returned status {status}); \
         check the login and API token"
    )]
    CrumbAuth { status: u16 },

    /// The crumb request failed for any other reason.
    #[error("requesting the crumb from the Jenkins controller failed with status {status}")]
    CrumbRequest { status: u16 },

    /// The crumb issuer answered 200 with something that is not `name:value`.
    #[error("the Jenkins controller returned a malformed crumb: {body:?}")]
    MalformedCrumb { body: String },

    /// The SSH session could not be established.
    #[error(transparent)]
    Connect(#[from] SshConnectError),

    /// Network failure while talking to the controller.
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for LintError {
    fn from(err: reqwest::Error) -> Self {
        LintError::Transport(err.to_string())
    }
}

/// Why the SSH connection could not be set up.
///
/// Closed set: anything that does not fit the specific kinds lands in
/// [`SshConnectError::Other`].
#[derive(Debug, Error)]
pub enum SshConnectError {
    /// The server's key is unknown or differs from `known_hosts`.
    #[error("the host key for {host} could not be verified: {reason}")]
    HostKey { host: String, reason: String },

    /// No agent identity or key file was accepted.
    #[error("authentication as '{user}' was rejected by {host}")]
    Authentication { user: String, host: String },

    /// Negotiation or protocol failure after the socket was open.
    #[error("SSH protocol error: {0}")]
    Protocol(String),

    /// The TCP connection could not be made.
    #[error("could not reach {addr}: {source}")]
    Socket {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Anything else.
    #[error("SSH connection failed: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crumb_errors_name_the_status() {
        let err = LintError::CrumbAuth { status: 401 };
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("authentication"));

        let err = LintError::CrumbRequest { status: 503 };
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn connect_errors_are_transparent() {
        let err: LintError = SshConnectError::Authentication {
            user: "jenkins".into(),
            host: "ci.example.com".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "authentication as 'jenkins' was rejected by ci.example.com"
        );
    }

    #[test]
    fn socket_error_keeps_source() {
        use std::error::Error as _;

        let err = SshConnectError::Socket {
            addr: "ci:22".into(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("could not reach ci:22"));
    }
}
