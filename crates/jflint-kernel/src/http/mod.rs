//! HTTP validator: crumb handshake, then one validate POST per file.
//!
//! ```text
//! GET  {url}/crumbIssuer/api/xml?xpath=...     -> "Jenkins-Crumb:abc123"
//! POST {url}/pipeline-model-converter/validate  (jenkinsfile=<text>, Jenkins-Crumb: abc123)
//! POST ...                                      (one per file, same crumb)
//! ```
//!
//! The controller itself sits behind the [`Controller`] trait. [`ReqwestController`]
//! is the real one.

mod client;
mod crumb;

pub use client::ReqwestController;
pub use crumb::{CRUMB_PATH, Crumb, requires_authentication};

use std::path::PathBuf;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info};

use crate::error::LintError;
use crate::outcome::{FileReport, ValidationOutcome};
use crate::settings::Settings;
use crate::target;

/// Path of the declarative pipeline validator, relative to the controller root.
pub const VALIDATE_PATH: &str = "/pipeline-model-converter/validate";

/// Name of the form field carrying the Jenkinsfile text.
pub const VALIDATE_FIELD: &str = "jenkinsfile";

/// Status and body of a controller response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Extra headers sent with a request, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders(Vec<(String, String)>);

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Look up a header by case-insensitive name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The two requests the validator makes of a controller.
///
/// `path` is relative to the controller root and starts with `/`.
#[async_trait]
pub trait Controller: Send + Sync {
    /// Issue a GET.
    async fn get(&self, path: &str, headers: &RequestHeaders) -> Result<Reply, LintError>;

    /// Issue a multipart POST with a single text field.
    async fn post_form(
        &self,
        path: &str,
        field: &str,
        value: String,
        headers: &RequestHeaders,
    ) -> Result<Reply, LintError>;
}

/// `Authorization` header value for `login:token`.
pub fn basic_auth(login: &str, token: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{login}:{token}")))
}

/// Headers every request of the run carries before the crumb is known.
fn auth_headers(settings: &Settings) -> RequestHeaders {
    let mut headers = RequestHeaders::new();
    if let Some((login, token)) = settings.http_credentials() {
        headers.insert("Authorization", basic_auth(login, token));
    }
    headers
}

/// Ask the controller for a crumb.
///
/// Any non-200 answer aborts the run. There is no retry.
pub async fn acquire_crumb<C: Controller + ?Sized>(
    controller: &C,
    headers: &RequestHeaders,
) -> Result<Crumb, LintError> {
    let reply = controller.get(CRUMB_PATH, headers).await?;
    if reply.status != 200 {
        return Err(if requires_authentication(reply.status, &reply.body) {
            LintError::CrumbAuth {
                status: reply.status,
            }
        } else {
            LintError::CrumbRequest {
                status: reply.status,
            }
        });
    }

    let crumb = Crumb::parse(&reply.body).ok_or_else(|| LintError::MalformedCrumb {
        body: reply.body.clone(),
    })?;
    debug!(header = %crumb.header_name, "received crumb");
    Ok(crumb)
}

/// Map a validate response to an outcome.
pub fn interpret_validation(reply: &Reply) -> ValidationOutcome {
    if reply.status != 200 {
        ValidationOutcome::fail(format!("connection failed, status {}", reply.status))
    } else if reply.body.contains("Error") {
        ValidationOutcome::fail(reply.body.trim_end())
    } else {
        ValidationOutcome::Pass
    }
}

/// Validate `files` in order against `controller`.
///
/// The crumb is fetched once and reused. A rejected file does not stop the
/// loop; a transport error does.
pub async fn validate_over_http<C: Controller + ?Sized>(
    controller: &C,
    settings: &Settings,
    files: &[PathBuf],
) -> Result<Vec<FileReport>, LintError> {
    let mut headers = auth_headers(settings);
    let crumb = acquire_crumb(controller, &headers).await?;
    headers.insert(crumb.header_name, crumb.header_value);

    let mut reports = Vec::with_capacity(files.len());
    for path in files {
        let outcome = match target::read_text(path).await {
            Ok(text) => {
                debug!(file = %path.display(), bytes = text.len(), "submitting");
                let reply = controller
                    .post_form(VALIDATE_PATH, VALIDATE_FIELD, text, &headers)
                    .await?;
                interpret_validation(&reply)
            }
            Err(outcome) => outcome,
        };
        info!(file = %path.display(), pass = outcome.is_pass(), "validated over http");
        reports.push(FileReport::new(path.clone(), outcome));
    }
    Ok(reports)
}
