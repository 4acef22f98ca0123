//! CSRF crumbs.
//!
//! Jenkins rejects state-changing requests that lack a crumb header. The crumb
//! issuer is asked for `concat(//crumbRequestField,":",//crumb)`, so a
//! successful answer is a single `Header-Name:value` line.

/// Path and query of the crumb issuer, relative to the controller root.
pub const CRUMB_PATH: &str =
    r#"/crumbIssuer/api/xml?xpath=concat(//crumbRequestField,":",//crumb)"#;

/// A crumb header to attach to every request of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub header_name: String,
    pub header_value: String,
}

impl Crumb {
    /// Parse `"<header-name>:<header-value>"`, splitting on the first colon.
    ///
    /// Returns `None` when there is no colon or the name is empty.
    pub fn parse(body: &str) -> Option<Self> {
        let (name, value) = body.split_once(':')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            header_name: name.to_string(),
            header_value: value.trim().to_string(),
        })
    }
}

/// True if a failed crumb response means "log in first".
pub fn requires_authentication(status: u16, body: &str) -> bool {
    status == 401 || body.to_ascii_lowercase().contains("authentication required")
}
