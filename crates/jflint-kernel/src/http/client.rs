//! reqwest-backed [`Controller`].

use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::RequestBuilder;
use tracing::debug;

use super::{Controller, Reply, RequestHeaders};
use crate::error::LintError;

/// Talks to a real Jenkins controller.
#[derive(Debug, Clone)]
pub struct ReqwestController {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestController {
    /// Create a controller rooted at `base_url`. A trailing `/` is ignored.
    pub fn new(base_url: &str) -> Result<Self, LintError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("jflint/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Full URL for a root-relative path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(request: RequestBuilder, headers: &RequestHeaders) -> Result<Reply, LintError> {
        let request = headers
            .iter()
            .fold(request, |request, (name, value)| request.header(name, value));
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, body_len = body.len(), "controller replied");
        Ok(Reply { status, body })
    }
}

#[async_trait]
impl Controller for ReqwestController {
    async fn get(&self, path: &str, headers: &RequestHeaders) -> Result<Reply, LintError> {
        let url = self.url(path);
        debug!(%url, "GET");
        Self::send(self.client.get(url), headers).await
    }

    async fn post_form(
        &self,
        path: &str,
        field: &str,
        value: String,
        headers: &RequestHeaders,
    ) -> Result<Reply, LintError> {
        let url = self.url(path);
        debug!(%url, field, "POST");
        let form = Form::new().text(field.to_string(), value);
        Self::send(self.client.post(url).multipart(form), headers).await
    }
}
