//! Paperless REST client
//!
//! Posts documents to `{host}/api/documents/post_document/` as a multipart
//! form and returns the plain-text identifier the server answers with.

use crate::{UploadError, Uploader};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use std::path::Path;
use tracing::debug;

const POST_DOCUMENT_PATH: &str = "/api/documents/post_document/";

/// Client for a single Paperless instance
#[derive(Debug, Clone)]
pub struct PaperlessClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl PaperlessClient {
    /// Create a client for `host` authenticating with the API `token`
    ///
    /// `host` may omit the scheme (`localhost:8000`), in which case plain
    /// http is assumed.
    pub fn new(host: &str, token: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), host, token)
    }

    /// Create a client reusing an existing `reqwest::Client`
    pub fn with_http_client(http: reqwest::Client, host: &str, token: impl Into<String>) -> Self {
        Self {
            http,
            base_url: normalize_base_url(host),
            token: token.into(),
        }
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, POST_DOCUMENT_PATH)
    }
}

#[async_trait]
impl Uploader for PaperlessClient {
    async fn upload(&self, path: &Path, tag: Option<u32>) -> Result<String, UploadError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| UploadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut form = Form::new().part("document", Part::bytes(bytes).file_name(file_name));
        if let Some(tag) = tag {
            form = form.text("tags", tag.to_string());
        }

        let url = self.endpoint();
        debug!(file = %path.display(), url = %url, "posting document");

        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .multipart(form)
            .send()
            .await
            .map_err(UploadError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            // The diagnostic body is best effort; the status alone is enough to fail.
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.text().await.map_err(UploadError::Body)
    }
}

fn normalize_base_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}
