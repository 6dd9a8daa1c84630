//! The remote compiler collaborator.
//!
//! Every outcome of a compile call is a [`CompileResult`]: transport errors,
//! timeouts and malformed responses all surface as `Failure`, so the session
//! never hangs on a request that went wrong.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use super::CompileResult;
use super::wire::{self, CompileBody};
use crate::page::Format;

/// Errors from the HTTP transport.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("compile request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("compile service answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("format `{0}` is not compiled remotely")]
    LocalFormat(Format),
}

/// Compiles LaTeX or Typst source into PDF bytes.
pub trait RemoteCompiler: Send + Sync + 'static {
    fn compile(&self, format: Format, content: String) -> impl Future<Output = CompileResult> + Send;
}

/// Compile service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCompiler {
    client: reqwest::Client,
    base: String,
}

impl HttpCompiler {
    /// `base` is the service root, e.g. `http://localhost:8080/api`.
    pub fn new(base: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RemoteError::Client)?;

        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn endpoint(&self, body: &CompileBody<'_>) -> String {
        format!("{}/{}", self.base, body.endpoint())
    }

    async fn request(&self, format: Format, content: &str) -> Result<CompileResult, RemoteError> {
        let body = CompileBody::new(format, content).ok_or(RemoteError::LocalFormat(format))?;
        let url = self.endpoint(&body);

        crate::debug!("compile"; "POST {} ({} bytes)", url, content.len());
        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(wire::decode(&bytes))
    }
}

impl RemoteCompiler for HttpCompiler {
    async fn compile(&self, format: Format, content: String) -> CompileResult {
        match self.request(format, &content).await {
            Ok(result) => result,
            Err(e) => CompileResult::failure(e.to_string()),
        }
    }
}
