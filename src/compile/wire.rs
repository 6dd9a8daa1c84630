//! JSON bodies of the compile service.
//!
//! ```text
//! POST {base}/compile-latex   {"latex": "..."}
//! POST {base}/compile-typst   {"typst": "..."}
//!
//! 200 {"status": "success" | "error", "progress": 0..100, "message": "...", "pdfData": "<base64>"}
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use super::CompileResult;
use crate::page::Format;

const STATUS_SUCCESS: &str = "success";

/// Request body. Serializes externally tagged: `{"latex": content}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompileBody<'a> {
    Latex(&'a str),
    Typst(&'a str),
}

impl<'a> CompileBody<'a> {
    /// `None` for formats rendered locally.
    pub fn new(format: Format, content: &'a str) -> Option<Self> {
        match format {
            Format::Latex => Some(Self::Latex(content)),
            Format::Typst => Some(Self::Typst(content)),
            Format::Markdown | Format::Diagram => None,
        }
    }

    /// Endpoint path below the service base URL.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Latex(_) => "compile-latex",
            Self::Typst(_) => "compile-typst",
        }
    }
}

/// Response body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileResponse {
    pub status: String,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub pdf_data: Option<String>,
}

impl CompileResponse {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// Decode into a compile outcome. Anything but a success status carrying
    /// valid base64 is a failure.
    pub fn into_result(self) -> CompileResult {
        if !self.is_success() {
            let message = if self.message.is_empty() {
                format!("compilation failed with status `{}`", self.status)
            } else {
                self.message
            };
            return CompileResult::failure(message);
        }

        let Some(data) = self.pdf_data.filter(|d| !d.is_empty()) else {
            return CompileResult::failure("compile service returned no PDF data");
        };

        match STANDARD.decode(data.trim()) {
            Ok(artifact) => CompileResult::Success { artifact },
            Err(e) => CompileResult::failure(format!("malformed PDF data: {e}")),
        }
    }
}

/// Parse a raw response body.
pub fn decode(body: &[u8]) -> CompileResult {
    match serde_json::from_slice::<CompileResponse>(body) {
        Ok(response) => response.into_result(),
        Err(e) => CompileResult::failure(format!("malformed compiler response: {e}")),
    }
}
