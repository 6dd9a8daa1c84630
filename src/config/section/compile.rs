//! `[compile]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [compile]
//! server = "http://localhost:8080/api"  # Compile service root
//! debounce_ms = 1000                    # Quiet window before auto compile
//! auto_compile = true                   # Compile LaTeX/Typst pages while typing
//! timeout_secs = 60                     # Per-request timeout
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;
use crate::config::util::parse_service_url;

/// Remote compile settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Base URL; `/compile-latex` and `/compile-typst` are appended.
    pub server: String,
    pub debounce_ms: u64,
    pub auto_compile: bool,
    pub timeout_secs: u64,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            server: "http://localhost:8080/api".to_string(),
            debounce_ms: 1000,
            auto_compile: true,
            timeout_secs: 60,
        }
    }
}

impl CompileConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if parse_service_url(&self.server).is_none() {
            diag.error_with_hint(
                "compile.server",
                format!("`{}` is not an http(s) URL", self.server),
                "e.g. server = \"http://localhost:8080/api\"",
            );
        }
        if self.debounce_ms == 0 {
            diag.error("compile.debounce_ms", "must be greater than 0");
        }
        if self.timeout_secs == 0 {
            diag.error("compile.timeout_secs", "must be greater than 0");
        }
    }
}
