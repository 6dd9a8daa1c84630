//! `[preview]` section configuration.
//!
//! ```toml
//! [preview]
//! output = ".folio/preview"   # Rendered HTML/SVG and compiled PDFs
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub output: PathBuf,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(".folio/preview"),
        }
    }
}
