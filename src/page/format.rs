//! Page content format.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Content language of a page, determines which renderer or compiler is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Markdown - rendered locally with pulldown-cmark
    #[default]
    Markdown,
    /// LaTeX - linted locally, compiled to PDF remotely
    Latex,
    /// Typst - compiled to PDF remotely
    Typst,
    /// Mermaid-style flowchart - rendered locally to SVG
    Diagram,
}

impl Format {
    pub const ALL: [Format; 4] = [Self::Markdown, Self::Latex, Self::Typst, Self::Diagram];

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "tex" | "latex" => Some(Self::Latex),
            "typ" | "typst" => Some(Self::Typst),
            "mmd" | "mermaid" => Some(Self::Diagram),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Display name for this format.
    pub fn name(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Latex => "latex",
            Self::Typst => "typst",
            Self::Diagram => "diagram",
        }
    }

    /// Whether previews for this format come from the remote compiler.
    #[inline]
    pub fn is_remote(self) -> bool {
        matches!(self, Self::Latex | Self::Typst)
    }

    /// Whether this format gets line diagnostics while editing.
    #[inline]
    pub fn has_diagnostics(self) -> bool {
        matches!(self, Self::Latex)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "latex" | "tex" => Ok(Self::Latex),
            "typst" | "typ" => Ok(Self::Typst),
            "diagram" | "mermaid" | "mmd" => Ok(Self::Diagram),
            other => Err(format!(
                "unknown format `{other}` (expected markdown, latex, typst or diagram)"
            )),
        }
    }
}
