//! Page types: identity, content and format.

mod format;

pub use format::Format;

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Stable page identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A page as handed to the editor by the surrounding document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub id: PageId,
    pub title: String,
    pub content: String,
    pub format: Format,
}

impl Page {
    pub fn new(id: impl Into<String>, content: impl Into<String>, format: Format) -> Self {
        let id = PageId::new(id);
        Self {
            title: id.as_str().to_string(),
            id,
            content: content.into(),
            format,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Load a page from disk.
    ///
    /// The id is the file stem, the format comes from `format` or the file
    /// extension (markdown when neither decides).
    pub fn from_file(path: &Path, format: Option<Format>) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read page `{}`", path.display()))?;
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string());
        let format = format.or_else(|| Format::from_path(path)).unwrap_or_default();
        let title = extract_title(&content, format).unwrap_or_else(|| id.clone());

        Ok(Self::new(id, content, format).with_title(title))
    }
}

/// Persisted shape of a page, emitted upward on save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub title: String,
    pub content: String,
    pub format: Format,
}

/// First heading of a markdown page, `\title{..}` of a latex page.
fn extract_title(content: &str, format: Format) -> Option<String> {
    match format {
        Format::Markdown => content
            .lines()
            .find_map(|l| l.strip_prefix("# "))
            .map(|t| t.trim().to_string()),
        Format::Latex => {
            let start = content.find("\\title{")? + "\\title{".len();
            let end = content[start..].find('}')?;
            Some(content[start..start + end].trim().to_string())
        }
        Format::Typst => content
            .lines()
            .find_map(|l| l.strip_prefix("= "))
            .map(|t| t.trim().to_string()),
        Format::Diagram => None,
    }
    .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_extract_title() {
        assert_eq!(
            extract_title("intro\n# Sample Content\n", Format::Markdown),
            Some("Sample Content".to_string())
        );
        assert_eq!(
            extract_title("\\title{ Notes }\n\\begin{document}", Format::Latex),
            Some("Notes".to_string())
        );
        assert_eq!(extract_title("= Report", Format::Typst), Some("Report".to_string()));
        assert_eq!(extract_title("graph TD;", Format::Diagram), None);
        assert_eq!(extract_title("\\title{}", Format::Latex), None);
    }

    #[test]
    fn test_from_file_detects_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("thesis.tex");
        fs::write(&path, "\\title{Thesis}\n").unwrap();

        let page = Page::from_file(&path, None).unwrap();
        assert_eq!(page.id.as_str(), "thesis");
        assert_eq!(page.format, Format::Latex);
        assert_eq!(page.title, "Thesis");

        let forced = Page::from_file(&path, Some(Format::Typst)).unwrap();
        assert_eq!(forced.format, Format::Typst);
        assert_eq!(forced.title, "thesis");
    }

    #[test]
    fn test_from_file_missing() {
        let err = Page::from_file(Path::new("/nonexistent/page.md"), None).unwrap_err();
        assert!(err.to_string().contains("failed to read page"));
    }
}
