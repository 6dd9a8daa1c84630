//! Observable surface of an editor session.

use crate::artifact::ArtifactHandle;
use crate::compile::Phase;
use crate::lint::Diagnostic;
use crate::page::{Format, PageId};
use crate::render::RenderedOutput;

/// What the preview pane shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Preview {
    #[default]
    None,
    /// Local rendering of a markdown or diagram page
    Rendered(RenderedOutput),
    /// Compiled PDF of a LaTeX or Typst page
    Artifact(ArtifactHandle),
    /// Last compile failure
    Error(String),
}

impl Preview {
    pub fn artifact(&self) -> Option<&ArtifactHandle> {
        match self {
            Self::Artifact(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Snapshot of everything the presentation layer may observe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub page_id: PageId,
    pub format: Format,
    pub content: String,
    pub diagnostics: Vec<Diagnostic>,
    pub preview: Preview,
    pub phase: Phase,
    pub auto_compile: bool,
    /// Local formats render only while this is on; remote formats always preview
    pub preview_mode: bool,
    /// Last save attempt failed, or edits are not yet persisted
    pub unsaved: bool,
}
