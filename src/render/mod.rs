//! Local preview rendering.
//!
//! Markdown and diagram pages are rendered synchronously on every change.
//! Renderers are collaborators behind the [`Renderer`] trait; the editor only
//! ever calls them through [`render_guarded`], which turns both errors and
//! panics into a preformatted fallback of the raw content.

pub mod diagram;
pub mod markdown;

use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

use crate::page::Format;
use crate::utils::html::escape;

pub use diagram::DiagramRenderer;
pub use markdown::MarkdownRenderer;

/// Output of a local render, ready to hand to the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedOutput {
    /// HTML fragment (markdown)
    Html(String),
    /// Standalone SVG document (diagrams)
    Svg(String),
    /// Raw content shown as-is (render fallback)
    Preformatted(String),
}

impl RenderedOutput {
    /// Markup suitable for embedding in a page.
    pub fn to_markup(&self) -> Cow<'_, str> {
        match self {
            Self::Html(html) => Cow::Borrowed(html),
            Self::Svg(svg) => Cow::Borrowed(svg),
            Self::Preformatted(raw) => Cow::Owned(format!("<pre>{}</pre>", escape(raw))),
        }
    }

    /// File extension used when the preview is written to disk.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Svg(_) => "svg",
            Self::Html(_) | Self::Preformatted(_) => "html",
        }
    }

    #[inline]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Preformatted(_))
    }
}

/// Render failures. Never fatal: the caller falls back to raw content.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("empty diagram")]
    Empty,

    #[error("unsupported diagram type `{0}` (only flowcharts are rendered)")]
    UnsupportedDiagram(String),

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("renderer panicked: {0}")]
    Panicked(String),
}

/// Text to preview renderer.
///
/// Implementations must be idempotent and free of side effects; they are
/// invoked from scratch on every content change.
pub trait Renderer: Send + Sync {
    fn render(&self, content: &str) -> Result<RenderedOutput, RenderError>;
}

/// The renderers for locally previewed formats.
pub struct Renderers {
    markdown: Box<dyn Renderer>,
    diagram: Box<dyn Renderer>,
}

impl Default for Renderers {
    fn default() -> Self {
        Self {
            markdown: Box::new(MarkdownRenderer::default()),
            diagram: Box::new(DiagramRenderer),
        }
    }
}

impl Renderers {
    pub fn new(markdown: Box<dyn Renderer>, diagram: Box<dyn Renderer>) -> Self {
        Self { markdown, diagram }
    }

    /// Renderer for a format, `None` for remote-compiled formats.
    pub fn for_format(&self, format: Format) -> Option<&dyn Renderer> {
        match format {
            Format::Markdown => Some(self.markdown.as_ref()),
            Format::Diagram => Some(self.diagram.as_ref()),
            Format::Latex | Format::Typst => None,
        }
    }
}

/// Render without letting a failure escape.
///
/// Errors and panics are logged and replaced by the raw content.
pub fn render_guarded(renderer: &dyn Renderer, content: &str) -> RenderedOutput {
    let result = panic::catch_unwind(AssertUnwindSafe(|| renderer.render(content)))
        .unwrap_or_else(|payload| Err(RenderError::Panicked(panic_message(payload.as_ref()))));

    match result {
        Ok(output) => output,
        Err(e) => {
            crate::log!("render"; "{}", e);
            RenderedOutput::Preformatted(content.to_string())
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
