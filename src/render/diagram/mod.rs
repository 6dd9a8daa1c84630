//! Mermaid-style flowchart renderer.
//!
//! Supports `graph`/`flowchart` with a direction, box/round/decision/circle
//! nodes, and solid, open, thick and dotted links with optional labels.
//! Other diagram kinds are reported as unsupported so the editor falls back
//! to showing the source.

mod layout;
mod parse;

use super::{RenderError, RenderedOutput, Renderer};

/// Flowchart to SVG.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagramRenderer;

impl Renderer for DiagramRenderer {
    fn render(&self, content: &str) -> Result<RenderedOutput, RenderError> {
        let graph = parse::parse(content)?;
        Ok(RenderedOutput::Svg(layout::to_svg(&graph)))
    }
}
