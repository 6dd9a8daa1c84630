//! Markdown preview with pulldown-cmark.

use pulldown_cmark::{Options, Parser, html};

use super::{RenderError, RenderedOutput, Renderer};

/// Options for markdown rendering
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    /// Enable tables extension
    pub tables: bool,
    /// Enable footnotes extension
    pub footnotes: bool,
    /// Enable strikethrough extension
    pub strikethrough: bool,
    /// Enable task lists extension
    pub task_lists: bool,
    /// Enable `$inline$` and `$$display$$` math
    pub math: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            tables: true,
            footnotes: true,
            strikethrough: true,
            task_lists: true,
            math: true,
        }
    }
}

impl MarkdownOptions {
    fn to_pulldown_options(&self) -> Options {
        let mut opts = Options::empty();
        if self.tables {
            opts.insert(Options::ENABLE_TABLES);
        }
        if self.footnotes {
            opts.insert(Options::ENABLE_FOOTNOTES);
        }
        if self.strikethrough {
            opts.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.task_lists {
            opts.insert(Options::ENABLE_TASKLISTS);
        }
        if self.math {
            opts.insert(Options::ENABLE_MATH);
        }
        opts
    }
}

/// Markdown to HTML fragment.
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    options: MarkdownOptions,
}

impl MarkdownRenderer {
    pub fn with_options(options: MarkdownOptions) -> Self {
        Self { options }
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, content: &str) -> Result<RenderedOutput, RenderError> {
        let parser = Parser::new_ext(content, self.options.to_pulldown_options());
        let mut out = String::with_capacity(content.len() * 3 / 2);
        html::push_html(&mut out, parser);
        Ok(RenderedOutput::Html(out))
    }
}
