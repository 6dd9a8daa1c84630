//! Per-page editor session.
//!
//! [`EditorOrchestrator`] is the single owner of a page's content, format,
//! diagnostics, local preview, compile session and artifact. It performs no
//! I/O and never waits: operations that need a timer or a network call return
//! scheduler [`Command`]s for the caller (the actor, or a test) to execute, and
//! compile outcomes come back through [`apply_response`].
//!
//! [`apply_response`]: EditorOrchestrator::apply_response

mod view;

pub use view::{Preview, ViewState};

use std::sync::Arc;
use std::time::Duration;

use crate::artifact::{ArtifactLifecycle, HandleProvider};
use crate::compile::{Command, CompileResult, CompileScheduler, Phase, TimerToken};
use crate::lint::{self, Diagnostic};
use crate::page::{Format, Page, PageSnapshot};
use crate::render::{RenderedOutput, Renderers, render_guarded};

/// Quiet window after the last edit before an automatic compile.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Scheduling options of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub debounce: Duration,
    pub auto_compile: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            auto_compile: true,
        }
    }
}

/// How a compile response was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Superseded generation, dropped without effect
    Stale,
    Succeeded,
    Failed,
}

pub struct EditorOrchestrator {
    page: Page,
    preview_mode: bool,
    diagnostics: Vec<Diagnostic>,
    rendered: Option<RenderedOutput>,
    options: SessionOptions,
    scheduler: CompileScheduler,
    artifacts: ArtifactLifecycle,
    renderers: Renderers,
}

impl EditorOrchestrator {
    pub fn new(page: Page, renderers: Renderers, provider: Arc<dyn HandleProvider>, options: SessionOptions) -> Self {
        let mut editor = Self {
            preview_mode: false,
            diagnostics: Vec::new(),
            rendered: None,
            scheduler: CompileScheduler::new(options.debounce, options.auto_compile),
            artifacts: ArtifactLifecycle::new(page.id.clone(), provider),
            options,
            renderers,
            page,
        };
        editor.preview_mode = editor.page.format.is_remote();
        editor.refresh();
        editor
    }

    /// Start a fresh session for `page`.
    ///
    /// Responses still outstanding from the previous session must be dropped
    /// by the caller: generations restart at 0.
    pub fn load_page(&mut self, page: Page) -> Vec<Command> {
        let commands = self.scheduler.reset();
        self.artifacts.rebind(page.id.clone());
        self.scheduler = CompileScheduler::new(self.options.debounce, self.scheduler.auto_compile());
        self.preview_mode = page.format.is_remote();
        self.page = page;
        self.refresh();
        commands
    }

    pub fn edit_content(&mut self, content: impl Into<String>) -> Vec<Command> {
        self.page.content = content.into();
        self.refresh();

        if self.page.format.is_remote() {
            self.scheduler.on_edit()
        } else {
            vec![]
        }
    }

    /// Switch format: everything compiled or in flight for the old format is
    /// dropped. No compile is started.
    pub fn change_format(&mut self, format: Format) -> Vec<Command> {
        if format == self.page.format {
            return vec![];
        }

        let commands = self.scheduler.reset();
        self.artifacts.clear();
        crate::debug!("editor"; "{}: {} -> {}", self.page.id, self.page.format, format);

        self.page.format = format;
        if format.is_remote() {
            self.preview_mode = true;
        }
        self.refresh();
        commands
    }

    /// Compile immediately. Local formats just re-render.
    pub fn trigger_compile_now(&mut self) -> Vec<Command> {
        if !self.page.format.is_remote() {
            self.refresh();
            return vec![];
        }
        let Page { id, format, content, .. } = &self.page;
        self.scheduler.compile_now(id, *format, content)
    }

    /// Debounce timer fired.
    pub fn on_timer(&mut self, token: TimerToken) -> Vec<Command> {
        let Page { id, format, content, .. } = &self.page;
        self.scheduler.on_timer(token, id, *format, content)
    }

    pub fn toggle_auto_compile(&mut self, enabled: bool) {
        self.scheduler.set_auto_compile(enabled);
    }

    /// Remote formats always preview.
    pub fn set_preview(&mut self, enabled: bool) {
        self.preview_mode = enabled || self.page.format.is_remote();
        self.refresh();
    }

    /// Apply a compile outcome, unless a newer request or a format switch
    /// superseded it.
    ///
    /// The returned commands re-arm the debounce when edits arrived while the
    /// request was in flight.
    pub fn apply_response(&mut self, generation: u64, result: CompileResult) -> (Applied, Vec<Command>) {
        let failure = match &result {
            CompileResult::Success { .. } => None,
            CompileResult::Failure { message } => Some(message.as_str()),
        };
        if !self.scheduler.on_response(generation, failure) {
            return (Applied::Stale, vec![]);
        }

        let applied = match result {
            CompileResult::Success { artifact } => match self.artifacts.set(&artifact) {
                Ok(handle) => {
                    crate::debug!("editor"; "{}: compiled ({} bytes)", self.page.id, handle.len);
                    Applied::Succeeded
                }
                Err(e) => {
                    self.scheduler.fail(&e.to_string());
                    Applied::Failed
                }
            },
            CompileResult::Failure { .. } => {
                self.artifacts.clear();
                Applied::Failed
            }
        };

        (applied, self.scheduler.settle())
    }

    /// End of the session: orphan in-flight work, release the artifact.
    pub fn teardown(&mut self) -> Vec<Command> {
        let commands = self.scheduler.reset();
        self.artifacts.teardown();
        commands
    }

    pub fn view(&self) -> ViewState {
        let preview = if let Some(message) = self.scheduler.failure() {
            Preview::Error(message.to_string())
        } else if let Some(handle) = self.artifacts.current() {
            Preview::Artifact(handle.clone())
        } else if let Some(rendered) = &self.rendered {
            Preview::Rendered(rendered.clone())
        } else {
            Preview::None
        };

        ViewState {
            page_id: self.page.id.clone(),
            format: self.page.format,
            content: self.page.content.clone(),
            diagnostics: self.diagnostics.clone(),
            preview,
            phase: self.scheduler.phase(),
            auto_compile: self.scheduler.auto_compile(),
            preview_mode: self.preview_mode,
            unsaved: false,
        }
    }

    pub fn snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            title: self.page.title.clone(),
            content: self.page.content.clone(),
            format: self.page.format,
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn phase(&self) -> Phase {
        self.scheduler.phase()
    }

    pub fn latest_generation(&self) -> u64 {
        self.scheduler.latest_generation()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn preview_mode(&self) -> bool {
        self.preview_mode
    }

    /// Recompute everything derived from content and format.
    fn refresh(&mut self) {
        self.diagnostics = if self.page.format.has_diagnostics() {
            lint::lint(&self.page.content)
        } else {
            Vec::new()
        };

        self.rendered = match self.renderers.for_format(self.page.format) {
            Some(renderer) if self.preview_mode => Some(render_guarded(renderer, &self.page.content)),
            _ => None,
        };
    }
}
