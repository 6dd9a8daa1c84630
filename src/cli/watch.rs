//! `folio watch`: live preview of one page.
//!
//! ```text
//! stdin ──┐
//! file ───┼── EditorMsg ──► EditorActor ──ViewState──► presenter (status line, preview files)
//! Ctrl+C ─┘
//! ```

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;

use super::PageArgs;
use super::render::write_output;
use crate::actor::watch::PageWatcher;
use crate::actor::{EditorActor, EditorHandle, EditorMsg};
use crate::artifact::FileHandles;
use crate::compile::{HttpCompiler, Phase};
use crate::config::FolioConfig;
use crate::editor::{EditorOrchestrator, Preview, SessionOptions, ViewState};
use crate::logger::{status_error, status_success, status_warning};
use crate::page::{Format, Page};
use crate::render::Renderers;
use crate::store::{JsonStore, PageStore};
use crate::{debug, log};

const HELP: &str = "enter: compile  s: save  p: toggle preview  a: toggle auto compile  f <format>: switch format  q: quit";

pub fn watch_page(args: &PageArgs, config: &FolioConfig) -> Result<()> {
    let page = Page::from_file(&args.file, args.format)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    runtime.block_on(run_session(page, &args.file, config))
}

async fn run_session(page: Page, file: &Path, config: &FolioConfig) -> Result<()> {
    let options = SessionOptions {
        debounce: config.compile.debounce(),
        auto_compile: config.compile.auto_compile,
    };
    let provider = Arc::new(FileHandles::new(&config.preview.output));
    let store: Arc<dyn PageStore> = Arc::new(JsonStore::new(&config.save.dir));
    let compiler = Arc::new(HttpCompiler::new(&config.compile.server, config.compile.timeout())?);
    let autosave = config.save.enabled.then(|| config.save.interval());

    log!(
        "watch";
        "{} ({}), compile service {}",
        page.id,
        page.format,
        compiler.base()
    );

    let editor = EditorOrchestrator::new(page, Renderers::default(), provider, options);
    let (actor, handle) = EditorActor::new(editor, compiler, Some(store), autosave);
    let actor = actor.spawn();

    let presenter = tokio::spawn(present(handle.subscribe(), config.preview.output.clone()));
    handle.send(EditorMsg::SetPreview(true)).await;

    let watcher = PageWatcher::start(file, handle.clone())
        .with_context(|| format!("failed to watch `{}`", file.display()))?;

    let interrupt = handle.clone();
    ctrlc::set_handler(move || {
        interrupt.blocking_send(EditorMsg::Shutdown);
    })
    .context("failed to set Ctrl+C handler")?;

    spawn_input_reader(handle);
    log!("watch"; "{}", HELP);

    actor.await.context("editor task failed")?;
    drop(watcher);
    presenter.abort();

    log!("watch"; "stopped");
    Ok(())
}

// =============================================================================
// Terminal input
// =============================================================================

/// A line typed on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    CompileNow,
    Save,
    TogglePreview,
    ToggleAutoCompile,
    ChangeFormat(Format),
    Quit,
    Help,
}

impl Input {
    fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        match line.split_once(char::is_whitespace) {
            Some(("f" | "format", format)) => format.trim().parse().map(Self::ChangeFormat),
            _ => match line {
                "" | "c" => Ok(Self::CompileNow),
                "s" => Ok(Self::Save),
                "p" => Ok(Self::TogglePreview),
                "a" => Ok(Self::ToggleAutoCompile),
                "q" | "quit" => Ok(Self::Quit),
                "h" | "?" | "help" => Ok(Self::Help),
                other => Err(format!("unknown command `{other}`")),
            },
        }
    }

    /// Toggles flip whatever the current view shows.
    fn message(self, view: &ViewState) -> Option<EditorMsg> {
        Some(match self {
            Self::CompileNow => EditorMsg::CompileNow,
            Self::Save => EditorMsg::Save,
            Self::TogglePreview => EditorMsg::SetPreview(!view.preview_mode),
            Self::ToggleAutoCompile => EditorMsg::SetAutoCompile(!view.auto_compile),
            Self::ChangeFormat(format) => EditorMsg::ChangeFormat(format),
            Self::Quit => EditorMsg::Shutdown,
            Self::Help => return None,
        })
    }
}

fn spawn_input_reader(handle: EditorHandle) {
    std::thread::spawn(move || {
        let views = handle.subscribe();

        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let input = match Input::parse(&line) {
                Ok(input) => input,
                Err(e) => {
                    log!("watch"; "{}", e);
                    continue;
                }
            };

            let view = views.borrow().clone();
            match input.message(&view) {
                Some(msg) => {
                    if !handle.blocking_send(msg) {
                        break;
                    }
                }
                None => log!("watch"; "{}", HELP),
            }
        }
    });
}

// =============================================================================
// Presenter
// =============================================================================

async fn present(mut views: watch::Receiver<ViewState>, output: PathBuf) {
    let mut last = views.borrow_and_update().clone();
    report(None, &last, &output);

    while views.changed().await.is_ok() {
        let view = views.borrow_and_update().clone();
        report(Some(&last), &view, &output);
        last = view;
    }
}

/// Describe what changed between two views.
fn report(previous: Option<&ViewState>, view: &ViewState, output: &Path) {
    if previous.is_none_or(|p| p.diagnostics != view.diagnostics) && !view.diagnostics.is_empty() {
        let lines: Vec<String> = view.diagnostics.iter().map(ToString::to_string).collect();
        status_warning(&lines.join("\n"));
    }

    if previous.is_some_and(|p| p.phase != view.phase) && view.phase == Phase::InFlight {
        debug!("compile"; "{} compiling", view.page_id);
    }

    if previous.is_none_or(|p| p.auto_compile != view.auto_compile) {
        let state = if view.auto_compile { "on" } else { "off" };
        log!("watch"; "auto compile {}", state);
    }

    if previous.is_some_and(|p| p.preview == view.preview) {
        return;
    }

    match &view.preview {
        Preview::None => {}
        Preview::Rendered(rendered) => {
            let path = output.join(format!("{}.{}", view.page_id, rendered.extension()));
            match write_output(&path, rendered.to_markup().as_bytes()) {
                Ok(()) => status_success(&format!("rendered {} -> {}", view.page_id, path.display())),
                Err(e) => status_error(&format!("failed to write preview of {}", view.page_id), &format!("{e:#}")),
            }
        }
        Preview::Artifact(handle) => status_success(&format!(
            "compiled {} -> {} ({} bytes)",
            view.page_id, handle.locator, handle.len
        )),
        Preview::Error(message) => status_error(&format!("compile failed: {}", view.page_id), message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::MemoryHandles;

    fn view(page: Page, preview: bool) -> ViewState {
        let mut editor = EditorOrchestrator::new(
            page,
            Renderers::default(),
            Arc::new(MemoryHandles::new()),
            SessionOptions::default(),
        );
        editor.set_preview(preview);
        editor.view()
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(Input::parse(""), Ok(Input::CompileNow));
        assert_eq!(Input::parse(" s "), Ok(Input::Save));
        assert_eq!(Input::parse("q"), Ok(Input::Quit));
        assert_eq!(Input::parse("f typst"), Ok(Input::ChangeFormat(Format::Typst)));
        assert_eq!(Input::parse("format  md"), Ok(Input::ChangeFormat(Format::Markdown)));
        assert!(Input::parse("f docx").is_err());
        assert!(Input::parse("x").is_err());
    }

    #[test]
    fn test_toggles_follow_state() {
        let on = view(Page::new("notes", "", Format::Markdown), true);
        let off = view(Page::new("notes", "", Format::Markdown), false);

        assert!(matches!(Input::TogglePreview.message(&on), Some(EditorMsg::SetPreview(false))));
        assert!(matches!(Input::TogglePreview.message(&off), Some(EditorMsg::SetPreview(true))));
        assert!(matches!(
            Input::ToggleAutoCompile.message(&on),
            Some(EditorMsg::SetAutoCompile(false))
        ));
        assert!(Input::Help.message(&on).is_none());
    }

    #[test]
    fn test_preview_toggle_after_remote_format() {
        // Remote formats keep preview mode on
        let latex = view(Page::new("doc", "", Format::Latex), false);
        assert!(latex.preview_mode);
        assert!(matches!(Input::TogglePreview.message(&latex), Some(EditorMsg::SetPreview(false))));
    }

    #[test]
    fn test_report_writes_rendered_preview() {
        let dir = tempfile::tempdir().unwrap();
        let before = view(Page::new("notes", "# A", Format::Markdown), false);
        let after = view(Page::new("notes", "# A", Format::Markdown), true);

        report(Some(&before), &after, dir.path());
        let html = std::fs::read_to_string(dir.path().join("notes.html")).unwrap();
        assert!(html.contains("<h1>A</h1>"));
    }

    #[test]
    fn test_report_skips_unchanged_preview() {
        let dir = tempfile::tempdir().unwrap();
        let current = view(Page::new("notes", "# A", Format::Markdown), true);

        report(Some(&current), &current, dir.path());
        assert!(!dir.path().join("notes.html").exists());
    }
}
