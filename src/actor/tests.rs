use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep};

use super::{EditorActor, EditorHandle, EditorMsg};
use crate::artifact::MemoryHandles;
use crate::compile::{CompileResult, Phase, RemoteCompiler};
use crate::editor::{EditorOrchestrator, Preview, SessionOptions};
use crate::page::{Format, Page, PageId, PageSnapshot};
use crate::render::{RenderedOutput, Renderers};
use crate::store::{PageStore, StoreError};

const DEBOUNCE: Duration = Duration::from_millis(1000);

/// Content that makes the scripted compiler panic.
const CRASH: &str = "\\crash";

// =============================================================================
// Scripted collaborators
// =============================================================================

/// A compile call waiting for the test to answer it.
struct Call {
    format: Format,
    content: String,
    reply: oneshot::Sender<CompileResult>,
}

impl Call {
    fn succeed(self, pdf: &[u8]) {
        let _ = self.reply.send(CompileResult::Success { artifact: pdf.to_vec() });
    }

    fn fail(self, message: &str) {
        let _ = self.reply.send(CompileResult::failure(message));
    }
}

struct ScriptedCompiler {
    calls: mpsc::UnboundedSender<Call>,
}

impl RemoteCompiler for ScriptedCompiler {
    async fn compile(&self, format: Format, content: String) -> CompileResult {
        if content == CRASH {
            panic!("compiler crashed");
        }
        let (reply, rx) = oneshot::channel();
        let _ = self.calls.send(Call { format, content, reply });
        rx.await.unwrap_or_else(|_| CompileResult::failure("call dropped"))
    }
}

#[derive(Default)]
struct RecordingStore {
    saves: Mutex<Vec<PageSnapshot>>,
    fail: Mutex<bool>,
}

impl PageStore for RecordingStore {
    fn save(&self, _id: &PageId, snapshot: &PageSnapshot) -> Result<(), StoreError> {
        if *self.fail.lock() {
            return Err(StoreError::Io(
                "pages/doc.json".into(),
                std::io::Error::other("disk full"),
            ));
        }
        self.saves.lock().push(snapshot.clone());
        Ok(())
    }

    fn load(&self, _id: &PageId) -> Result<Option<PageSnapshot>, StoreError> {
        Ok(self.saves.lock().last().cloned())
    }
}

struct Harness {
    handle: EditorHandle,
    calls: mpsc::UnboundedReceiver<Call>,
    handles: Arc<MemoryHandles>,
    store: Arc<RecordingStore>,
    task: tokio::task::JoinHandle<()>,
}

fn start(page: Page, autosave: Option<Duration>) -> Harness {
    let handles = Arc::new(MemoryHandles::new());
    let store = Arc::new(RecordingStore::default());
    let (calls_tx, calls) = mpsc::unbounded_channel();

    let options = SessionOptions {
        debounce: DEBOUNCE,
        auto_compile: true,
    };
    let editor = EditorOrchestrator::new(page, Renderers::default(), handles.clone(), options);
    let compiler = Arc::new(ScriptedCompiler { calls: calls_tx });
    let (actor, handle) = EditorActor::new(editor, compiler, Some(store.clone()), autosave);

    Harness {
        handle,
        calls,
        handles,
        store,
        task: actor.spawn(),
    }
}

fn latex_page() -> Harness {
    start(Page::new("doc", "", Format::Latex), None)
}

impl Harness {
    async fn send(&self, msg: EditorMsg) {
        assert!(self.handle.send(msg).await, "actor stopped");
    }

    async fn edit(&self, content: &str) {
        self.send(EditorMsg::Edit(content.to_string())).await;
    }

    async fn view(&self) -> crate::editor::ViewState {
        self.handle.view().await.expect("actor stopped")
    }

    async fn next_call(&mut self) -> Call {
        self.calls.recv().await.expect("compiler dropped")
    }

    /// Let spawned compile tasks and the actor catch up.
    async fn settle(&self) {
        sleep(Duration::from_millis(1)).await;
    }
}

// =============================================================================
// Debounce
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_quiet_window_fires_one_compile() {
    let mut h = latex_page();
    let start = Instant::now();

    h.edit("\\section{A}").await;
    sleep(DEBOUNCE - Duration::from_millis(10)).await;
    assert!(h.calls.try_recv().is_err(), "compiled before the quiet window ended");
    assert_eq!(h.view().await.phase, Phase::Pending);

    let call = h.next_call().await;
    assert_eq!(call.format, Format::Latex);
    assert_eq!(call.content, "\\section{A}");
    assert!(start.elapsed() >= DEBOUNCE);
    assert_eq!(h.view().await.phase, Phase::InFlight);

    sleep(Duration::from_secs(10)).await;
    assert!(h.calls.try_recv().is_err(), "second compile fired");
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_edits_compiles_latest_once() {
    let mut h = latex_page();

    h.edit("a").await;
    sleep(Duration::from_millis(500)).await;
    h.edit("ab").await;
    let second_edit = Instant::now();
    sleep(Duration::from_millis(700)).await;
    assert!(h.calls.try_recv().is_err(), "first timer was not reset");

    let call = h.next_call().await;
    assert_eq!(call.content, "ab");
    assert!(second_edit.elapsed() >= DEBOUNCE);

    sleep(Duration::from_secs(10)).await;
    assert!(h.calls.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_auto_compile_off_needs_manual_trigger() {
    let mut h = latex_page();
    h.send(EditorMsg::SetAutoCompile(false)).await;
    h.edit("x").await;
    sleep(Duration::from_secs(5)).await;
    assert!(h.calls.try_recv().is_err());

    h.send(EditorMsg::CompileNow).await;
    assert_eq!(h.next_call().await.content, "x");
}

#[tokio::test(start_paused = true)]
async fn test_edits_while_in_flight_compile_again_after_response() {
    let mut h = latex_page();
    h.edit("v1").await;
    let first = h.next_call().await;

    h.edit("v2").await;
    sleep(Duration::from_secs(5)).await;
    assert!(h.calls.try_recv().is_err(), "timer path overlapped requests");

    first.succeed(b"%PDF-1.4 v1");
    let second = h.next_call().await;
    assert_eq!(second.content, "v2");
}

// =============================================================================
// Ordering
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_superseded_response_never_shown() {
    let mut h = latex_page();

    h.edit("a").await;
    let a = h.next_call().await;
    h.edit("b").await;
    h.send(EditorMsg::CompileNow).await;
    let b = h.next_call().await;
    assert_eq!(b.content, "b");

    a.succeed(b"%PDF-1.7 A");
    h.settle().await;
    let view = h.view().await;
    assert_eq!(view.preview, Preview::None);
    assert_eq!(view.phase, Phase::InFlight);
    assert_eq!(h.handles.created(), 0);

    b.succeed(b"%PDF-1.7 B");
    h.settle().await;
    let view = h.view().await;
    let shown = view.preview.artifact().cloned().expect("artifact shown");
    assert_eq!(h.handles.bytes(&shown).as_deref(), Some(&b"%PDF-1.7 B"[..]));
    assert_eq!(h.handles.created(), 1);
    assert_eq!(h.handles.peak_live(), 1);
    assert_eq!(view.phase, Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_failure_status_clears_artifact() {
    let mut h = latex_page();
    h.send(EditorMsg::CompileNow).await;
    h.next_call().await.succeed(b"%PDF-1.5");
    h.settle().await;
    assert_eq!(h.handles.live(), 1);

    h.send(EditorMsg::CompileNow).await;
    h.next_call().await.fail("Failed to compile LaTeX: exit status 1");
    h.settle().await;

    let view = h.view().await;
    assert_eq!(view.preview.error(), Some("Failed to compile LaTeX: exit status 1"));
    assert_eq!(h.handles.live(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_panicked_latest_compile_fails_the_page() {
    let mut h = latex_page();
    h.send(EditorMsg::CompileNow).await;
    let older = h.next_call().await;

    // Superseding request whose task panics while the older one is outstanding
    h.edit(CRASH).await;
    h.send(EditorMsg::CompileNow).await;
    h.settle().await;

    let view = h.view().await;
    assert_eq!(view.phase, Phase::Idle);
    assert!(view.preview.error().is_some_and(|e| e.contains("panicked")));

    older.succeed(b"%PDF-1.7 old");
    h.settle().await;
    assert_eq!(h.handles.created(), 0);

    // Auto compile still works afterwards
    h.edit("\\section{B}").await;
    assert_eq!(h.next_call().await.content, "\\section{B}");
}

#[tokio::test(start_paused = true)]
async fn test_format_switch_drops_late_response() {
    let mut h = start(Page::new("doc", "# Heading", Format::Latex), None);
    h.send(EditorMsg::CompileNow).await;
    let call = h.next_call().await;

    h.send(EditorMsg::ChangeFormat(Format::Markdown)).await;
    let switched = h.view().await;
    match &switched.preview {
        Preview::Rendered(RenderedOutput::Html(html)) => assert!(html.contains("<h1>Heading</h1>")),
        other => panic!("unexpected preview {other:?}"),
    }

    call.succeed(b"%PDF-1.7 late");
    h.settle().await;
    assert_eq!(h.view().await, switched);
    assert_eq!(h.handles.created(), 0);
}

// =============================================================================
// Persistence and lifecycle
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_autosave_only_when_dirty() {
    let h = start(Page::new("doc", "", Format::Markdown), Some(Duration::from_secs(30)));

    h.edit("# one").await;
    assert!(h.view().await.unsaved);

    sleep(Duration::from_secs(31)).await;
    assert_eq!(h.store.saves.lock().len(), 1);
    assert_eq!(h.store.saves.lock()[0].content, "# one");
    assert!(!h.view().await.unsaved);

    // Nothing changed since
    sleep(Duration::from_secs(30)).await;
    assert_eq!(h.store.saves.lock().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_save_marks_unsaved() {
    let h = start(Page::new("doc", "", Format::Markdown), None);
    *h.store.fail.lock() = true;

    h.edit("x").await;
    h.send(EditorMsg::Save).await;
    assert!(h.view().await.unsaved);

    *h.store.fail.lock() = false;
    h.send(EditorMsg::Save).await;
    assert!(!h.view().await.unsaved);
    assert_eq!(h.store.load(&PageId::new("doc")).unwrap().unwrap().content, "x");
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_tears_down() {
    let mut h = latex_page();
    h.send(EditorMsg::CompileNow).await;
    h.next_call().await.succeed(b"%PDF-1.5");
    h.settle().await;

    h.edit("unsaved edit").await;
    let pending = h.next_call().await;
    assert_eq!(h.handles.live(), 1);

    h.send(EditorMsg::Shutdown).await;
    h.task.await.unwrap();

    assert_eq!(h.handles.live(), 0);
    assert_eq!(h.store.saves.lock().last().unwrap().content, "unsaved edit");
    assert!(h.handle.view().await.is_none());

    // The aborted task dropped its side of the call
    sleep(Duration::from_millis(1)).await;
    assert!(pending.reply.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_changes() {
    let h = start(Page::new("doc", "", Format::Latex), None);
    let mut views = h.handle.subscribe();

    h.edit("\\begin{equation").await;
    views.changed().await.unwrap();
    let view = views.borrow_and_update().clone();
    assert_eq!(view.content, "\\begin{equation");
    assert_eq!(view.diagnostics.len(), 1);
}
