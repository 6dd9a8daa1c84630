//! Editor Actor
//!
//! Runs one [`EditorOrchestrator`] on one task. Everything that mutates the
//! session arrives through a single `select!` loop, so edits, timer fires,
//! compile completions and saves are handled strictly one at a time.
//!
//! ```text
//!            ┌──────────── EditorMsg (mpsc) ────────────┐
//!            │                                          ▼
//! stdin, FileWatcher                      EditorActor ── select! ──┬─ debounce Sleep
//!                                             │                    ├─ JoinSet<(generation, CompileResult)>
//!                                             │                    └─ autosave Interval
//!                                             ▼
//!                                  watch::Sender<ViewState> ──► presenter
//! ```

mod messages;
pub mod watch;

#[cfg(test)]
mod tests;

pub use messages::EditorMsg;

use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use rustc_hash::FxHashMap;
use tokio::sync::{mpsc, oneshot, watch as view_channel};
use tokio::task::{self, JoinError, JoinHandle, JoinSet};
use tokio::time::{Instant, Interval, Sleep, interval_at, sleep};

use crate::compile::{Command, CompileRequest, CompileResult, RemoteCompiler, TimerToken};
use crate::editor::{Applied, EditorOrchestrator, ViewState};
use crate::store::PageStore;

const CHANNEL_CAPACITY: usize = 64;

/// An armed debounce timer.
struct Armed {
    token: TimerToken,
    sleep: Pin<Box<Sleep>>,
}

type CompileTasks = JoinSet<(u64, CompileResult)>;
type Joined = Result<(task::Id, (u64, CompileResult)), JoinError>;

/// Sending side of an editor session.
#[derive(Clone)]
pub struct EditorHandle {
    tx: mpsc::Sender<EditorMsg>,
    view_rx: view_channel::Receiver<ViewState>,
}

impl EditorHandle {
    /// Returns `false` once the actor has stopped.
    pub async fn send(&self, msg: EditorMsg) -> bool {
        self.tx.send(msg).await.is_ok()
    }

    /// For threads outside the runtime (stdin reader, notify callback).
    pub fn blocking_send(&self, msg: EditorMsg) -> bool {
        self.tx.blocking_send(msg).is_ok()
    }

    /// Current view, after every message sent before this call was handled.
    pub async fn view(&self) -> Option<ViewState> {
        let (reply, rx) = oneshot::channel();
        if !self.send(EditorMsg::View(reply)).await {
            return None;
        }
        rx.await.ok()
    }

    /// Published views; changes whenever the observable state does.
    pub fn subscribe(&self) -> view_channel::Receiver<ViewState> {
        self.view_rx.clone()
    }
}

pub struct EditorActor<C: RemoteCompiler> {
    rx: mpsc::Receiver<EditorMsg>,
    view_tx: view_channel::Sender<ViewState>,
    editor: EditorOrchestrator,
    compiler: Arc<C>,
    store: Option<Arc<dyn PageStore>>,
    timer: Option<Armed>,
    tasks: CompileTasks,
    /// Generation of every outstanding compile task
    generations: FxHashMap<task::Id, u64>,
    autosave: Option<Interval>,
    /// Edits not yet persisted
    dirty: bool,
}

impl<C: RemoteCompiler> EditorActor<C> {
    /// `autosave` is the save period; `None` disables periodic saves.
    pub fn new(
        editor: EditorOrchestrator,
        compiler: Arc<C>,
        store: Option<Arc<dyn PageStore>>,
        autosave: Option<Duration>,
    ) -> (Self, EditorHandle) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (view_tx, view_rx) = view_channel::channel(editor.view());

        let autosave = autosave
            .filter(|_| store.is_some())
            .map(|period| interval_at(Instant::now() + period, period));

        let actor = Self {
            rx,
            view_tx,
            editor,
            compiler,
            store,
            timer: None,
            tasks: JoinSet::new(),
            generations: FxHashMap::default(),
            autosave,
            dirty: false,
        };
        (actor, EditorHandle { tx, view_rx })
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Main event loop
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                biased;

                msg = self.rx.recv() => match msg {
                    Some(EditorMsg::Shutdown) | None => break,
                    Some(msg) => self.dispatch(msg).await,
                },

                Some(joined) = self.tasks.join_next_with_id(), if !self.tasks.is_empty() => {
                    self.on_compiled(joined);
                }

                token = wait_timer(&mut self.timer) => {
                    let commands = self.editor.on_timer(token);
                    self.execute(commands);
                }

                _ = tick(&mut self.autosave) => {
                    if self.dirty {
                        self.save().await;
                    }
                }
            }
            self.publish();
        }

        self.shutdown().await;
    }

    async fn dispatch(&mut self, msg: EditorMsg) {
        let commands = match msg {
            EditorMsg::Edit(content) => {
                if content == self.editor.page().content {
                    return;
                }
                self.dirty = true;
                self.editor.edit_content(content)
            }
            EditorMsg::ChangeFormat(format) => {
                self.dirty |= format != self.editor.page().format;
                self.editor.change_format(format)
            }
            EditorMsg::CompileNow => self.editor.trigger_compile_now(),
            EditorMsg::SetAutoCompile(enabled) => {
                self.editor.toggle_auto_compile(enabled);
                vec![]
            }
            EditorMsg::SetPreview(enabled) => {
                self.editor.set_preview(enabled);
                vec![]
            }
            EditorMsg::Save => {
                self.save().await;
                vec![]
            }
            EditorMsg::View(reply) => {
                let _ = reply.send(self.view());
                vec![]
            }
            // Handled by the loop
            EditorMsg::Shutdown => vec![],
        };
        self.execute(commands);
    }

    fn execute(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::ArmTimer { token, delay } => {
                    self.timer = Some(Armed {
                        token,
                        sleep: Box::pin(sleep(delay)),
                    });
                }
                Command::CancelTimer => self.timer = None,
                Command::Dispatch(request) => self.spawn_compile(request),
            }
        }
    }

    fn spawn_compile(&mut self, request: CompileRequest) {
        crate::debug!(
            "compile";
            "{} ({}) generation {}",
            request.page_id,
            request.format,
            request.generation
        );
        let compiler = Arc::clone(&self.compiler);
        let CompileRequest {
            format,
            content,
            generation,
            ..
        } = request;
        let handle = self
            .tasks
            .spawn(async move { (generation, compiler.compile(format, content).await) });
        self.generations.insert(handle.id(), generation);
    }

    fn on_compiled(&mut self, joined: Joined) {
        let (generation, result) = match joined {
            Ok((id, outcome)) => {
                self.generations.remove(&id);
                outcome
            }
            Err(e) => {
                let Some(generation) = self.generations.remove(&e.id()) else {
                    return;
                };
                if e.is_cancelled() {
                    return;
                }
                crate::log!("compile"; "compile task for generation {} failed: {}", generation, e);
                (generation, CompileResult::failure(e.to_string()))
            }
        };

        let (applied, commands) = self.editor.apply_response(generation, result);
        match applied {
            Applied::Stale => crate::debug!("compile"; "dropped stale generation {}", generation),
            Applied::Succeeded | Applied::Failed => {
                crate::debug!("compile"; "generation {} {:?}", generation, applied)
            }
        }
        self.execute(commands);
    }

    /// Persist the page on the blocking pool. The actor waits for the write,
    /// so edits arriving meanwhile queue behind it.
    async fn save(&mut self) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let id = self.editor.page().id.clone();
        let snapshot = self.editor.snapshot();

        let result = task::spawn_blocking({
            let id = id.clone();
            move || store.save(&id, &snapshot)
        })
        .await;

        match result {
            Ok(Ok(())) => self.dirty = false,
            Ok(Err(e)) => crate::log!("save"; "failed to save {}: {:#}", id, anyhow::Error::from(e)),
            Err(e) => crate::log!("save"; "save task for {} failed: {}", id, e),
        }
    }

    fn view(&self) -> ViewState {
        let mut view = self.editor.view();
        view.unsaved = self.store.is_some() && self.dirty;
        view
    }

    fn publish(&self) {
        let view = self.view();
        self.view_tx.send_if_modified(|current| {
            if *current == view {
                return false;
            }
            *current = view;
            true
        });
    }

    async fn shutdown(&mut self) {
        let commands = self.editor.teardown();
        self.execute(commands);
        self.tasks.abort_all();
        self.generations.clear();

        if self.dirty {
            self.save().await;
        }
        self.publish();
        crate::debug!("editor"; "{} closed", self.editor.page().id);
    }
}

/// Wait for the armed timer (forever if none is armed).
async fn wait_timer(timer: &mut Option<Armed>) -> TimerToken {
    let token = match timer {
        Some(armed) => {
            armed.sleep.as_mut().await;
            armed.token
        }
        None => pending().await,
    };
    *timer = None;
    token
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending::<()>().await,
    }
}
