//! Page File Watcher
//!
//! Turns writes to the page's source file into [`EditorMsg::Edit`].
//!
//! ```text
//! notify callback → std thread → Debouncer → read file → EditorMsg::Edit
//! ```
//!
//! The parent directory is watched rather than the file itself, so editors
//! that save by writing a temp file and renaming it over the original keep
//! being tracked.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{EditorHandle, EditorMsg};

/// Quiet time before a burst of notify events counts as one write.
const DEBOUNCE_MS: u64 = 100;

/// Collapses bursts of notify events for one file name.
struct Debouncer {
    file_name: OsString,
    last_event: Option<Instant>,
}

impl Debouncer {
    fn new(file_name: OsString) -> Self {
        Self {
            file_name,
            last_event: None,
        }
    }

    fn add_event(&mut self, event: &notify::Event) {
        match event.kind {
            EventKind::Create(_) | EventKind::Remove(_) => {}
            // Metadata-only changes (mtime/chmod) carry no new content
            EventKind::Modify(notify::event::ModifyKind::Metadata(_)) => return,
            EventKind::Modify(_) => {}
            _ => return,
        }

        let touches_page = event
            .paths
            .iter()
            .any(|path| path.file_name() == Some(self.file_name.as_os_str()));
        if touches_page {
            crate::debug!("watch"; "{:?} {:?}", event.kind, event.paths);
            self.last_event = Some(Instant::now());
        }
    }

    fn is_ready(&self) -> bool {
        self.last_event
            .is_some_and(|last| last.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take_if_ready(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.last_event = None;
        true
    }

    fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };
        Duration::from_millis(DEBOUNCE_MS)
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}

/// Keeps the OS watcher alive; dropping it stops forwarding edits.
pub struct PageWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl PageWatcher {
    /// Start watching `path`, forwarding its content to `editor` on change.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(path: &Path, editor: EditorHandle) -> notify::Result<Self> {
        let path = std::path::absolute(path)?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = path.file_name().map(OsString::from).unwrap_or_default();

        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        let (event_tx, event_rx) = mpsc::unbounded_channel::<notify::Event>();
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if event_tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        crate::debug!("watch"; "watching {}", path.display());
        let task = tokio::spawn(forward_edits(path, Debouncer::new(file_name), event_rx, editor));

        Ok(Self {
            _watcher: watcher,
            task,
        })
    }
}

impl Drop for PageWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn forward_edits(
    path: PathBuf,
    mut debouncer: Debouncer,
    mut events: mpsc::UnboundedReceiver<notify::Event>,
    editor: EditorHandle,
) {
    loop {
        tokio::select! {
            biased;

            event = events.recv() => match event {
                Some(event) => debouncer.add_event(&event),
                None => break,
            },

            _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                if !debouncer.take_if_ready() {
                    continue;
                }
                match std::fs::read_to_string(&path) {
                    Ok(content) => {
                        if !editor.send(EditorMsg::Edit(content)).await {
                            break;
                        }
                    }
                    // Mid-rename or deleted; a later event brings it back
                    Err(e) => crate::debug!("watch"; "cannot read {}: {}", path.display(), e),
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
