//! Actor Message Definitions
//!
//! ```text
//! stdin / FileWatcher --EditorMsg--> EditorActor --ViewState (watch)--> presenter
//! ```

use tokio::sync::oneshot;

use crate::editor::ViewState;
use crate::page::Format;

/// Messages to the Editor Actor
#[derive(Debug)]
pub enum EditorMsg {
    /// New page content (keystroke or file change on disk)
    Edit(String),
    ChangeFormat(Format),
    /// Compile now, bypassing the debounce
    CompileNow,
    SetAutoCompile(bool),
    SetPreview(bool),
    /// Persist the page now
    Save,
    /// Request the current view
    View(oneshot::Sender<ViewState>),
    /// Tear the session down and stop
    Shutdown,
}
