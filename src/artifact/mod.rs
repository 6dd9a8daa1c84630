//! Compiled artifact ownership.
//!
//! [`ArtifactLifecycle`] holds at most one live display handle per page
//! session. A new artifact releases the previous handle before it is created,
//! so the view never sees two. Dropping the lifecycle releases whatever is
//! still held, which covers teardown on every exit path.

mod provider;

pub use provider::{FileHandles, HandleProvider, MemoryHandles};

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::page::PageId;

/// How far into the bytes the `%PDF-` marker may appear.
const PDF_HEADER_WINDOW: usize = 1024;

/// Artifact errors.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("compiled output is not a PDF document")]
    NotPdf,

    #[error("IO error when writing `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

/// A displayable artifact: decoded PDF bytes behind a provider-issued locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactHandle {
    pub id: u64,
    pub page: PageId,
    /// Where the view finds the artifact (file path, memory URL).
    pub locator: String,
    /// Size of the PDF in bytes.
    pub len: usize,
}

/// Owner of the single live artifact of a page session.
pub struct ArtifactLifecycle {
    page: PageId,
    provider: Arc<dyn HandleProvider>,
    current: Option<ArtifactHandle>,
}

impl ArtifactLifecycle {
    pub fn new(page: PageId, provider: Arc<dyn HandleProvider>) -> Self {
        Self {
            page,
            provider,
            current: None,
        }
    }

    /// Replace the current artifact with `bytes`.
    ///
    /// The previous handle is released first, also when `bytes` turn out not
    /// to be a PDF.
    pub fn set(&mut self, bytes: &[u8]) -> Result<ArtifactHandle, ArtifactError> {
        self.clear();

        if !looks_like_pdf(bytes) {
            return Err(ArtifactError::NotPdf);
        }

        let handle = self.provider.create(&self.page, bytes)?;
        crate::debug!("artifact"; "new {} ({} bytes)", handle.locator, handle.len);
        self.current = Some(handle.clone());
        Ok(handle)
    }

    /// Release the current artifact, if any.
    pub fn clear(&mut self) {
        if let Some(handle) = self.current.take() {
            self.provider.revoke(&handle);
        }
    }

    /// End of the page session.
    pub fn teardown(&mut self) {
        self.clear();
    }

    pub fn current(&self) -> Option<&ArtifactHandle> {
        self.current.as_ref()
    }

    /// Move to another page; the old page's artifact is released.
    pub fn rebind(&mut self, page: PageId) {
        self.clear();
        self.page = page;
    }
}

impl Drop for ArtifactLifecycle {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn looks_like_pdf(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(PDF_HEADER_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}
