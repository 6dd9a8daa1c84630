//! Display handle providers.
//!
//! A provider turns artifact bytes into something the view can display and
//! takes it away again. Revoking is idempotent for every provider.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::{ArtifactError, ArtifactHandle};
use crate::page::PageId;

/// Creates and revokes display handles for artifact bytes.
pub trait HandleProvider: Send + Sync {
    fn create(&self, page: &PageId, bytes: &[u8]) -> Result<ArtifactHandle, ArtifactError>;

    /// Release a handle. Unknown or already revoked handles are ignored.
    fn revoke(&self, handle: &ArtifactHandle);
}

// =============================================================================
// In-memory provider
// =============================================================================

/// Keeps artifact bytes in memory and counts live handles.
#[derive(Default)]
pub struct MemoryHandles {
    next_id: AtomicU64,
    live: Mutex<FxHashMap<u64, Arc<[u8]>>>,
    created: AtomicUsize,
    revoked: AtomicUsize,
    peak_live: AtomicUsize,
}

impl MemoryHandles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles created and not yet revoked.
    pub fn live(&self) -> usize {
        self.live.lock().len()
    }

    /// Highest number of simultaneously live handles ever observed.
    pub fn peak_live(&self) -> usize {
        self.peak_live.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn revoked(&self) -> usize {
        self.revoked.load(Ordering::SeqCst)
    }

    /// Bytes behind a live handle.
    pub fn bytes(&self, handle: &ArtifactHandle) -> Option<Arc<[u8]>> {
        self.live.lock().get(&handle.id).cloned()
    }
}

impl HandleProvider for MemoryHandles {
    fn create(&self, page: &PageId, bytes: &[u8]) -> Result<ArtifactHandle, ArtifactError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let live = {
            let mut live = self.live.lock();
            live.insert(id, Arc::from(bytes));
            live.len()
        };
        self.created.fetch_add(1, Ordering::SeqCst);
        self.peak_live.fetch_max(live, Ordering::SeqCst);

        Ok(ArtifactHandle {
            id,
            page: page.clone(),
            locator: format!("memory://{page}/{id}"),
            len: bytes.len(),
        })
    }

    fn revoke(&self, handle: &ArtifactHandle) {
        if self.live.lock().remove(&handle.id).is_some() {
            self.revoked.fetch_add(1, Ordering::SeqCst);
        }
    }
}

// =============================================================================
// File provider
// =============================================================================

/// Writes each artifact to `<dir>/<page>-<id>.pdf` and deletes it on revoke.
pub struct FileHandles {
    dir: PathBuf,
    next_id: AtomicU64,
}

impl FileHandles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl HandleProvider for FileHandles {
    fn create(&self, page: &PageId, bytes: &[u8]) -> Result<ArtifactHandle, ArtifactError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let path = self.dir.join(format!("{page}-{id}.pdf"));

        fs::create_dir_all(&self.dir).map_err(|e| ArtifactError::Io(self.dir.clone(), e))?;
        fs::write(&path, bytes).map_err(|e| ArtifactError::Io(path.clone(), e))?;

        Ok(ArtifactHandle {
            id,
            page: page.clone(),
            locator: path.to_string_lossy().into_owned(),
            len: bytes.len(),
        })
    }

    fn revoke(&self, handle: &ArtifactHandle) {
        match fs::remove_file(&handle.locator) {
            Ok(()) => crate::debug!("artifact"; "revoked {}", handle.locator),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => crate::log!("artifact"; "failed to remove {}: {}", handle.locator, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_revoke_idempotent() {
        let handles = MemoryHandles::new();
        let page = PageId::new("p");
        let handle = handles.create(&page, b"%PDF-1.7").unwrap();
        assert_eq!(handles.live(), 1);

        handles.revoke(&handle);
        handles.revoke(&handle);
        assert_eq!(handles.live(), 0);
        assert_eq!(handles.revoked(), 1);
        assert!(handles.bytes(&handle).is_none());
    }

    #[test]
    fn test_file_create_and_revoke() {
        let dir = TempDir::new().unwrap();
        let handles = FileHandles::new(dir.path().join("pdf"));
        let page = PageId::new("notes");

        let handle = handles.create(&page, b"%PDF-1.5 body").unwrap();
        assert!(handle.locator.ends_with("notes-1.pdf"));
        assert_eq!(fs::read(&handle.locator).unwrap(), b"%PDF-1.5 body");

        handles.revoke(&handle);
        assert!(!Path::new(&handle.locator).exists());
        // Second revoke hits NotFound and is ignored
        handles.revoke(&handle);
    }
}
