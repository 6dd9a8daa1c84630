//! Page persistence.
//!
//! Saving runs on its own schedule, apart from compilation. A failed save is
//! reported to the caller, which logs it and marks the page unsaved; it never
//! reaches the compile pipeline.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::page::{PageId, PageSnapshot};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error when accessing `{0}`")]
    Io(PathBuf, #[source] io::Error),

    #[error("invalid page data in `{0}`")]
    Json(PathBuf, #[source] serde_json::Error),
}

/// Where page snapshots go.
pub trait PageStore: Send + Sync {
    fn save(&self, id: &PageId, snapshot: &PageSnapshot) -> Result<(), StoreError>;

    fn load(&self, id: &PageId) -> Result<Option<PageSnapshot>, StoreError>;
}

/// One pretty-printed JSON file per page: `<dir>/<page_id>.json`.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_of(&self, id: &PageId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PageStore for JsonStore {
    fn save(&self, id: &PageId, snapshot: &PageSnapshot) -> Result<(), StoreError> {
        let path = self.path_of(id);
        let json = serde_json::to_vec_pretty(snapshot).map_err(|e| StoreError::Json(path.clone(), e))?;

        fs::create_dir_all(&self.dir).map_err(|e| StoreError::Io(self.dir.clone(), e))?;

        // Write aside, then rename over the old file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StoreError::Io(tmp.clone(), e))?;
        fs::rename(&tmp, &path).map_err(|e| StoreError::Io(path.clone(), e))?;

        crate::debug!("save"; "{} -> {}", id, path.display());
        Ok(())
    }

    fn load(&self, id: &PageId) -> Result<Option<PageSnapshot>, StoreError> {
        let path = self.path_of(id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(path, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::Json(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Format;
    use tempfile::TempDir;

    fn snapshot(content: &str) -> PageSnapshot {
        PageSnapshot {
            title: "Notes".into(),
            content: content.into(),
            format: Format::Typst,
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("pages"));
        let id = PageId::new("notes");

        assert!(store.load(&id).unwrap().is_none());

        store.save(&id, &snapshot("= One")).unwrap();
        store.save(&id, &snapshot("= Two")).unwrap();
        assert_eq!(store.load(&id).unwrap(), Some(snapshot("= Two")));

        // No temp file left behind
        let names: Vec<_> = fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("notes.json")]);
    }

    #[test]
    fn test_saved_json_shape() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path());
        let id = PageId::new("p");
        store.save(&id, &snapshot("x")).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&fs::read(store.path_of(&id)).unwrap()).unwrap();
        assert_eq!(value["title"], "Notes");
        assert_eq!(value["format"], "typst");
        assert_eq!(value["content"], "x");
    }

    #[test]
    fn test_save_into_file_path_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let store = JsonStore::new(&blocker);
        let err = store.save(&PageId::new("p"), &snapshot("x")).unwrap_err();
        assert!(matches!(err, StoreError::Io(..)));
    }

    #[test]
    fn test_load_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path());
        fs::write(store.path_of(&PageId::new("bad")), "{").unwrap();
        assert!(matches!(store.load(&PageId::new("bad")), Err(StoreError::Json(..))));
    }
}
