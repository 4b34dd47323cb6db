//! Persistence for unsent composer text, keyed by [`DraftKey`](comment_thread::DraftKey) names.
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{debug, warn};

use crate::logging::get_data_dir;

pub const DRAFTS_FILE: &str = "drafts/drafts.json";

pub trait DraftStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, text: &str) -> std::io::Result<()>;
    fn remove(&self, key: &str) -> std::io::Result<()>;
}

/// Drafts kept as one JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileDraftStore {
    path: PathBuf,
    drafts: Mutex<HashMap<String, String>>,
}

impl FileDraftStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let drafts = read_drafts(&path);
        debug!(count = drafts.len(), path = %path.display(), "Opened draft store");
        Self {
            path,
            drafts: Mutex::new(drafts),
        }
    }

    /// The store in the application data directory.
    pub fn open_default() -> Self {
        Self::open(get_data_dir().join(DRAFTS_FILE))
    }

    fn write_to_file(&self, drafts: &HashMap<String, String>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_vec(drafts)?;
        std::fs::write(&self.path, contents)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.drafts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn read_drafts(path: &Path) -> HashMap<String, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            warn!(%err, "Ignoring unreadable drafts file");
            HashMap::new()
        }),
        Err(_) => HashMap::new(),
    }
}

impl DraftStore for FileDraftStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, text: &str) -> std::io::Result<()> {
        let mut drafts = self.lock();
        drafts.insert(key.to_string(), text.to_string());
        self.write_to_file(&drafts)
    }

    fn remove(&self, key: &str) -> std::io::Result<()> {
        let mut drafts = self.lock();
        if drafts.remove(key).is_none() {
            return Ok(());
        }
        self.write_to_file(&drafts)
    }
}

#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    drafts: Mutex<HashMap<String, String>>,
}

impl MemoryDraftStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.drafts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DraftStore for MemoryDraftStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, text: &str) -> std::io::Result<()> {
        self.lock().insert(key.to_string(), text.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> std::io::Result<()> {
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use comment_thread::{CommentId, DraftKey};

    use super::*;

    #[test]
    fn file_store_survives_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/drafts.json");
        let main = DraftKey::Main.to_string();
        let thread = DraftKey::Thread(CommentId(4)).to_string();

        let store = FileDraftStore::open(&path);
        store.set(&main, "half a thought").unwrap();
        store.set(&thread, "reply draft").unwrap();
        store.remove(&main).unwrap();

        let reopened = FileDraftStore::open(&path);
        assert_eq!(reopened.get(&main), None);
        assert_eq!(reopened.get(&thread).as_deref(), Some("reply draft"));
    }

    #[test]
    fn file_store_tolerates_a_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drafts.json");
        std::fs::write(&path, "][").unwrap();
        let store = FileDraftStore::open(&path);
        assert_eq!(store.get("commentDraft_main"), None);
        store.set("commentDraft_main", "fresh").unwrap();
        assert_eq!(
            FileDraftStore::open(&path).get("commentDraft_main").as_deref(),
            Some("fresh")
        );
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryDraftStore::default();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k"), None);
    }
}
