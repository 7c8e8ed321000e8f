use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

pub const PROGRESS_KEY: &str = "ilm.progress";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] io::Error),
    #[error("store encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// String-keyed blob storage. Callers own the encoding of values.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Keeps every entry in one JSON object on disk, rewritten on each `set`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    // A corrupt file must not block every later write, so it is replaced.
    fn read_for_write(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match self.read_all() {
            Err(StoreError::Json(err)) => {
                warn!("overwriting corrupt store {}: {}", self.path.display(), err);
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    // Writes a sibling temp file and renames it over the store.
    fn write_all(&self, all: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(serde_json::to_string_pretty(all)?.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let mut all = self.read_for_write()?;
        all.insert(key.to_string(), value);
        self.write_all(&all)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub completed: u32,
    pub best_moves: Option<u32>,
    pub best_time_ms: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub games: BTreeMap<String, GameRecord>,
}

impl Progress {
    /// Counts a finished puzzle and keeps the lowest moves and time seen.
    pub fn record_completion(&mut self, game: &str, moves: u32, time_ms: u64) {
        let record = self.games.entry(game.to_string()).or_default();
        record.completed += 1;
        record.best_moves = Some(record.best_moves.map_or(moves, |best| best.min(moves)));
        record.best_time_ms = Some(record.best_time_ms.map_or(time_ms, |best| best.min(time_ms)));
    }

    pub fn record(&self, game: &str) -> Option<&GameRecord> {
        self.games.get(game)
    }
}

/// Missing or unreadable progress starts fresh.
pub fn load_progress(store: &impl KeyValueStore) -> Progress {
    let raw = match store.get(PROGRESS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Progress::default(),
        Err(err) => {
            warn!("failed to read progress: {}", err);
            return Progress::default();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|err| {
        warn!("discarding corrupt progress blob: {}", err);
        Progress::default()
    })
}

pub fn save_progress(store: &mut impl KeyValueStore, progress: &Progress) -> Result<(), StoreError> {
    store.set(PROGRESS_KEY, serde_json::to_string(progress)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_keeps_best_results() {
        let mut progress = Progress::default();
        progress.record_completion("maze", 40, 9_000);
        progress.record_completion("maze", 55, 7_500);
        let record = progress.record("maze").unwrap();
        assert_eq!(record.completed, 2);
        assert_eq!(record.best_moves, Some(40));
        assert_eq!(record.best_time_ms, Some(7_500));
        assert!(progress.record("words").is_none());
    }

    #[test]
    fn memory_store_persists_progress() {
        let mut store = MemoryStore::new();
        assert_eq!(load_progress(&store), Progress::default());
        let mut progress = Progress::default();
        progress.record_completion("words", 6, 30_000);
        save_progress(&mut store, &progress).unwrap();
        assert_eq!(load_progress(&store), progress);
    }

    #[test]
    fn corrupt_blob_loads_as_empty() {
        let mut store = MemoryStore::new();
        store.set(PROGRESS_KEY, "{not json".to_string()).unwrap();
        assert_eq!(load_progress(&store), Progress::default());
    }

    #[test]
    fn file_store_creates_file_on_first_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");
        let mut store = FileStore::new(&path);
        assert_eq!(store.get("a").unwrap(), None);
        store.set("a", "1".to_string()).unwrap();
        store.set("b", "2".to_string()).unwrap();
        assert!(path.exists());

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(reopened.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn corrupt_file_is_replaced_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{truncated").unwrap();
        let mut store = FileStore::new(&path);
        assert_eq!(load_progress(&store), Progress::default());

        let mut progress = Progress::default();
        progress.record_completion("maze", 12, 4_000);
        save_progress(&mut store, &progress).unwrap();
        assert_eq!(load_progress(&store), progress);
    }

    #[test]
    fn save_leaves_only_the_store_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let mut store = FileStore::new(&path);
        store.set("a", "1".to_string()).unwrap();
        store.set("a", "2".to_string()).unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("store.json")]);
        assert_eq!(store.get("a").unwrap().as_deref(), Some("2"));
    }
}
