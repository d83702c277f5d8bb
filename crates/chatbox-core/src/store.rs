//! Local key-value persistence
//!
//! The transcript lives under a single key, [`HISTORY_KEY`], as a versioned
//! JSON document holding the structured messages. Loading re-renders them, so
//! the storage format never depends on the display markup.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::message::Message;
use crate::transcript::Transcript;

pub const HISTORY_KEY: &str = "chatHistory";
const HISTORY_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stored data is not valid: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("could not determine a data directory")]
    NoDataDir,

    #[error("unsupported history version {0}")]
    UnsupportedVersion(u32),
}

/// String-keyed, string-valued storage, in the shape of browser local storage.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set_item(key, value)
    }
}

#[derive(Serialize, Deserialize)]
struct HistoryDocument {
    version: u32,
    messages: Vec<Message>,
}

/// Overwrite the stored history with a full snapshot of `transcript`.
pub fn save_transcript<S: KeyValueStore + ?Sized>(
    store: &mut S,
    transcript: &Transcript,
) -> Result<(), StoreError> {
    let doc = HistoryDocument {
        version: HISTORY_VERSION,
        messages: transcript.messages().to_vec(),
    };
    let value = serde_json::to_string(&doc)?;
    store.set_item(HISTORY_KEY, &value)
}

/// Read the stored history, if any.
pub fn load_transcript<S: KeyValueStore + ?Sized>(store: &S) -> Result<Option<Transcript>, StoreError> {
    let Some(value) = store.get_item(HISTORY_KEY)? else {
        return Ok(None);
    };

    let doc: HistoryDocument = serde_json::from_str(&value)?;
    if doc.version != HISTORY_VERSION {
        return Err(StoreError::UnsupportedVersion(doc.version));
    }
    Ok(Some(Transcript::from_messages(doc.messages)))
}

/// A JSON object on disk; every key is one member.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_dir>/chatbox/storage.json`
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let data_dir = dirs::data_dir().ok_or(StoreError::NoDataDir)?;
        Ok(data_dir.join("chatbox").join("storage.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        // Write beside the target and rename so a crash never leaves half a file.
        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(items)?;
        fs::write(&tmp, content).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut items = self.read_all()?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items)?;
        tracing::debug!(path = %self.path.display(), key, bytes = value.len(), "stored item");
        Ok(())
    }
}

/// In-process store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        Ok(items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use tempfile::tempdir;

    fn sample() -> Transcript {
        let mut transcript = Transcript::new();
        transcript.push(Message::user("hi &amp; bye", Local::now()));
        transcript.push(Message::bot("<strong>hello</strong>"));
        transcript
    }

    #[test]
    fn test_missing_history_loads_as_none() {
        let store = MemoryStore::new();
        assert!(load_transcript(&store).unwrap().is_none());
    }

    #[test]
    fn test_memory_round_trip_preserves_markup() {
        let mut store = MemoryStore::new();
        let transcript = sample();
        save_transcript(&mut store, &transcript).unwrap();

        let loaded = load_transcript(&store).unwrap().unwrap();
        assert_eq!(loaded.render(), transcript.render());
    }

    #[test]
    fn test_memory_clones_share_items() {
        let mut a = MemoryStore::new();
        let b = a.clone();
        a.set_item("k", "v").unwrap();
        assert_eq!(b.get_item("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_file_round_trip_and_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");
        let mut store = FileStore::new(&path);

        save_transcript(&mut store, &Transcript::new()).unwrap();
        let transcript = sample();
        save_transcript(&mut store, &transcript).unwrap();

        let reopened = FileStore::new(&path);
        let loaded = load_transcript(&reopened).unwrap().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.render(), transcript.render());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_keeps_other_keys() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("storage.json"));
        store.set_item("other", "1").unwrap();
        save_transcript(&mut store, &sample()).unwrap();
        assert_eq!(store.get_item("other").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_corrupt_history_is_an_error() {
        let mut store = MemoryStore::new();
        store.set_item(HISTORY_KEY, "<div class=\"message bot\">legacy</div>").unwrap();
        assert!(matches!(load_transcript(&store), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let mut store = MemoryStore::new();
        store.set_item(HISTORY_KEY, r#"{"version":9,"messages":[]}"#).unwrap();
        assert!(matches!(load_transcript(&store), Err(StoreError::UnsupportedVersion(9))));
    }
}
