//! Snapshot persistence for navigation state.
//!
//! A snapshot is the current state name, the visited-state sequence and the
//! history cursor, serialized as canonical JSON. Snapshots are written to a
//! [`SnapshotStore`], a plain get/set-by-key capability, so the engine does
//! not care whether the bytes end up in memory, on disk, or elsewhere.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub mod error;

pub use error::PersistenceError;

/// Serializable form of an engine's position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current state name
    pub current: String,

    /// Visited state names, oldest first
    pub history: Vec<String>,

    /// Index of the current entry in `history`
    pub cursor: usize,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        serde_json::to_string(self)
            .map_err(|e| PersistenceError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        serde_json::from_str(json)
            .map_err(|e| PersistenceError::DeserializationFailed(e.to_string()))
    }

    /// Every state name the snapshot refers to.
    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.current.as_str()).chain(self.history.iter().map(String::as_str))
    }
}

/// External key-value store holding serialized snapshots.
pub trait SnapshotStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    fn set(&self, key: &str, value: String) -> Result<(), PersistenceError>;
}

/// In-memory store. Clones share the same map, so a snapshot written by one
/// engine can be restored by another in the same process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl SnapshotStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), PersistenceError> {
        self.entries.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }
}

/// Durable store keeping one JSON file per key in a directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// One file per key. Bytes outside `[A-Za-z0-9.-]` are percent-escaped,
    /// so distinct keys never share a file.
    fn path_for(&self, key: &str) -> PathBuf {
        let mut file = String::with_capacity(key.len());
        for byte in key.bytes() {
            match byte {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'.' => file.push(byte as char),
                _ => file.push_str(&format!("%{byte:02X}")),
            }
        }
        self.dir.join(format!("{file}.json"))
    }
}

impl SnapshotStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: String) -> Result<(), PersistenceError> {
        let path = self.path_for(key);
        // Write to a temp file, then rename, so readers never see half a snapshot.
        let temp = path.with_extension("json.tmp");
        fs::write(&temp, value)?;
        fs::rename(&temp, &path)?;
        Ok(())
    }
}

/// Binds a store to the key an engine saves under.
pub struct Persistence {
    store: Box<dyn SnapshotStore>,
    key: String,
}

impl Persistence {
    pub fn new(store: impl SnapshotStore + 'static, key: impl Into<String>) -> Self {
        Self::boxed(Box::new(store), key)
    }

    pub fn boxed(store: Box<dyn SnapshotStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        self.store.set(&self.key, snapshot.to_json()?)
    }

    /// Load the stored snapshot, if one has been written.
    pub fn load(&self) -> Result<Option<Snapshot>, PersistenceError> {
        self.store
            .get(&self.key)?
            .map(|json| Snapshot::from_json(&json))
            .transpose()
    }
}
