use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::habit::Habit;

pub const STORAGE_KEY: &str = "streakly-habits";

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("stored habits could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("unsupported stored schema version {0}")]
    UnsupportedVersion(u32),
}

/// Opaque key-value persistence. Implementations must be fast enough to call on every mutation.
pub trait HabitStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, blob: &str) -> Result<(), StorageError>;
}

impl<S: HabitStorage + ?Sized> HabitStorage for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        (**self).set(key, blob)
    }
}

/// One JSON file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl HabitStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let staging = self.root.join(format!(".{key}.json.tmp"));
        let io_err = |at: &Path| {
            let path = at.to_path_buf();
            move |source| StorageError::Io { path, source }
        };
        fs::create_dir_all(&self.root).map_err(io_err(&self.root))?;
        fs::write(&staging, blob).map_err(io_err(&staging))?;
        fs::rename(&staging, &path).map_err(io_err(&staging))?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, blob: impl Into<String>) -> Self {
        let storage = Self::default();
        storage.entries.write().insert(key.to_string(), blob.into());
        storage
    }
}

impl HabitStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        self.entries.write().insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct StoredHabitsRef<'a> {
    version: u32,
    habits: &'a [Habit],
}

#[derive(Debug, Deserialize)]
struct StoredHabits {
    version: u32,
    habits: Vec<Habit>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredBlob {
    Versioned(StoredHabits),
    // Pre-versioning format: a bare array in display order.
    Legacy(Vec<Habit>),
}

pub fn encode_habits(habits: &[Habit]) -> Result<String, StorageError> {
    Ok(serde_json::to_string(&StoredHabitsRef {
        version: SCHEMA_VERSION,
        habits,
    })?)
}

pub fn decode_habits(blob: &str) -> Result<Vec<Habit>, StorageError> {
    match serde_json::from_str::<StoredBlob>(blob)? {
        StoredBlob::Versioned(stored) if stored.version == SCHEMA_VERSION => Ok(stored.habits),
        StoredBlob::Versioned(stored) => Err(StorageError::UnsupportedVersion(stored.version)),
        StoredBlob::Legacy(habits) => {
            tracing::info!(count = habits.len(), "upgrading unversioned habit blob");
            Ok(habits)
        }
    }
}
