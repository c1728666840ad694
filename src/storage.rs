//! Storage adapters for the single progress blob.
//!
//! The engine talks to storage through [`crate::ProgressStorage`]; these are
//! the two adapters shipped with the crate. Platform shells with their own
//! key-value store (e.g. a browser's localStorage) implement the trait
//! themselves.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::ProgressStorage;
use crate::state::ProgressState;

/// In-memory adapter holding the serialized blob, shared across clones.
/// Useful for tests and for embedding contexts with no durable store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blob: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored blob with raw text, bypassing serialization.
    /// Lets tests stage corrupt or hand-written documents.
    pub fn set_raw(&self, raw: &str) {
        *self.lock() = Some(raw.to_string());
    }

    /// The raw stored document, if any.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.blob.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ProgressStorage for MemoryStorage {
    type Error = serde_json::Error;

    fn save(&self, state: &ProgressState) -> Result<(), Self::Error> {
        let json = serde_json::to_string(state)?;
        *self.lock() = Some(json);
        Ok(())
    }

    fn load(&self) -> Result<Option<ProgressState>, Self::Error> {
        match self.lock().as_deref() {
            Some(json) => serde_json::from_str(json).map(Some),
            None => Ok(None),
        }
    }

    fn clear(&self) -> Result<(), Self::Error> {
        *self.lock() = None;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FileStorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("storage serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// File-backed adapter: one JSON document at a fixed path. Writes go through
/// a sibling temp file and a rename, so an interrupted save leaves the
/// previous blob intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressStorage for FileStorage {
    type Error = FileStorageError;

    fn save(&self, state: &ProgressState) -> Result<(), Self::Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(state)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<ProgressState>, Self::Error> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn clear(&self) -> Result<(), Self::Error> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
