//! # File Store
//!
//! In-memory map from filename to [`File`], optionally backed by a snapshot
//! file that is rewritten in full on every [`Store::save`].
//!
//! The store does no locking. The server owns the only instance and serves one
//! connection at a time.

pub mod snapshot;
pub mod table;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{ProtocolError, Result};
use crate::protocol::message::File;
use table::FileTable;

#[derive(Debug, Default)]
pub struct Store {
    files: FileTable<File>,
    path: Option<PathBuf>,
}

impl Store {
    /// An empty store with no snapshot file.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the snapshot at `path`, or start empty if it does not exist.
    /// Later saves go to the same path.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut store = Self {
            files: FileTable::new(),
            path: None,
        };
        if let Some(files) = snapshot::load(&path)? {
            for file in files {
                store.insert(file.filename.clone(), file);
            }
        }
        info!(path = %path.display(), files = store.len(), "Store opened");
        store.path = Some(path);
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Last write wins. Returns `true` when an existing file was replaced.
    pub fn insert(&mut self, filename: impl Into<String>, file: File) -> bool {
        self.files.insert(filename.into(), file)
    }

    /// Exact-match lookup.
    pub fn lookup(&self, filename: &str) -> Result<&File> {
        self.files
            .get(filename)
            .ok_or_else(|| ProtocolError::NotFound(filename.to_string()))
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.files.contains(filename)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.files.keys()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Rewrite the snapshot. A no-op for an in-memory store.
    pub fn save(&self) -> Result<()> {
        match &self.path {
            Some(path) => self.save_to(path),
            None => Ok(()),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let entries: Vec<&File> = self.files.iter().map(|(_, file)| file).collect();
        snapshot::save(path, entries.into_iter())
    }
}
