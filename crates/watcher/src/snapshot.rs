//! Per-root metadata snapshot store

use fsobserve_core::FileMetadata;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Last-known metadata per absolute path under one watched root
///
/// A missing record means "not yet seen" and classifies like a
/// non-existent file. Only the root's classifier task mutates it.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    records: HashMap<PathBuf, FileMetadata>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<&FileMetadata> {
        self.records.get(path)
    }

    /// Record metadata for `path`, returning the record it replaced
    pub fn insert(&mut self, path: PathBuf, metadata: FileMetadata) -> Option<FileMetadata> {
        self.records.insert(path, metadata)
    }

    pub fn remove(&mut self, path: &Path) -> Option<FileMetadata> {
        self.records.remove(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.records.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
