//! File metadata records and the metadata lookup seam

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Last-observed metadata for one path
///
/// Only the attributes the classifier compares are kept: size drives the
/// debounce settle check, the rest is carried through to consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Size in bytes
    pub size: u64,

    /// Modification time, when the platform reports one
    #[serde(rename = "mtimeMs", with = "mtime_ms", default)]
    pub modified: Option<SystemTime>,

    /// Whether the path is a directory
    #[serde(rename = "isDirectory", default)]
    pub is_dir: bool,
}

impl FileMetadata {
    /// Metadata for a regular file of the given size with no mtime
    pub fn with_size(size: u64) -> Self {
        Self {
            size,
            modified: None,
            is_dir: false,
        }
    }

    /// Metadata for a directory
    pub fn directory() -> Self {
        Self {
            size: 0,
            modified: None,
            is_dir: true,
        }
    }
}

impl From<&std::fs::Metadata> for FileMetadata {
    fn from(meta: &std::fs::Metadata) -> Self {
        Self {
            size: meta.len(),
            modified: meta.modified().ok(),
            is_dir: meta.is_dir(),
        }
    }
}

/// Source of file metadata and directory listings
///
/// Every lookup is asynchronous and may race with concurrent deletion.
/// A path that does not exist is `Ok(None)`, never an error.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch current metadata for `path`
    async fn stat(&self, path: &Path) -> io::Result<Option<FileMetadata>>;

    /// List the direct entries of `dir` as absolute paths
    async fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Resolve `path` to its canonical absolute form, following symlinks
    ///
    /// Unlike `stat`, a missing path is a `NotFound` error.
    async fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}

/// Metadata source backed by the real filesystem via `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMetadata;

#[async_trait]
impl MetadataSource for FsMetadata {
    async fn stat(&self, path: &Path) -> io::Result<Option<FileMetadata>> {
        match tokio::fs::metadata(path).await {
            Ok(meta) => Ok(Some(FileMetadata::from(&meta))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut paths = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            paths.push(entry.path());
        }

        Ok(paths)
    }

    async fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        tokio::fs::canonicalize(path).await
    }
}

/// Serializes `Option<SystemTime>` as milliseconds since the Unix epoch
mod mtime_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S: Serializer>(value: &Option<SystemTime>, s: S) -> Result<S::Ok, S::Error> {
        match (*value).and_then(|t| t.duration_since(UNIX_EPOCH).ok()) {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<SystemTime>, D::Error> {
        let ms = Option::<u64>::deserialize(d)?;
        Ok(ms.map(|ms| UNIX_EPOCH + Duration::from_millis(ms)))
    }
}
