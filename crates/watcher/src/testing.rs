//! In-memory fakes for the metadata and native watch seams

use crate::platform::{NativeHandle, NotificationSink, PlatformWatcher};
use async_trait::async_trait;
use fsobserve_core::{FileMetadata, MetadataSource};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Let spawned tasks run until they block
pub(crate) async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Metadata source over an in-memory path table
#[derive(Default)]
pub(crate) struct MemoryFs {
    entries: Mutex<HashMap<PathBuf, FileMetadata>>,
    stat_failures: Mutex<HashSet<PathBuf>>,
    list_failures: Mutex<HashSet<PathBuf>>,
    links: Mutex<HashMap<PathBuf, PathBuf>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dir(&self, path: &str) {
        self.entries
            .lock()
            .insert(PathBuf::from(path), FileMetadata::directory());
    }

    pub fn write(&self, path: &str, size: u64) {
        self.entries
            .lock()
            .insert(PathBuf::from(path), FileMetadata::with_size(size));
    }

    pub fn remove(&self, path: &str) {
        self.entries.lock().remove(Path::new(path));
    }

    pub fn fail_stat(&self, path: &str) {
        self.stat_failures.lock().insert(PathBuf::from(path));
    }

    pub fn allow_stat(&self, path: &str) {
        self.stat_failures.lock().remove(Path::new(path));
    }

    pub fn fail_list(&self, path: &str) {
        self.list_failures.lock().insert(PathBuf::from(path));
    }

    /// Make `link` a symlink to the directory `target`
    pub fn link(&self, link: &str, target: &str) {
        self.links
            .lock()
            .insert(PathBuf::from(link), PathBuf::from(target));
    }
}

#[async_trait]
impl MetadataSource for MemoryFs {
    async fn stat(&self, path: &Path) -> io::Result<Option<FileMetadata>> {
        if self.stat_failures.lock().contains(path) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"));
        }
        Ok(self.entries.lock().get(path).cloned())
    }

    async fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        if self.list_failures.lock().contains(dir) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"));
        }
        let mut children: Vec<PathBuf> = self
            .entries
            .lock()
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .cloned()
            .collect();
        children.sort();
        Ok(children)
    }

    async fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        let resolved = self
            .links
            .lock()
            .iter()
            .find_map(|(link, target)| path.strip_prefix(link).ok().map(|rest| target.join(rest)))
            .map(|joined| {
                // `join("")` leaves a trailing separator
                joined.components().collect::<PathBuf>()
            })
            .unwrap_or_else(|| path.to_path_buf());

        if self.entries.lock().contains_key(&resolved) {
            Ok(resolved)
        } else {
            Err(io::Error::new(io::ErrorKind::NotFound, "no such file or directory"))
        }
    }
}

/// Platform watcher that records sinks instead of touching the OS
#[derive(Default)]
pub(crate) struct FakePlatform {
    sinks: Mutex<HashMap<PathBuf, NotificationSink>>,
    refused: Mutex<HashSet<PathBuf>>,
    opened: AtomicUsize,
    closed: Arc<AtomicUsize>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make opening a watch on `dir` fail
    pub fn refuse(&self, dir: &str) {
        self.refused.lock().insert(PathBuf::from(dir));
    }

    /// Deliver a raw notification for `name` under the watched `dir`
    pub fn notify(&self, dir: &str, name: &str) -> bool {
        let sinks = self.sinks.lock();
        match sinks.get(Path::new(dir)) {
            Some(sink) => sink.notify(name),
            None => false,
        }
    }

    pub fn fail(&self, dir: &str, message: &str) -> bool {
        let sinks = self.sinks.lock();
        match sinks.get(Path::new(dir)) {
            Some(sink) => sink.failed(notify::Error::generic(message)),
            None => false,
        }
    }

    /// Native handles opened so far
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Native handles closed so far
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl PlatformWatcher for FakePlatform {
    fn watch(&self, dir: &Path, sink: NotificationSink) -> Result<Box<dyn NativeHandle>, notify::Error> {
        if self.refused.lock().contains(dir) {
            return Err(notify::Error::generic("watch refused"));
        }

        self.opened.fetch_add(1, Ordering::SeqCst);
        self.sinks.lock().insert(dir.to_path_buf(), sink);

        Ok(Box::new(FakeHandle {
            closed: Arc::clone(&self.closed),
            done: AtomicBool::new(false),
        }))
    }
}

struct FakeHandle {
    closed: Arc<AtomicUsize>,
    done: AtomicBool,
}

impl NativeHandle for FakeHandle {
    fn close(&self) {
        if !self.done.swap(true, Ordering::SeqCst) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}
