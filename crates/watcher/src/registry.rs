//! Native watch registry
//!
//! Holds exactly one native recursive watch per distinct root directory.
//! Registering a file watches its containing directory; registering a
//! directory that is already watched is a no-op.

use crate::classifier::{Classifier, Shared};
use crate::error::{ObserveError, Result};
use crate::platform::{NativeHandle, NotificationSink, PlatformWatcher};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// A directory under native observation
///
/// Owns the native handle and the root's classifier task; dropping it
/// closes both.
pub struct WatchedRoot {
    path: PathBuf,
    handle: Box<dyn NativeHandle>,
    task: JoinHandle<()>,
}

impl WatchedRoot {
    /// Whether the classifier task is still running
    pub fn is_open(&self) -> bool {
        !self.task.is_finished()
    }

    fn close(&self) {
        self.handle.close();
        self.task.abort();
    }
}

impl Drop for WatchedRoot {
    fn drop(&mut self) {
        self.close();
        info!(root = %self.path.display(), "stopped watching");
    }
}

/// Registry of watched roots for one observer
pub struct WatchRegistry {
    roots: DashMap<PathBuf, WatchedRoot>,
    platform: Arc<dyn PlatformWatcher>,
    shared: Arc<Shared>,
}

impl WatchRegistry {
    pub(crate) fn new(platform: Arc<dyn PlatformWatcher>, shared: Arc<Shared>) -> Self {
        Self {
            roots: DashMap::new(),
            platform,
            shared,
        }
    }

    /// Watch the directory for `path`, returning that directory
    ///
    /// Idempotent per directory. A new root starts its classifier task,
    /// which seeds the snapshot before classifying anything.
    pub async fn register_root(&self, path: &Path) -> Result<PathBuf> {
        let dir = self.resolve_root(path).await?;

        match self.roots.entry(dir.clone()) {
            Entry::Occupied(_) => {
                debug!(root = %dir.display(), "already watching");
                Ok(dir)
            }
            Entry::Vacant(slot) => {
                // Torn down while the stat was in flight
                if self.shared.emitter.is_closed() {
                    return Ok(dir);
                }

                let (tx, rx) = mpsc::unbounded_channel();
                let sink = NotificationSink::new(dir.clone(), tx.clone());
                let handle = self
                    .platform
                    .watch(&dir, sink)
                    .map_err(|source| ObserveError::WatchSetup {
                        path: dir.clone(),
                        source,
                    })?;

                let classifier = Classifier::new(dir.clone(), Arc::clone(&self.shared), tx);
                let task = tokio::spawn(classifier.run(rx));

                info!(root = %dir.display(), "watching");
                slot.insert(WatchedRoot {
                    path: dir.clone(),
                    handle,
                    task,
                });
                Ok(dir)
            }
        }
    }

    /// Directory to watch for `path`: itself if a directory, else its parent
    ///
    /// Roots are canonical so they match the paths native backends report
    /// (FSEvents resolves symlinks such as `/tmp` -> `/private/tmp`).
    async fn resolve_root(&self, path: &Path) -> Result<PathBuf> {
        let canonical = self
            .shared
            .source
            .canonicalize(path)
            .await
            .map_err(|source| ObserveError::Stat {
                path: path.to_path_buf(),
                source,
            })?;

        let looked_up = self.shared.source.stat(&canonical).await;
        match looked_up {
            Ok(Some(metadata)) if metadata.is_dir => Ok(canonical),
            Ok(Some(_)) => Ok(canonical
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or(canonical)),
            Ok(None) => Err(ObserveError::Stat {
                path: canonical,
                source: io::Error::new(io::ErrorKind::NotFound, "path does not exist"),
            }),
            Err(source) => Err(ObserveError::Stat {
                path: canonical,
                source,
            }),
        }
    }

    /// Stop watching one root directory
    ///
    /// Returns false if `dir` was not a watched root.
    pub async fn remove_root(&self, dir: &Path) -> bool {
        let key = match self.shared.source.canonicalize(dir).await {
            Ok(canonical) => canonical,
            // Already gone from disk; fall back to the spelling given
            Err(_) => match std::path::absolute(dir) {
                Ok(absolute) => absolute,
                Err(_) => return false,
            },
        };
        self.roots.remove(&key).is_some()
    }

    /// Close every native handle and classifier task
    pub fn close_all(&self) {
        self.roots.clear();
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.roots.contains_key(dir)
    }

    /// Whether the classifier task of root `dir` is still running
    pub fn is_open(&self, dir: &Path) -> bool {
        self.roots.get(dir).map_or(false, |root| root.is_open())
    }

    /// Currently watched root directories
    pub fn roots(&self) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = self.roots.iter().map(|r| r.key().clone()).collect();
        roots.sort();
        roots
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Report a failure on the observer's error channel
    pub(crate) fn report(&self, error: ObserveError) {
        self.shared.emitter.fail(error);
    }
}
