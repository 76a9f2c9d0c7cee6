//! Native watch primitive
//!
//! Provides a small seam (PlatformWatcher trait) over the OS mechanism that
//! reports "something changed under this directory". The default
//! implementation uses `notify`'s recommended backend (inotify on Linux,
//! FSEvents on macOS, ReadDirectoryChangesW on Windows).

pub mod native;

use crate::classifier::Signal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;

pub use native::NotifyWatcher;

/// Opens recursive watches on directories
pub trait PlatformWatcher: Send + Sync {
    /// Start watching `dir` recursively, delivering notifications into `sink`
    ///
    /// The returned handle exclusively owns the native resource.
    fn watch(&self, dir: &Path, sink: NotificationSink) -> Result<Box<dyn NativeHandle>, notify::Error>;
}

/// Open native watch
pub trait NativeHandle: Send + Sync {
    /// Release the native resource; no notifications are delivered afterwards
    ///
    /// Must be idempotent.
    fn close(&self);
}

/// Delivery point for raw notifications of one watched root
///
/// Cheap to clone; safe to call from the native primitive's own thread.
#[derive(Debug, Clone)]
pub struct NotificationSink {
    root: PathBuf,
    tx: mpsc::UnboundedSender<Signal>,
}

impl NotificationSink {
    pub(crate) fn new(root: PathBuf, tx: mpsc::UnboundedSender<Signal>) -> Self {
        Self { root, tx }
    }

    /// Directory this sink belongs to
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Something changed at `name`, relative to the root
    ///
    /// Returns false once the root has been torn down.
    pub fn notify(&self, name: impl Into<PathBuf>) -> bool {
        self.tx.send(Signal::Changed(name.into())).is_ok()
    }

    /// Something changed at an absolute `path` under the root
    ///
    /// The root is canonical, so a path outside it cannot be matched to a
    /// snapshot record and is dropped.
    pub fn changed(&self, path: &Path) -> bool {
        match path.strip_prefix(&self.root) {
            Ok(name) => self.notify(name),
            Err(_) => {
                trace!(root = %self.root.display(), path = %path.display(), "notification outside root");
                !self.tx.is_closed()
            }
        }
    }

    /// The primitive failed after setup
    pub fn failed(&self, error: notify::Error) -> bool {
        self.tx.send(Signal::Failed(error)).is_ok()
    }
}

/// Create the default platform watcher
pub fn create_platform_watcher() -> Arc<dyn PlatformWatcher> {
    Arc::new(NotifyWatcher)
}
