//! Error types reported by the observer

use std::io;
use std::path::{Path, PathBuf};

/// Filesystem-level failure reported on the observer's error channel
///
/// None of these are fatal: the observer keeps watching every other root and
/// keeps classifying further notifications for the affected one.
#[derive(Debug, thiserror::Error)]
pub enum ObserveError {
    /// Metadata lookup failed for a reason other than non-existence
    #[error("failed to stat {}: {source}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Opening a native watch on a root failed
    #[error("failed to watch {}: {source}", path.display())]
    WatchSetup {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// Initial directory enumeration failed while seeding a root
    #[error("failed to list {}: {source}", path.display())]
    Listing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The native primitive reported a failure after setup
    #[error("watch error under {}: {source}", root.display())]
    Watch {
        root: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// `add` was called with no tokio runtime to register on
    #[error("cannot watch {} outside a tokio runtime: {source}", path.display())]
    Runtime {
        path: PathBuf,
        #[source]
        source: tokio::runtime::TryCurrentError,
    },

    /// An ignore glob could not be compiled
    #[error("invalid ignore pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: ignore::Error,
    },
}

impl ObserveError {
    /// Path the failure is about, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            ObserveError::Stat { path, .. }
            | ObserveError::WatchSetup { path, .. }
            | ObserveError::Listing { path, .. }
            | ObserveError::Runtime { path, .. } => Some(path),
            ObserveError::Watch { root, .. } => Some(root),
            ObserveError::Pattern { .. } => None,
        }
    }
}

/// Result type for observer operations
pub type Result<T> = std::result::Result<T, ObserveError>;
