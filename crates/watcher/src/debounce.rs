//! Per-path debouncing of in-place modifications
//!
//! A tracked file that changes enters a pending window. Every recheck compares
//! the file's size against the previous recheck; the window settles once the
//! size has held still for the quiescence threshold. Fresh notifications while
//! pending only refresh the activity timestamp, so a burst of writes yields a
//! single settle.
//!
//! This is a pure state table: callers pass the current instant and own the
//! I/O. Each entry holds the abort handle of its one outstanding recheck timer.

use fsobserve_core::FileMetadata;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::Instant;

/// In-progress settle window for one path
#[derive(Debug)]
pub struct PendingDebounce {
    /// Snapshot record from before the burst began
    baseline: FileMetadata,

    /// Size seen at the most recent check
    last_size: u64,

    /// Last time a size change or notification was observed
    last_activity: Instant,

    /// Outstanding recheck timer
    timer: Option<AbortHandle>,
}

/// Outcome of a recheck
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recheck {
    /// Size held for the quiescence window; the path is idle again
    Settled { baseline: FileMetadata },

    /// Still changing or not quiet long enough; schedule another recheck
    Unsettled,

    /// No pending window for this path (cancelled or already settled)
    Idle,
}

/// Debounce state machine for all paths under one root
#[derive(Debug)]
pub struct Debouncer {
    quiescence: Duration,
    pending: HashMap<PathBuf, PendingDebounce>,
}

impl Debouncer {
    pub fn new(quiescence: Duration) -> Self {
        Self {
            quiescence,
            pending: HashMap::new(),
        }
    }

    pub fn is_pending(&self, path: &Path) -> bool {
        self.pending.contains_key(path)
    }

    /// Register a modification notification for a tracked path
    ///
    /// Returns true when this opened a new pending window, in which case the
    /// caller must schedule the first recheck. An already pending path only
    /// has its quiescence countdown restarted.
    pub fn touch(
        &mut self,
        path: &Path,
        baseline: &FileMetadata,
        current: &FileMetadata,
        now: Instant,
    ) -> bool {
        if let Some(entry) = self.pending.get_mut(path) {
            entry.last_activity = now;
            return false;
        }

        self.pending.insert(
            path.to_path_buf(),
            PendingDebounce {
                baseline: baseline.clone(),
                last_size: current.size,
                last_activity: now,
                timer: None,
            },
        );
        true
    }

    /// Attach the recheck timer for a pending path
    ///
    /// Any timer already attached is aborted, keeping at most one per path.
    /// A timer for a path that is not pending is aborted immediately.
    pub fn arm(&mut self, path: &Path, timer: AbortHandle) {
        match self.pending.get_mut(path) {
            Some(entry) => {
                if let Some(previous) = entry.timer.replace(timer) {
                    previous.abort();
                }
            }
            None => timer.abort(),
        }
    }

    /// Evaluate a recheck for `path` given its freshly fetched metadata
    pub fn recheck(&mut self, path: &Path, current: &FileMetadata, now: Instant) -> Recheck {
        let Some(entry) = self.pending.get_mut(path) else {
            return Recheck::Idle;
        };

        // The timer that triggered this recheck has fired.
        entry.timer = None;

        if current.size != entry.last_size {
            entry.last_size = current.size;
            entry.last_activity = now;
        }

        if now.duration_since(entry.last_activity) < self.quiescence {
            return Recheck::Unsettled;
        }

        match self.pending.remove(path) {
            Some(entry) => Recheck::Settled {
                baseline: entry.baseline,
            },
            None => Recheck::Idle,
        }
    }

    /// Drop the pending window for `path`, returning its baseline
    pub fn cancel(&mut self, path: &Path) -> Option<FileMetadata> {
        let entry = self.pending.remove(path)?;
        if let Some(timer) = entry.timer {
            timer.abort();
        }
        Some(entry.baseline)
    }

    /// Cancel every pending window
    pub fn clear(&mut self) {
        for (_, entry) in self.pending.drain() {
            if let Some(timer) = entry.timer {
                timer.abort();
            }
        }
    }

    /// Number of paths currently pending
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of pending paths with an outstanding recheck timer
    pub fn armed_count(&self) -> usize {
        self.pending.values().filter(|e| e.timer.is_some()).count()
    }

    pub fn quiescence(&self) -> Duration {
        self.quiescence
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.clear();
    }
}
