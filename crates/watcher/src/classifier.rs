//! Change classification for one watched root
//!
//! Each root runs a single classifier task. The task first seeds the root's
//! snapshot from a directory listing, then handles raw notifications and
//! debounce rechecks strictly one at a time, so the snapshot always reflects
//! the most recently completed classification for every path.
//!
//! Classification compares the current metadata with the snapshot record:
//!
//! | record | exists | outcome                       |
//! |--------|--------|-------------------------------|
//! | no     | yes    | `add`                         |
//! | yes    | yes    | debounce, later `update`      |
//! | yes    | no     | `delete` with the last record |
//! | no     | no     | nothing                       |

use crate::debounce::{Debouncer, Recheck};
use crate::emitter::Emitter;
use crate::error::ObserveError;
use crate::ignore::IgnorePolicy;
use crate::metrics::ObserverMetrics;
use crate::snapshot::SnapshotStore;
use fsobserve_core::{ChangeEvent, MetadataSource};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Input to a root's classifier task
#[derive(Debug)]
pub(crate) enum Signal {
    /// Raw notification: something changed at this root-relative name
    Changed(PathBuf),

    /// Debounce timer fired for this absolute path
    Recheck(PathBuf),

    /// Native primitive failure
    Failed(notify::Error),
}

/// Collaborators shared by every root of one observer
pub(crate) struct Shared {
    pub source: Arc<dyn MetadataSource>,
    pub ignore: IgnorePolicy,
    pub emitter: Emitter,
    pub metrics: Arc<ObserverMetrics>,
    pub quiescence: Duration,
    pub poll_interval: Duration,
}

/// Classifier state for one watched root
pub(crate) struct Classifier {
    root: PathBuf,
    shared: Arc<Shared>,
    snapshot: SnapshotStore,
    debounce: Debouncer,
    /// Loops rechecks back into this task's own inbox
    signals: mpsc::UnboundedSender<Signal>,
}

impl Classifier {
    pub fn new(root: PathBuf, shared: Arc<Shared>, signals: mpsc::UnboundedSender<Signal>) -> Self {
        let debounce = Debouncer::new(shared.quiescence);
        Self {
            root,
            shared,
            snapshot: SnapshotStore::new(),
            debounce,
            signals,
        }
    }

    /// Seed the snapshot, then classify signals until the task is aborted
    pub async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Signal>) {
        self.seed().await;

        while let Some(signal) = inbox.recv().await {
            if self.shared.emitter.is_closed() {
                break;
            }

            match signal {
                Signal::Changed(name) => self.on_notification(&name).await,
                Signal::Recheck(path) => self.on_recheck(&path).await,
                Signal::Failed(source) => self.shared.emitter.fail(ObserveError::Watch {
                    root: self.root.clone(),
                    source,
                }),
            }
        }

        trace!(root = %self.root.display(), "classifier stopped");
    }

    /// Populate the snapshot from the root's direct entries
    ///
    /// Entries that vanish between listing and stat are skipped; entries
    /// created in that gap will classify as adds later.
    async fn seed(&mut self) {
        let entries = match self.shared.source.list(&self.root).await {
            Ok(entries) => entries,
            Err(source) => {
                self.shared.emitter.fail(ObserveError::Listing {
                    path: self.root.clone(),
                    source,
                });
                return;
            }
        };

        for path in entries {
            let name = path.strip_prefix(&self.root).unwrap_or(&path);
            if self.shared.ignore.should_ignore(name) {
                continue;
            }

            let looked_up = self.shared.source.stat(&path).await;
            match looked_up {
                Ok(Some(metadata)) => {
                    self.snapshot.insert(path, metadata);
                }
                Ok(None) => {}
                Err(source) => self.shared.emitter.fail(ObserveError::Stat { path, source }),
            }
        }

        debug!(root = %self.root.display(), records = self.snapshot.len(), "seeded snapshot");
    }

    async fn on_notification(&mut self, name: &Path) {
        self.shared.metrics.record_notification();

        // The root itself
        if name.as_os_str().is_empty() {
            return;
        }

        if self.shared.ignore.should_ignore(name) {
            self.shared.metrics.record_ignored();
            trace!(name = %name.display(), "ignored");
            return;
        }

        let filename = self.root.join(name);
        let looked_up = self.shared.source.stat(&filename).await;
        let current = match looked_up {
            Ok(current) => current,
            Err(source) => {
                self.shared.emitter.fail(ObserveError::Stat {
                    path: filename,
                    source,
                });
                return;
            }
        };

        match (self.snapshot.get(&filename).cloned(), current) {
            (None, Some(current)) => {
                debug!(path = %filename.display(), "add");
                self.snapshot.insert(filename.clone(), current.clone());
                self.emit(ChangeEvent::add(filename, current));
            }
            (Some(previous), Some(current)) => {
                if self.debounce.touch(&filename, &previous, &current, Instant::now()) {
                    trace!(path = %filename.display(), "debounce started");
                    self.schedule_recheck(filename);
                }
            }
            (Some(previous), None) => {
                self.debounce.cancel(&filename);
                self.snapshot.remove(&filename);
                debug!(path = %filename.display(), "delete");
                self.emit(ChangeEvent::delete(filename, previous));
            }
            (None, None) => {
                trace!(path = %filename.display(), "spurious notification");
            }
        }
    }

    async fn on_recheck(&mut self, path: &Path) {
        if !self.debounce.is_pending(path) {
            return;
        }

        let current = match self.shared.source.stat(path).await {
            Ok(current) => current,
            Err(source) => {
                self.debounce.cancel(path);
                self.shared.emitter.fail(ObserveError::Stat {
                    path: path.to_path_buf(),
                    source,
                });
                return;
            }
        };

        let Some(current) = current else {
            // Deleted mid-burst; the raw delete notification will find no record.
            self.debounce.cancel(path);
            if let Some(previous) = self.snapshot.remove(path) {
                debug!(path = %path.display(), "delete");
                self.emit(ChangeEvent::delete(path.to_path_buf(), previous));
            }
            return;
        };

        match self.debounce.recheck(path, &current, Instant::now()) {
            Recheck::Settled { baseline } => {
                debug!(path = %path.display(), old = baseline.size, new = current.size, "update");
                self.snapshot.insert(path.to_path_buf(), current.clone());
                self.emit(ChangeEvent::update(path.to_path_buf(), current, baseline));
            }
            Recheck::Unsettled => self.schedule_recheck(path.to_path_buf()),
            Recheck::Idle => {}
        }
    }

    fn schedule_recheck(&mut self, path: PathBuf) {
        let signals = self.signals.clone();
        let delay = self.shared.poll_interval;
        let target = path.clone();

        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = signals.send(Signal::Recheck(target));
        });

        self.debounce.arm(&path, timer.abort_handle());
    }

    fn emit(&self, event: ChangeEvent) {
        if !self.shared.emitter.push(event) && !self.shared.emitter.is_closed() {
            debug!(backlog = self.shared.emitter.backlog(), "event backlog above high-water mark");
        }
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> &SnapshotStore {
        &self.snapshot
    }

    #[cfg(test)]
    pub fn record(&self, path: &Path) -> Option<&fsobserve_core::FileMetadata> {
        self.snapshot.get(path)
    }
}
