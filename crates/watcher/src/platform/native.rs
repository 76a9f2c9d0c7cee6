//! `notify`-backed native watches

use super::{NativeHandle, NotificationSink, PlatformWatcher};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Platform watcher using `notify::recommended_watcher`
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyWatcher;

impl PlatformWatcher for NotifyWatcher {
    fn watch(&self, dir: &Path, sink: NotificationSink) -> Result<Box<dyn NativeHandle>, notify::Error> {
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => forward(&sink, event),
            Err(e) => {
                sink.failed(e);
            }
        })?;

        watcher.watch(dir, RecursiveMode::Recursive)?;

        Ok(Box::new(NotifyHandle {
            dir: dir.to_path_buf(),
            watcher: Mutex::new(Some(watcher)),
        }))
    }
}

/// Forward every path of a native event to the sink
///
/// Access events (open, read, close) never change size or existence, so
/// they are dropped here instead of costing a stat each.
fn forward(sink: &NotificationSink, event: Event) {
    if matches!(event.kind, EventKind::Access(_)) {
        return;
    }

    for path in &event.paths {
        trace!(path = %path.display(), kind = ?event.kind, "native notification");
        sink.changed(path);
    }
}

/// Open `notify` watch; dropping the inner watcher stops its event thread
struct NotifyHandle {
    dir: PathBuf,
    watcher: Mutex<Option<RecommendedWatcher>>,
}

impl NativeHandle for NotifyHandle {
    fn close(&self) {
        if let Some(mut watcher) = self.watcher.lock().take() {
            let _ = watcher.unwatch(&self.dir);
        }
    }
}

impl Drop for NotifyHandle {
    fn drop(&mut self) {
        self.close();
    }
}
