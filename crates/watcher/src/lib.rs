//! Filesystem change observation for fsobserve
//!
//! This crate turns raw, noisy directory notifications into a stream of
//! classified `add` / `update` / `delete` events:
//! - One native recursive watch per distinct root directory
//! - Snapshot of last-known metadata per path, seeded on registration
//! - Per-path debouncing: one `update` per burst of writes, emitted once the
//!   file's size has held still for the quiescence window (100ms default)
//! - Configurable ignore policy (dotfiles and `~` backups by default)
//!
//! ```no_run
//! # async fn run() {
//! let mut observer = fsobserve_watcher::observe(["/tmp/inbox"]);
//! while let Some(event) = observer.next_event().await {
//!     println!("{} {}", event.kind(), event.name().display());
//! }
//! # }
//! ```

pub mod config;
pub mod debounce;
pub mod emitter;
pub mod error;
pub mod ignore;
pub mod metrics;
pub mod observer;
pub mod platform;
pub mod registry;
pub mod snapshot;

mod classifier;

#[cfg(test)]
mod testing;

// Re-exports
pub use config::ObserverConfig;
pub use emitter::{ErrorStream, EventStream};
pub use error::{ObserveError, Result};
pub use ignore::{IgnoreConfig, IgnorePolicy};
pub use metrics::ObserverMetricsSnapshot;
pub use observer::{observe, Observer};
pub use platform::{NativeHandle, NotificationSink, NotifyWatcher, PlatformWatcher};

pub use fsobserve_core::{ChangeEvent, ChangeKind, FileMetadata, FsMetadata, MetadataSource};
