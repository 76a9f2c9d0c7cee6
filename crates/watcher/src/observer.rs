//! Observer facade
//!
//! Ties the registry, classifier tasks and emitter together:
//! Native Watch → Classifier (per root) → Debouncer → Emitter → consumer

use crate::classifier::Shared;
use crate::config::ObserverConfig;
use crate::emitter::{self, ErrorStream, EventStream};
use crate::error::{ObserveError, Result};
use crate::ignore::IgnorePolicy;
use crate::metrics::{ObserverMetrics, ObserverMetricsSnapshot};
use crate::platform::{self, PlatformWatcher};
use crate::registry::WatchRegistry;
use fsobserve_core::{ChangeEvent, FsMetadata, MetadataSource};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::info;

/// Watches a set of roots and yields classified change events
///
/// Registration runs on the current tokio runtime. Called outside one,
/// `add` reports [`ObserveError::Runtime`] instead of watching.
pub struct Observer {
    registry: Arc<WatchRegistry>,
    shared: Arc<Shared>,
    events: EventStream,
    errors: ErrorStream,
    config: ObserverConfig,
}

impl Observer {
    /// Create an observer on the real filesystem
    ///
    /// Fails only if an ignore pattern in `config` does not compile.
    pub fn new(config: ObserverConfig) -> Result<Self> {
        let ignore = IgnorePolicy::load(config.ignore.clone())?;
        Ok(Self::with_parts(
            config,
            ignore,
            Arc::new(FsMetadata),
            platform::create_platform_watcher(),
        ))
    }

    /// Create an observer from explicit collaborators
    pub fn with_parts(
        config: ObserverConfig,
        ignore: IgnorePolicy,
        source: Arc<dyn MetadataSource>,
        platform: Arc<dyn PlatformWatcher>,
    ) -> Self {
        let metrics = Arc::new(ObserverMetrics::new());
        let (emitter, events, errors) = emitter::channel(config.high_water_mark, Arc::clone(&metrics));

        let shared = Arc::new(Shared {
            source,
            ignore,
            emitter,
            metrics,
            quiescence: config.quiescence,
            poll_interval: config.poll_interval,
        });

        Self {
            registry: Arc::new(WatchRegistry::new(platform, Arc::clone(&shared))),
            shared,
            events,
            errors,
            config,
        }
    }

    /// Start watching `path` in the background
    ///
    /// Never fails synchronously: setup failures arrive on the error channel.
    pub fn add(&self, path: impl AsRef<Path>) {
        let registry = Arc::clone(&self.registry);
        let path = path.as_ref().to_path_buf();

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(source) => {
                registry.report(ObserveError::Runtime { path, source });
                return;
            }
        };

        runtime.spawn(async move {
            if let Err(error) = registry.register_root(&path).await {
                registry.report(error);
            }
        });
    }

    /// Start watching `path` and wait until the native watch is open
    ///
    /// Returns the watched root directory. Unlike [`add`](Self::add), setup
    /// failures are returned to the caller rather than sent to the error channel.
    pub async fn register(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        self.registry.register_root(path.as_ref()).await
    }

    /// Stop watching one root directory
    pub async fn remove(&self, dir: impl AsRef<Path>) -> bool {
        self.registry.remove_root(dir.as_ref()).await
    }

    /// Currently watched root directories
    pub fn roots(&self) -> Vec<PathBuf> {
        self.registry.roots()
    }

    /// Wait for the next change event
    ///
    /// Returns `None` once the observer is destroyed and drained.
    pub async fn next_event(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Wait for the next reported error
    pub async fn next_error(&mut self) -> Option<ObserveError> {
        self.errors.recv().await
    }

    /// Take the next error if one is already queued
    pub fn try_next_error(&mut self) -> Option<ObserveError> {
        self.errors.try_recv()
    }

    /// Event stream, for use with `futures::StreamExt`
    pub fn events(&mut self) -> &mut EventStream {
        &mut self.events
    }

    /// Both consumer streams at once, e.g. for `tokio::select!`
    pub fn streams(&mut self) -> (&mut EventStream, &mut ErrorStream) {
        (&mut self.events, &mut self.errors)
    }

    pub fn metrics(&self) -> ObserverMetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.emitter.is_closed()
    }

    /// Release every native watch and stop producing events
    ///
    /// Pending debounces are dropped without emitting. Events queued before
    /// this call can still be read; then the stream ends.
    pub fn destroy(&mut self) {
        if self.is_destroyed() {
            return;
        }

        self.shared.emitter.close();
        self.registry.close_all();
        self.events.close();
        self.errors.close();
        info!("observer destroyed");
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Observe `roots` on the real filesystem with default settings
pub fn observe<I, P>(roots: I) -> Observer
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let observer = Observer::with_parts(
        ObserverConfig::default(),
        IgnorePolicy::default(),
        Arc::new(FsMetadata),
        platform::create_platform_watcher(),
    );

    for root in roots {
        observer.add(root);
    }

    observer
}
