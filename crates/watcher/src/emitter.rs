//! Ordered, pull-based output of classified events
//!
//! Production never blocks: events queue up unread. Once the unread backlog
//! reaches the high-water mark, `push` starts returning false so producers can
//! see the pressure. Errors travel on a separate channel.

use crate::error::ObserveError;
use crate::metrics::ObserverMetrics;
use fsobserve_core::ChangeEvent;
use futures::Stream;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::warn;

/// Producer half shared by every classifier task
#[derive(Debug, Clone)]
pub struct Emitter {
    events: mpsc::UnboundedSender<ChangeEvent>,
    errors: mpsc::UnboundedSender<ObserveError>,
    backlog: Arc<AtomicUsize>,
    high_water_mark: usize,
    closed: Arc<AtomicBool>,
    metrics: Arc<ObserverMetrics>,
}

/// Create an emitter and its two consumer streams
pub fn channel(
    high_water_mark: usize,
    metrics: Arc<ObserverMetrics>,
) -> (Emitter, EventStream, ErrorStream) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (error_tx, error_rx) = mpsc::unbounded_channel();
    let backlog = Arc::new(AtomicUsize::new(0));

    let emitter = Emitter {
        events: event_tx,
        errors: error_tx,
        backlog: Arc::clone(&backlog),
        high_water_mark,
        closed: Arc::new(AtomicBool::new(false)),
        metrics,
    };

    (
        emitter,
        EventStream {
            rx: event_rx,
            backlog,
        },
        ErrorStream { rx: error_rx },
    )
}

impl Emitter {
    /// Queue an event for consumers
    ///
    /// Returns false when the event was dropped because the emitter is closed,
    /// or when the unread backlog has reached the high-water mark.
    pub fn push(&self, event: ChangeEvent) -> bool {
        if self.is_closed() {
            return false;
        }

        self.backlog.fetch_add(1, Ordering::AcqRel);
        if self.events.send(event).is_err() {
            self.backlog.fetch_sub(1, Ordering::AcqRel);
            return false;
        }
        self.metrics.record_event();

        self.backlog.load(Ordering::Acquire) < self.high_water_mark
    }

    /// Report a non-fatal error
    pub fn fail(&self, error: ObserveError) {
        if self.is_closed() {
            return;
        }

        warn!("{}", error);
        self.metrics.record_error();
        let _ = self.errors.send(error);
    }

    /// Stop accepting events and errors
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of pushed events not yet read
    pub fn backlog(&self) -> usize {
        self.backlog.load(Ordering::Acquire)
    }
}

/// Consumer side of the event queue
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<ChangeEvent>,
    backlog: Arc<AtomicUsize>,
}

impl EventStream {
    /// Wait for the next event; `None` once the observer is destroyed and drained
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        let event = self.rx.recv().await?;
        self.backlog.fetch_sub(1, Ordering::AcqRel);
        Some(event)
    }

    /// Take the next event if one is already queued
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        let event = self.rx.try_recv().ok()?;
        self.backlog.fetch_sub(1, Ordering::AcqRel);
        Some(event)
    }

    /// Number of queued, unread events
    pub fn backlog(&self) -> usize {
        self.backlog.load(Ordering::Acquire)
    }

    /// Refuse further events; queued ones can still be drained
    pub(crate) fn close(&mut self) {
        self.rx.close();
    }
}

impl Stream for EventStream {
    type Item = ChangeEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.rx.poll_recv(cx) {
            Poll::Ready(Some(event)) => {
                this.backlog.fetch_sub(1, Ordering::AcqRel);
                Poll::Ready(Some(event))
            }
            other => other,
        }
    }
}

/// Consumer side of the error channel
#[derive(Debug)]
pub struct ErrorStream {
    rx: mpsc::UnboundedReceiver<ObserveError>,
}

impl ErrorStream {
    pub async fn recv(&mut self) -> Option<ObserveError> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ObserveError> {
        self.rx.try_recv().ok()
    }

    pub(crate) fn close(&mut self) {
        self.rx.close();
    }
}

impl Stream for ErrorStream {
    type Item = ObserveError;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsobserve_core::FileMetadata;
    use futures::StreamExt;
    use std::io;
    use std::path::PathBuf;

    fn add_event(name: &str) -> ChangeEvent {
        ChangeEvent::add(PathBuf::from(name), FileMetadata::with_size(0))
    }

    #[tokio::test]
    async fn test_events_arrive_in_push_order() {
        let (emitter, mut events, _errors) = channel(16, Arc::new(ObserverMetrics::new()));

        emitter.push(add_event("/w/a"));
        emitter.push(add_event("/w/b"));
        emitter.push(add_event("/w/c"));

        let names: Vec<_> = vec![
            events.recv().await.unwrap(),
            events.next().await.unwrap(),
            events.try_recv().unwrap(),
        ]
        .into_iter()
        .map(|e| e.name().to_path_buf())
        .collect();

        assert_eq!(
            names,
            vec![PathBuf::from("/w/a"), PathBuf::from("/w/b"), PathBuf::from("/w/c")]
        );
        assert_eq!(events.backlog(), 0);
    }

    #[tokio::test]
    async fn test_push_signals_high_water_mark() {
        let (emitter, mut events, _errors) = channel(2, Arc::new(ObserverMetrics::new()));

        assert!(emitter.push(add_event("/w/a")));
        assert!(!emitter.push(add_event("/w/b")));
        assert!(!emitter.push(add_event("/w/c")));
        assert_eq!(emitter.backlog(), 3);

        // Draining relieves the pressure
        events.recv().await.unwrap();
        events.recv().await.unwrap();
        assert!(emitter.push(add_event("/w/d")));
    }

    #[tokio::test]
    async fn test_closed_emitter_drops_everything() {
        let metrics = Arc::new(ObserverMetrics::new());
        let (emitter, mut events, mut errors) = channel(16, Arc::clone(&metrics));

        emitter.push(add_event("/w/queued"));
        emitter.close();
        events.close();
        errors.close();

        assert!(!emitter.push(add_event("/w/late")));
        emitter.fail(ObserveError::Stat {
            path: PathBuf::from("/w/late"),
            source: io::Error::new(io::ErrorKind::Other, "late"),
        });

        // Queued before close is still readable, then the stream ends
        assert_eq!(events.recv().await.unwrap().name(), PathBuf::from("/w/queued"));
        assert!(events.recv().await.is_none());
        assert!(errors.recv().await.is_none());

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.events_emitted, 1);
        assert_eq!(snapshot.errors, 0);
    }

    #[tokio::test]
    async fn test_errors_are_delivered_separately() {
        let (emitter, _events, mut errors) = channel(16, Arc::new(ObserverMetrics::new()));

        emitter.fail(ObserveError::Listing {
            path: PathBuf::from("/w"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        });

        let error = errors.try_recv().unwrap();
        assert!(matches!(error, ObserveError::Listing { .. }));
        assert_eq!(error.path(), Some(PathBuf::from("/w").as_path()));
    }
}
