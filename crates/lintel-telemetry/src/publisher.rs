//! Telemetry publishers.
//!
//! A [`TelemetryPublisher`] is the sink the exception handler reports every
//! intercepted failure to. Publishers are synchronous and must not block;
//! [`ChannelPublisher`] hands events to an async consumer instead.

use crate::event::TelemetryEvent;
use crate::metrics::record_exception;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Receives telemetry for intercepted failures.
pub trait TelemetryPublisher: Send + Sync {
    /// Publishes one event.
    fn publish(&self, event: &TelemetryEvent);
}

impl<P: TelemetryPublisher + ?Sized> TelemetryPublisher for Arc<P> {
    fn publish(&self, event: &TelemetryEvent) {
        (**self).publish(event);
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl TelemetryPublisher for NoopPublisher {
    fn publish(&self, _event: &TelemetryEvent) {}
}

/// Emits each event as a structured `tracing` event.
///
/// Bad requests are logged at `WARN`, everything else at `ERROR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingPublisher;

impl TelemetryPublisher for TracingPublisher {
    fn publish(&self, event: &TelemetryEvent) {
        if event.bad_request {
            tracing::warn!(
                request_id = %event.request_id,
                http.method = %event.method,
                http.path = %event.path,
                http.status_code = event.status_code,
                exception_type = %event.exception_type,
                response_started = event.response_started,
                error = %event.message,
                "Bad request"
            );
        } else {
            tracing::error!(
                request_id = %event.request_id,
                http.method = %event.method,
                http.path = %event.path,
                http.status_code = event.status_code,
                exception_type = %event.exception_type,
                response_started = event.response_started,
                error = %event.message,
                "Unhandled exception"
            );
        }
    }
}

/// Counts events in `lintel_exceptions_total`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsPublisher;

impl TelemetryPublisher for MetricsPublisher {
    fn publish(&self, event: &TelemetryEvent) {
        record_exception(&event.exception_type, &event.status_label());
    }
}

/// Records events in memory.
///
/// # Example
///
/// ```
/// use lintel_core::LintelError;
/// use lintel_telemetry::{MemoryPublisher, TelemetryEvent, TelemetryPublisher};
///
/// let publisher = MemoryPublisher::new();
/// publisher.publish(&TelemetryEvent::from_error(&LintelError::internal("boom")));
///
/// assert_eq!(publisher.len(), 1);
/// assert_eq!(publisher.events()[0].message, "boom");
/// ```
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl MemoryPublisher {
    /// Creates an empty publisher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().clone()
    }

    /// Returns the most recent event.
    #[must_use]
    pub fn last(&self) -> Option<TelemetryEvent> {
        self.events.lock().last().cloned()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Removes all recorded events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl TelemetryPublisher for MemoryPublisher {
    fn publish(&self, event: &TelemetryEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Forwards events over an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    sender: mpsc::UnboundedSender<TelemetryEvent>,
}

impl ChannelPublisher {
    /// Creates a publisher and the receiving end of its channel.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TelemetryEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl TelemetryPublisher for ChannelPublisher {
    fn publish(&self, event: &TelemetryEvent) {
        if self.sender.send(event.clone()).is_err() {
            tracing::debug!(
                request_id = %event.request_id,
                "Telemetry receiver dropped, event discarded"
            );
        }
    }
}

/// Forwards each event to several publishers, in order.
#[derive(Clone, Default)]
pub struct FanoutPublisher {
    publishers: Vec<Arc<dyn TelemetryPublisher>>,
}

impl FanoutPublisher {
    /// Creates an empty fanout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a publisher.
    #[must_use]
    pub fn with<P: TelemetryPublisher + 'static>(mut self, publisher: P) -> Self {
        self.publishers.push(Arc::new(publisher));
        self
    }

    /// Adds an already shared publisher.
    #[must_use]
    pub fn with_shared(mut self, publisher: Arc<dyn TelemetryPublisher>) -> Self {
        self.publishers.push(publisher);
        self
    }

    /// Number of downstream publishers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.publishers.len()
    }

    /// Returns `true` if there are no downstream publishers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.publishers.is_empty()
    }
}

impl std::fmt::Debug for FanoutPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutPublisher")
            .field("publishers", &self.publishers.len())
            .finish()
    }
}

impl TelemetryPublisher for FanoutPublisher {
    fn publish(&self, event: &TelemetryEvent) {
        for publisher in &self.publishers {
            publisher.publish(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lintel_core::LintelError;

    fn event(message: &str) -> TelemetryEvent {
        TelemetryEvent::from_error(&LintelError::internal(message))
    }

    #[test]
    fn test_memory_publisher_records_in_order() {
        let publisher = MemoryPublisher::new();
        assert!(publisher.is_empty());

        publisher.publish(&event("first"));
        publisher.publish(&event("second"));

        assert_eq!(publisher.len(), 2);
        assert_eq!(publisher.events()[0].message, "first");
        assert_eq!(publisher.last().unwrap().message, "second");

        publisher.clear();
        assert!(publisher.is_empty());
    }

    #[test]
    fn test_arc_publisher_delegates() {
        let memory = Arc::new(MemoryPublisher::new());
        let shared: Arc<dyn TelemetryPublisher> = memory.clone();
        shared.publish(&event("shared"));
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn test_fanout_reaches_every_publisher() {
        let a = Arc::new(MemoryPublisher::new());
        let b = Arc::new(MemoryPublisher::new());
        let fanout = FanoutPublisher::new()
            .with(a.clone())
            .with(b.clone())
            .with(NoopPublisher);

        fanout.publish(&event("everyone"));

        assert_eq!(fanout.len(), 3);
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
    }

    #[tokio::test]
    async fn test_channel_publisher_delivers_events() {
        let (publisher, mut receiver) = ChannelPublisher::new();
        publisher.publish(&event("queued"));

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.message, "queued");
    }

    #[test]
    fn test_channel_publisher_survives_dropped_receiver() {
        let (publisher, receiver) = ChannelPublisher::new();
        drop(receiver);
        publisher.publish(&event("lost"));
    }

    #[test]
    fn test_tracing_and_metrics_publishers_dont_panic() {
        let bad = TelemetryEvent::from_error(&LintelError::bad_request("nope"));
        TracingPublisher.publish(&bad);
        TracingPublisher.publish(&event("boom"));
        MetricsPublisher.publish(&bad);
    }
}
