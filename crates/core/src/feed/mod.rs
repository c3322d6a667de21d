//! Position feed contract.
//!
//! A feed is started with a [`FeedSink`] and hands back a [`Subscription`].
//! Stopping the subscription closes the sink's gate, so nothing a feed sends
//! afterwards reaches the hunt.

use std::{
    future::Future,
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use tokio::{sync::mpsc, task::JoinHandle};

use crate::geodesy::Coordinate;

pub mod live;
pub mod simulated;

/// One reading from a location provider
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionSample {
    pub coordinate: Coordinate,
    /// Compass heading of the device, if the platform knows it
    pub heading_degrees: Option<f64>,
    pub accuracy_meters: f64,
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: i64,
}

impl PositionSample {
    pub fn new(coordinate: Coordinate, timestamp_ms: i64) -> Self {
        Self {
            coordinate,
            heading_degrees: None,
            accuracy_meters: 0.0,
            timestamp_ms,
        }
    }

    pub fn with_heading(mut self, heading_degrees: f64) -> Self {
        self.heading_degrees = Some(heading_degrees);
        self
    }

    pub fn with_accuracy(mut self, accuracy_meters: f64) -> Self {
        self.accuracy_meters = accuracy_meters;
        self
    }
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum FeedError {
    #[error("Location service unavailable: {0}")]
    Unavailable(String),

    #[error("Location service failure: {0}")]
    ServiceFailure(String),

    #[error("Invalid sample: {0}")]
    InvalidSample(String),
}

pub type Result<T> = std::result::Result<T, FeedError>;

#[derive(Clone, Debug, PartialEq)]
pub enum FeedEvent {
    Sample(PositionSample),
    PermissionDenied,
    Error(FeedError),
}

/// Sending side handed to a feed on start.
#[derive(Clone, Debug)]
pub struct FeedSink {
    sender: mpsc::UnboundedSender<FeedEvent>,
    open: Arc<AtomicBool>,
}

impl FeedSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<FeedEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let sink = Self {
            sender,
            open: Arc::new(AtomicBool::new(true)),
        };
        (sink, receiver)
    }

    /// Returns false if the event was dropped because the feed was stopped or
    /// nobody is listening anymore.
    pub fn send(&self, event: FeedEvent) -> bool {
        if !self.is_open() {
            return false;
        }
        self.sender.send(event).is_ok()
    }

    pub fn sample(&self, sample: PositionSample) -> bool {
        self.send(FeedEvent::Sample(sample))
    }

    pub fn permission_denied(&self) -> bool {
        self.send(FeedEvent::PermissionDenied)
    }

    pub fn error(&self, error: FeedError) -> bool {
        self.send(FeedEvent::Error(error))
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire) && !self.sender.is_closed()
    }

    pub fn gate(&self) -> Gate {
        Gate(Arc::clone(&self.open))
    }
}

/// Read side of a sink's open flag
#[derive(Clone, Debug)]
pub struct Gate(Arc<AtomicBool>);

impl Gate {
    pub fn is_open(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn close(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Handle returned by [`PositionFeed::start`].
///
/// Dropping it stops the feed.
#[derive(Debug)]
pub struct Subscription {
    gate: Gate,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(sink: &FeedSink) -> Self {
        Self {
            gate: sink.gate(),
            task: None,
        }
    }

    /// Tie a feed-owned task to this subscription; it is aborted on stop.
    pub fn with_task(mut self, task: JoinHandle<()>) -> Self {
        self.task = Some(task);
        self
    }

    #[cfg(test)]
    pub(crate) fn is_active(&self) -> bool {
        self.gate.is_open()
    }

    pub fn stop(mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.gate.close();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

pub trait PositionFeed: Send {
    fn start(&mut self, sink: FeedSink) -> Result<Subscription>;
}

/// Location permission, asked once when a hunt starts.
///
/// Resolves to whether access was granted, or an error message if the platform
/// could not answer.
pub trait PermissionGate: Send + Sync {
    fn request<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<bool, String>> + Send + 'a>>;
}

/// A gate whose answer is already known
pub struct Granted(pub bool);

impl PermissionGate for Granted {
    fn request<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<bool, String>> + Send + 'a>> {
        let granted = self.0;
        Box::pin(async move { Ok(granted) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PositionSample {
        PositionSample::new(Coordinate::new(1.0, 2.0), 1_000)
    }

    #[test]
    fn test_sink_delivers_until_stopped() {
        let (sink, mut receiver) = FeedSink::channel();
        let subscription = Subscription::new(&sink);

        assert!(sink.sample(sample()));
        assert!(subscription.is_active());

        subscription.stop();

        assert!(!sink.sample(sample()));
        assert!(!sink.permission_denied());
        assert_eq!(receiver.try_recv().unwrap(), FeedEvent::Sample(sample()));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_dropping_subscription_closes_gate() {
        let (sink, _receiver) = FeedSink::channel();
        drop(Subscription::new(&sink));

        assert!(!sink.is_open());
        assert!(!sink.error(FeedError::ServiceFailure("gps".into())));
    }

    #[test]
    fn test_sink_reports_closed_receiver() {
        let (sink, receiver) = FeedSink::channel();
        drop(receiver);

        assert!(!sink.is_open());
        assert!(!sink.sample(sample()));
    }

    #[test]
    fn test_sample_builders() {
        let sample = sample().with_heading(45.0).with_accuracy(3.5);
        assert_eq!(sample.heading_degrees, Some(45.0));
        assert_eq!(sample.accuracy_meters, 3.5);
    }

    #[tokio::test]
    async fn test_granted_gate() {
        assert_eq!(Granted(true).request().await, Ok(true));
        assert_eq!(Granted(false).request().await, Ok(false));
    }

    #[tokio::test]
    async fn test_stop_aborts_feed_task() {
        let (sink, _receiver) = FeedSink::channel();
        let task = tokio::spawn(std::future::pending::<()>());
        let subscription = Subscription::new(&sink).with_task(task);

        subscription.stop();
        assert!(!sink.is_open());
    }
}
