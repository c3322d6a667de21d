//! Feed for samples pushed in by the platform's location service.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    config::FeedOptions,
    feed::{FeedError, FeedSink, PositionFeed, PositionSample, Result, Subscription},
    geodesy::{Coordinate, distance_meters},
};

/// What happened to a pushed sample
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    Forwarded,
    /// Too close to the previously forwarded sample
    Suppressed,
    /// Feed not started, or already stopped
    Closed,
}

struct LiveState {
    sink: Option<FeedSink>,
    last_forwarded: Option<Coordinate>,
    distance_interval_meters: f64,
}

pub struct LiveFeed {
    shared: Arc<Mutex<LiveState>>,
}

/// Platform-facing side of a [`LiveFeed`]
#[derive(Clone)]
pub struct LiveFeedHandle {
    shared: Arc<Mutex<LiveState>>,
}

impl LiveFeed {
    pub fn new(options: FeedOptions) -> (Self, LiveFeedHandle) {
        let shared = Arc::new(Mutex::new(LiveState {
            sink: None,
            last_forwarded: None,
            distance_interval_meters: options.distance_interval_meters,
        }));

        (
            Self {
                shared: Arc::clone(&shared),
            },
            LiveFeedHandle { shared },
        )
    }
}

impl PositionFeed for LiveFeed {
    fn start(&mut self, sink: FeedSink) -> Result<Subscription> {
        let subscription = Subscription::new(&sink);

        let mut state = lock(&self.shared);
        state.sink = Some(sink);
        state.last_forwarded = None;

        Ok(subscription)
    }
}

impl LiveFeedHandle {
    pub fn push(&self, sample: PositionSample) -> Result<Delivery> {
        if !sample.coordinate.is_valid() {
            tracing::warn!(?sample, "rejecting sample with invalid coordinate");
            return Err(FeedError::InvalidSample(format!(
                "{}, {}",
                sample.coordinate.latitude, sample.coordinate.longitude
            )));
        }

        let mut state = lock(&self.shared);
        let Some(sink) = state.sink.as_ref().filter(|sink| sink.is_open()) else {
            return Ok(Delivery::Closed);
        };

        if let Some(last) = state.last_forwarded {
            if distance_meters(last, sample.coordinate) < state.distance_interval_meters {
                return Ok(Delivery::Suppressed);
            }
        }

        if !sink.sample(sample) {
            return Ok(Delivery::Closed);
        }

        state.last_forwarded = Some(sample.coordinate);
        Ok(Delivery::Forwarded)
    }

    pub fn report_error(&self, error: FeedError) -> bool {
        tracing::warn!(%error, "location feed error");
        self.with_sink(|sink| sink.error(error))
    }

    pub fn report_permission_denied(&self) -> bool {
        self.with_sink(FeedSink::permission_denied)
    }

    fn with_sink(&self, send: impl FnOnce(&FeedSink) -> bool) -> bool {
        lock(&self.shared).sink.as_ref().is_some_and(send)
    }
}

fn lock(shared: &Mutex<LiveState>) -> MutexGuard<'_, LiveState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedEvent;

    fn sample_at(latitude: f64, timestamp_ms: i64) -> PositionSample {
        PositionSample::new(Coordinate::new(latitude, 0.0), timestamp_ms)
    }

    #[test]
    fn test_push_before_start_is_closed() {
        let (_feed, handle) = LiveFeed::new(FeedOptions::default());
        assert_eq!(handle.push(sample_at(0.0, 0)).unwrap(), Delivery::Closed);
        assert!(!handle.report_permission_denied());
    }

    #[test]
    fn test_forwards_and_suppresses_small_moves() {
        let (mut feed, handle) = LiveFeed::new(FeedOptions::default());
        let (sink, mut receiver) = FeedSink::channel();
        let _subscription = feed.start(sink).unwrap();

        assert_eq!(handle.push(sample_at(0.0, 0)).unwrap(), Delivery::Forwarded);
        // ~0.5 m north
        assert_eq!(handle.push(sample_at(0.0000045, 1)).unwrap(), Delivery::Suppressed);
        // ~1.1 m north of the first sample
        assert_eq!(handle.push(sample_at(0.00001, 2)).unwrap(), Delivery::Forwarded);

        assert_eq!(receiver.try_recv().unwrap(), FeedEvent::Sample(sample_at(0.0, 0)));
        assert_eq!(receiver.try_recv().unwrap(), FeedEvent::Sample(sample_at(0.00001, 2)));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_zero_interval_forwards_everything() {
        let (mut feed, handle) = LiveFeed::new(FeedOptions {
            distance_interval_meters: 0.0,
        });
        let (sink, _receiver) = FeedSink::channel();
        let _subscription = feed.start(sink).unwrap();

        assert_eq!(handle.push(sample_at(0.0, 0)).unwrap(), Delivery::Forwarded);
        assert_eq!(handle.push(sample_at(0.0, 1)).unwrap(), Delivery::Forwarded);
    }

    #[test]
    fn test_rejects_invalid_coordinates() {
        let (mut feed, handle) = LiveFeed::new(FeedOptions::default());
        let (sink, _receiver) = FeedSink::channel();
        let _subscription = feed.start(sink).unwrap();

        assert!(matches!(
            handle.push(sample_at(f64::NAN, 0)),
            Err(FeedError::InvalidSample(_))
        ));
    }

    #[test]
    fn test_nothing_delivered_after_stop() {
        let (mut feed, handle) = LiveFeed::new(FeedOptions::default());
        let (sink, mut receiver) = FeedSink::channel();
        let subscription = feed.start(sink).unwrap();

        subscription.stop();

        assert_eq!(handle.push(sample_at(0.0, 0)).unwrap(), Delivery::Closed);
        assert!(!handle.report_error(FeedError::ServiceFailure("gps".into())));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_errors_and_denial_are_forwarded() {
        let (mut feed, handle) = LiveFeed::new(FeedOptions::default());
        let (sink, mut receiver) = FeedSink::channel();
        let _subscription = feed.start(sink).unwrap();

        assert!(handle.report_error(FeedError::Unavailable("off".into())));
        assert!(handle.report_permission_denied());

        assert_eq!(
            receiver.try_recv().unwrap(),
            FeedEvent::Error(FeedError::Unavailable("off".into()))
        );
        assert_eq!(receiver.try_recv().unwrap(), FeedEvent::PermissionDenied);
    }
}
