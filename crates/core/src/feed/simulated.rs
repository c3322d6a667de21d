//! Simulated walk for devices (and emulators) without a GPS fix.
//!
//! Moves in a straight line from `start` to `destination`, one sample per
//! interval, facing the direction of travel. Optional jitter scatters each
//! sample by up to `jitter_meters` to look like a real receiver.

use std::time::Duration;

use geo::Point;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    feed::{FeedSink, PositionFeed, PositionSample, Result, Subscription},
    geodesy::{Coordinate, bearing_degrees, meters_to_degrees_approx},
};

/// Shortest tick; a zero period would stall the timer
const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Clone, Debug)]
pub struct SimulatedWalk {
    pub start: Coordinate,
    pub destination: Coordinate,
    /// Samples emitted after the starting one; the last lands on `destination`
    pub steps: u32,
    pub interval: Duration,
    pub jitter_meters: f64,
    pub accuracy_meters: f64,
    /// Fixed seed for reproducible jitter
    pub seed: Option<u64>,
}

impl SimulatedWalk {
    pub fn new(start: Coordinate, destination: Coordinate) -> Self {
        Self {
            start,
            destination,
            steps: 60,
            interval: Duration::from_secs(1),
            jitter_meters: 0.0,
            accuracy_meters: 5.0,
            seed: None,
        }
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps.max(1);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_INTERVAL);
        self
    }

    pub fn with_jitter(mut self, jitter_meters: f64, seed: Option<u64>) -> Self {
        self.jitter_meters = if jitter_meters.is_finite() {
            jitter_meters.max(0.0)
        } else {
            0.0
        };
        self.seed = seed;
        self
    }

    /// Position after `step` of `steps`, before jitter
    pub fn waypoint(&self, step: u32) -> Coordinate {
        let progress = f64::from(step.min(self.steps)) / f64::from(self.steps.max(1));
        let start: Point = self.start.into();
        let destination: Point = self.destination.into();

        (start + (destination - start) * progress).into()
    }

    fn jitter_degrees(&self) -> Option<f64> {
        (self.jitter_meters.is_finite() && self.jitter_meters > 0.0)
            .then(|| meters_to_degrees_approx(self.jitter_meters))
    }

    fn heading(&self) -> Option<f64> {
        (self.start != self.destination).then(|| bearing_degrees(self.start, self.destination))
    }
}

impl PositionFeed for SimulatedWalk {
    fn start(&mut self, sink: FeedSink) -> Result<Subscription> {
        let walk = self.clone();
        let subscription = Subscription::new(&sink);

        tracing::info!(
            steps = walk.steps,
            interval_ms = walk.interval.as_millis() as u64,
            "starting simulated walk"
        );

        let task = tokio::spawn(async move {
            let mut rng = match walk.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            let heading = walk.heading();
            let jitter = walk.jitter_degrees();
            let mut ticker = tokio::time::interval(walk.interval.max(MIN_INTERVAL));

            for step in 0..=walk.steps {
                ticker.tick().await;

                let mut coordinate = walk.waypoint(step);
                if let Some(spread) = jitter {
                    coordinate.latitude += rng.random_range(-spread..=spread);
                    coordinate.longitude += rng.random_range(-spread..=spread);
                }

                let mut sample = PositionSample::new(coordinate, chrono::Utc::now().timestamp_millis())
                    .with_accuracy(walk.accuracy_meters);
                sample.heading_degrees = heading;

                if !sink.sample(sample) {
                    tracing::debug!(step, "simulated walk stopped early");
                    return;
                }
            }

            tracing::debug!("simulated walk finished");
        });

        Ok(subscription.with_task(task))
    }
}
