use chrono::{DateTime, Utc};

use crate::{
    config::HuntConfig,
    feed::PositionSample,
    geodesy::{bearing_degrees, distance_meters},
    hunt::{
        heading::relative_rotation,
        proximity::{HintTier, ProximityState},
    },
};

/// Whether the treasure has been found. Once set it never reverts.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HuntStatus {
    found_at: Option<DateTime<Utc>>,
}

impl HuntStatus {
    pub fn is_found(&self) -> bool {
        self.found_at.is_some()
    }

    pub fn found_at(&self) -> Option<DateTime<Utc>> {
        self.found_at
    }

    fn mark_found(&mut self, at: DateTime<Utc>) -> bool {
        if self.found_at.is_some() {
            return false;
        }
        self.found_at = Some(at);
        true
    }
}

/// Side effects requested by a transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HuntEffect {
    PlayFoundSound,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HuntState {
    pub status: HuntStatus,
    pub proximity: ProximityState,
    pub samples_accepted: u64,
}

pub struct Advance {
    pub state: HuntState,
    pub effect: Option<HuntEffect>,
}

impl HuntState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_found(&self) -> bool {
        self.status.is_found()
    }
}

/// Apply one position sample.
///
/// Once found, the state is frozen: further samples change nothing and
/// request no effects.
pub fn advance(state: &HuntState, sample: &PositionSample, config: &HuntConfig) -> Advance {
    if state.is_found() {
        return Advance {
            state: *state,
            effect: None,
        };
    }

    let current = sample.coordinate;
    let distance = distance_meters(current, config.target);
    let step_count = distance / config.stride_length_meters;
    let bearing = bearing_degrees(current, config.target);

    let proximity = ProximityState {
        distance_meters: distance,
        step_count,
        hint_tier: HintTier::from_steps(step_count, &config.tiers),
        bearing_degrees: bearing,
        rotation_degrees: relative_rotation(bearing, sample.heading_degrees),
    };

    let mut next = HuntState {
        status: state.status,
        proximity,
        samples_accepted: state.samples_accepted + 1,
    };

    let mut effect = None;
    if distance < config.found_threshold_meters {
        let found_at = DateTime::<Utc>::from_timestamp_millis(sample.timestamp_ms)
            .unwrap_or_else(|| {
                tracing::warn!(
                    timestamp_ms = sample.timestamp_ms,
                    "sample timestamp out of range, using current time"
                );
                Utc::now()
            });
        if next.status.mark_found(found_at) {
            effect = Some(HuntEffect::PlayFoundSound);
        }
    }

    Advance {
        state: next,
        effect,
    }
}
