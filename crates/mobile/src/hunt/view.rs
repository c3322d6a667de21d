use treasure_hunt_core::{
    Coordinate, HintTier, HuntReport, HuntSnapshot, PositionSample, session::SessionEnd,
};

#[derive(Clone, Copy, Debug, PartialEq, uniffi::Record)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<GeoPoint> for Coordinate {
    fn from(point: GeoPoint) -> Self {
        Coordinate::new(point.latitude, point.longitude)
    }
}

/// A fix from the platform location service
#[derive(Clone, Copy, Debug, PartialEq, uniffi::Record)]
pub struct PositionUpdate {
    pub latitude: f64,
    pub longitude: f64,
    /// Degrees from north; negative when the platform doesn't know
    pub heading: f64,
    pub accuracy: f64,
    pub timestamp_ms: i64,
}

impl From<PositionUpdate> for PositionSample {
    fn from(update: PositionUpdate) -> Self {
        let sample = PositionSample::new(
            Coordinate::new(update.latitude, update.longitude),
            update.timestamp_ms,
        )
        .with_accuracy(update.accuracy);

        if update.heading.is_finite() && update.heading >= 0.0 {
            sample.with_heading(update.heading)
        } else {
            sample
        }
    }
}

#[derive(Clone, Debug, PartialEq, uniffi::Enum)]
pub enum PositionSource {
    /// Fixes are pushed with `push_position`
    Device,
    /// Walk from `start` to the treasure on a timer
    Simulated {
        start: GeoPoint,
        steps: u32,
        interval_ms: u64,
        jitter_meters: f64,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum HintLevel {
    Far,
    Warm,
    Hot,
    VeryHot,
}

impl From<HintTier> for HintLevel {
    fn from(tier: HintTier) -> Self {
        match tier {
            HintTier::Far => HintLevel::Far,
            HintTier::Warm => HintLevel::Warm,
            HintTier::Hot => HintLevel::Hot,
            HintTier::VeryHot => HintLevel::VeryHot,
        }
    }
}

#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct HuntView {
    pub hint_text: String,
    pub hint_level: HintLevel,
    pub color_tier: u8,
    pub background_color: String,
    pub rotation_degrees: f64,
    pub step_count: f64,
    pub steps_label: String,
    pub distance_meters: f64,
    pub found: bool,
    pub banner: Option<String>,
    pub notice: Option<String>,
}

impl From<&HuntSnapshot> for HuntView {
    fn from(snapshot: &HuntSnapshot) -> Self {
        Self {
            hint_text: snapshot.hint_text.clone(),
            hint_level: snapshot.hint_tier.into(),
            color_tier: snapshot.color_tier.level(),
            background_color: snapshot.background_color.clone(),
            rotation_degrees: snapshot.rotation_degrees,
            step_count: snapshot.step_count,
            steps_label: snapshot.steps_label(),
            distance_meters: snapshot.distance_meters,
            found: snapshot.found,
            banner: snapshot.banner.clone(),
            notice: snapshot.notice.clone(),
        }
    }
}

impl Default for HuntView {
    fn default() -> Self {
        Self::from(&HuntSnapshot::default())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum HuntEnd {
    Stopped,
    FeedEnded,
    PermissionRevoked,
}

impl From<SessionEnd> for HuntEnd {
    fn from(end: SessionEnd) -> Self {
        match end {
            SessionEnd::Stopped => HuntEnd::Stopped,
            SessionEnd::FeedEnded => HuntEnd::FeedEnded,
            SessionEnd::PermissionRevoked => HuntEnd::PermissionRevoked,
        }
    }
}

#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct HuntSummary {
    pub found: bool,
    pub found_at_ms: Option<i64>,
    pub samples: u64,
    pub end: HuntEnd,
    pub last_view: HuntView,
}

impl From<&HuntReport> for HuntSummary {
    fn from(report: &HuntReport) -> Self {
        Self {
            found: report.state.is_found(),
            found_at_ms: report
                .state
                .status
                .found_at()
                .map(|at| at.timestamp_millis()),
            samples: report.state.samples_accepted,
            end: report.end.into(),
            last_view: HuntView::from(&report.snapshot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(heading: f64) -> PositionUpdate {
        PositionUpdate {
            latitude: -23.1,
            longitude: -45.7,
            heading,
            accuracy: 4.0,
            timestamp_ms: 1_000,
        }
    }

    #[test]
    fn test_negative_heading_is_unknown() {
        assert_eq!(PositionSample::from(update(-1.0)).heading_degrees, None);
        assert_eq!(PositionSample::from(update(f64::NAN)).heading_degrees, None);
        assert_eq!(PositionSample::from(update(0.0)).heading_degrees, Some(0.0));
        assert_eq!(PositionSample::from(update(270.0)).heading_degrees, Some(270.0));
    }

    #[test]
    fn test_update_keeps_position_and_accuracy() {
        let sample = PositionSample::from(update(10.0));
        assert_eq!(sample.coordinate, Coordinate::new(-23.1, -45.7));
        assert_eq!(sample.accuracy_meters, 4.0);
        assert_eq!(sample.timestamp_ms, 1_000);
    }

    #[test]
    fn test_initial_view() {
        let view = HuntView::default();
        assert_eq!(view.hint_text, "");
        assert_eq!(view.hint_level, HintLevel::Far);
        assert_eq!(view.color_tier, 0);
        assert_eq!(view.steps_label, "Distância: 0.0 passos");
        assert!(!view.found);
    }
}
