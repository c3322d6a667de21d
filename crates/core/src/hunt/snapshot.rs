use crate::hunt::{
    proximity::{ColorTier, HintTier},
    state::HuntState,
};

pub const FOUND_BANNER: &str = "🎉 Tesouro encontrado! 🎉";
pub const PERMISSION_DENIED_NOTICE: &str = "Permissão de localização negada";

/// What the screen should show after the latest accepted event
#[derive(Clone, Debug, PartialEq)]
pub struct HuntSnapshot {
    pub hint_text: String,
    pub color_tier: ColorTier,
    /// `#RRGGBB`
    pub background_color: String,
    pub rotation_degrees: f64,
    pub step_count: f64,
    pub distance_meters: f64,
    pub hint_tier: HintTier,
    pub found: bool,
    pub banner: Option<String>,
    /// Feed problems worth telling the player about
    pub notice: Option<String>,
}

impl HuntSnapshot {
    pub fn from_state(state: &HuntState) -> Self {
        let proximity = &state.proximity;
        let color_tier = proximity.hint_tier.color_tier();
        let found = state.is_found();

        // nothing to hint at until the first fix arrives
        let hint_text = if state.samples_accepted == 0 {
            String::new()
        } else {
            proximity.hint_tier.hint_text().to_owned()
        };

        Self {
            hint_text,
            color_tier,
            background_color: color_tier.background_hex(),
            rotation_degrees: proximity.rotation_degrees,
            step_count: proximity.step_count,
            distance_meters: proximity.distance_meters,
            hint_tier: proximity.hint_tier,
            found,
            banner: found.then(|| FOUND_BANNER.to_owned()),
            notice: None,
        }
    }

    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }

    /// Step count as displayed, one decimal place
    pub fn steps_label(&self) -> String {
        format!("Distância: {:.1} passos", self.step_count)
    }
}

impl Default for HuntSnapshot {
    fn default() -> Self {
        Self::from_state(&HuntState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::HuntConfig, feed::PositionSample, geodesy::Coordinate, hunt::state::advance};

    #[test]
    fn test_initial_snapshot() {
        let snapshot = HuntSnapshot::default();

        assert_eq!(snapshot.hint_text, "");
        assert_eq!(snapshot.color_tier, ColorTier::Cool);
        assert_eq!(snapshot.background_color, "#87CEFA");
        assert_eq!(snapshot.step_count, 0.0);
        assert!(!snapshot.found);
        assert_eq!(snapshot.banner, None);
        assert_eq!(snapshot.steps_label(), "Distância: 0.0 passos");
    }

    #[test]
    fn test_found_snapshot_has_banner() {
        let config = HuntConfig::default();
        let state = advance(&HuntState::new(), &PositionSample::new(config.target, 0), &config).state;

        let snapshot = HuntSnapshot::from_state(&state);
        assert!(snapshot.found);
        assert_eq!(snapshot.hint_text, HintTier::VeryHot.hint_text());
        assert_eq!(snapshot.banner.as_deref(), Some(FOUND_BANNER));
        assert_eq!(snapshot.background_color, "#FF4500");
    }

    #[test]
    fn test_far_snapshot() {
        let config = HuntConfig::default();
        let far = Coordinate::new(config.target.latitude + 0.009, config.target.longitude);
        let state = advance(&HuntState::new(), &PositionSample::new(far, 0), &config).state;

        let snapshot = HuntSnapshot::from_state(&state).with_notice("GPS perdido");
        assert_eq!(snapshot.hint_text, "Frio! Está longe do tesouro.");
        assert_eq!(snapshot.notice.as_deref(), Some("GPS perdido"));
        assert!(snapshot.steps_label().starts_with("Distância: 125"));
    }
}
