use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::config::TierThresholds;

/// How close the player is, in "temperature".
///
/// Variants are declared from coldest to hottest so the derived ordering is
/// the heat ordering.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum HintTier {
    Far,
    Warm,
    Hot,
    VeryHot,
}

impl HintTier {
    /// Classify a distance expressed in steps.
    ///
    /// Each boundary belongs to the colder tier: exactly 10 steps is `Hot`.
    pub fn from_steps(step_count: f64, thresholds: &TierThresholds) -> Self {
        if step_count < thresholds.very_hot_below {
            HintTier::VeryHot
        } else if step_count < thresholds.hot_below {
            HintTier::Hot
        } else if step_count < thresholds.warm_below {
            HintTier::Warm
        } else {
            HintTier::Far
        }
    }

    pub fn hint_text(&self) -> &'static str {
        match self {
            HintTier::VeryHot => "Muito quente! Está quase lá!",
            HintTier::Hot => "Quente! Está perto!",
            HintTier::Warm => "Morno! Continue procurando.",
            HintTier::Far => "Frio! Está longe do tesouro.",
        }
    }

    pub fn color_tier(&self) -> ColorTier {
        match self {
            HintTier::VeryHot => ColorTier::Hot,
            HintTier::Hot => ColorTier::Warm,
            HintTier::Warm => ColorTier::Mild,
            HintTier::Far => ColorTier::Cool,
        }
    }
}

/// Background color bucket, 0 (coolest) to 3 (reddest)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ColorTier {
    Cool = 0,
    Mild = 1,
    Warm = 2,
    Hot = 3,
}

impl ColorTier {
    pub fn level(&self) -> u8 {
        *self as u8
    }

    pub fn background(&self) -> Srgb<u8> {
        match self {
            ColorTier::Cool => Srgb::new(0x87, 0xCE, 0xFA),
            ColorTier::Mild => Srgb::new(0xFF, 0xA5, 0x00),
            ColorTier::Warm => Srgb::new(0xFF, 0x63, 0x47),
            ColorTier::Hot => Srgb::new(0xFF, 0x45, 0x00),
        }
    }

    /// Background as `#RRGGBB`
    pub fn background_hex(&self) -> String {
        let color = self.background();
        format!("#{:02X}{:02X}{:02X}", color.red, color.green, color.blue)
    }
}

/// Everything derived from a single position sample
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProximityState {
    pub distance_meters: f64,
    pub step_count: f64,
    pub hint_tier: HintTier,
    pub bearing_degrees: f64,
    pub rotation_degrees: f64,
}

impl ProximityState {
    /// Shown before the first sample arrives
    pub const INITIAL: ProximityState = ProximityState {
        distance_meters: 0.0,
        step_count: 0.0,
        hint_tier: HintTier::Far,
        bearing_degrees: 0.0,
        rotation_degrees: 0.0,
    };
}

impl Default for ProximityState {
    fn default() -> Self {
        Self::INITIAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_tier_boundaries() {
        let thresholds = TierThresholds::default();

        assert_eq!(HintTier::from_steps(0.0, &thresholds), HintTier::VeryHot);
        assert_eq!(HintTier::from_steps(9.99, &thresholds), HintTier::VeryHot);
        assert_eq!(HintTier::from_steps(10.0, &thresholds), HintTier::Hot);
        assert_eq!(HintTier::from_steps(24.99, &thresholds), HintTier::Hot);
        assert_eq!(HintTier::from_steps(25.0, &thresholds), HintTier::Warm);
        assert_eq!(HintTier::from_steps(49.99, &thresholds), HintTier::Warm);
        assert_eq!(HintTier::from_steps(50.0, &thresholds), HintTier::Far);
        assert_eq!(HintTier::from_steps(1250.0, &thresholds), HintTier::Far);
    }

    #[test]
    fn test_classifier_is_monotonic() {
        let thresholds = TierThresholds::default();
        let mut previous = HintTier::from_steps(0.0, &thresholds);

        // Walking away never gets hotter
        for tenth in 1..1000 {
            let tier = HintTier::from_steps(tenth as f64 / 10.0, &thresholds);
            assert!(tier <= previous, "{tier} hotter than {previous} at {tenth}");
            previous = tier;
        }
    }

    #[test]
    fn test_heat_ordering() {
        let tiers: Vec<HintTier> = HintTier::iter().collect();
        assert_eq!(
            tiers,
            vec![HintTier::Far, HintTier::Warm, HintTier::Hot, HintTier::VeryHot]
        );
        assert!(tiers.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_color_tiers_follow_heat() {
        for tier in HintTier::iter() {
            assert_eq!(tier.color_tier().level() as usize, tier as usize);
        }

        assert_eq!(HintTier::Far.color_tier().background_hex(), "#87CEFA");
        assert_eq!(HintTier::VeryHot.color_tier().background_hex(), "#FF4500");
    }

    #[test]
    fn test_display() {
        assert_eq!(HintTier::VeryHot.to_string(), "VERY_HOT");
        assert_eq!(HintTier::Far.to_string(), "FAR");
    }
}
