//! Tunable constants for a hunt.
//!
//! Everything here is compiled in with sensible defaults and can be overridden
//! from JSON. Fields missing from the JSON keep their defaults.

use serde::{Deserialize, Serialize};

use crate::geodesy::Coordinate;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {parameter} = {value}")]
    Invalid { parameter: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HuntConfig {
    /// Where the treasure is buried
    pub target: Coordinate,
    /// Assumed length of one step, used to turn meters into steps
    pub stride_length_meters: f64,
    /// The hunt ends once the raw distance drops below this
    pub found_threshold_meters: f64,
    pub tiers: TierThresholds,
    /// Bundled asset name or remote URI of the completion sound
    pub sound: String,
    pub feed: FeedOptions,
}

impl Default for HuntConfig {
    fn default() -> Self {
        Self {
            target: Coordinate::new(-23.11443, -45.70780),
            stride_length_meters: 0.8,
            found_threshold_meters: 2.0,
            tiers: TierThresholds::default(),
            sound: "treasure.mp3".to_owned(),
            feed: FeedOptions::default(),
        }
    }
}

/// Upper bounds (exclusive, in steps) of each hint tier
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub very_hot_below: f64,
    pub hot_below: f64,
    pub warm_below: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            very_hot_below: 10.0,
            hot_below: 25.0,
            warm_below: 50.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedOptions {
    /// Live samples closer than this to the last forwarded one are suppressed
    pub distance_interval_meters: f64,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            distance_interval_meters: 1.0,
        }
    }
}

impl HuntConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: HuntConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.target.is_valid() {
            return Err(invalid("target", format!("{:?}", self.target)));
        }

        if !(self.stride_length_meters.is_finite() && self.stride_length_meters > 0.0) {
            return Err(invalid("stride_length_meters", self.stride_length_meters));
        }

        if !(self.found_threshold_meters.is_finite() && self.found_threshold_meters >= 0.0) {
            return Err(invalid("found_threshold_meters", self.found_threshold_meters));
        }

        let TierThresholds {
            very_hot_below,
            hot_below,
            warm_below,
        } = self.tiers;
        if !(very_hot_below > 0.0 && very_hot_below < hot_below && hot_below < warm_below)
            || !warm_below.is_finite()
        {
            return Err(invalid(
                "tiers",
                format!("{very_hot_below} / {hot_below} / {warm_below}"),
            ));
        }

        // Found has to be reachable only from inside the hottest tier
        let very_hot_radius = very_hot_below * self.stride_length_meters;
        if self.found_threshold_meters >= very_hot_radius {
            return Err(invalid(
                "found_threshold_meters",
                format!("{} >= {very_hot_radius}", self.found_threshold_meters),
            ));
        }

        if self.sound.trim().is_empty() {
            return Err(invalid("sound", "<empty>"));
        }

        let interval = self.feed.distance_interval_meters;
        if !(interval.is_finite() && interval >= 0.0) {
            return Err(invalid("feed.distance_interval_meters", interval));
        }

        Ok(())
    }
}

fn invalid(parameter: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        parameter,
        value: value.to_string(),
    }
}
