//! Proximity engine for a single-target treasure hunt.
//!
//! Position samples go in, a [`HuntSnapshot`] comes out: how many strides
//! away the treasure is, how warm the hint is, and which way to point.
//!
//! ```
//! use treasure_hunt_core::{HuntConfig, HuntState, PositionSample, advance};
//!
//! let config = HuntConfig::default();
//! let sample = PositionSample::new(config.target, 0);
//!
//! let next = advance(&HuntState::new(), &sample, &config);
//! assert!(next.state.is_found());
//! assert!(next.effect.is_some());
//! ```

pub mod config;
pub mod feed;
pub mod geodesy;
pub mod hunt;
pub mod session;
pub mod sound;

pub use config::{ConfigError, HuntConfig};
pub use feed::{FeedError, PositionFeed, PositionSample};
pub use geodesy::Coordinate;
pub use hunt::{HintTier, HuntSnapshot, HuntState, advance};
pub use session::{HuntReport, HuntSession, RunningHunt, SessionError};
