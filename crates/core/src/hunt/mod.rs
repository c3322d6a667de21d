//! The hunt itself: classify proximity, point the arrow, decide when it ends.

pub mod heading;
pub mod proximity;
pub mod snapshot;
pub mod state;

pub use proximity::{ColorTier, HintTier, ProximityState};
pub use snapshot::HuntSnapshot;
pub use state::{Advance, HuntEffect, HuntState, HuntStatus, advance};
