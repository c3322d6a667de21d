pub mod hunt;
mod logging;

pub use hunt::{
    HuntError, HuntListener, SoundBackend, TreasureHunt,
    bridge::BackendError,
    view::{GeoPoint, HintLevel, HuntEnd, HuntSummary, HuntView, PositionSource, PositionUpdate},
};

uniffi::setup_scaffolding!();

/// Route panics to the log, with a backtrace.
/// Call this once at startup from Kotlin/Swift
#[uniffi::export]
pub fn init_panic_handler() {
    std::panic::set_hook(Box::new(logging::panic_hook));
}

#[uniffi::export]
pub fn init_logging() {
    logging::setup_logging();
}
