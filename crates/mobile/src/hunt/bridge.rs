//! Foreign implementations of the platform capabilities.

use std::sync::Arc;

use treasure_hunt_core::sound::{SoundError, SoundPlayer, SoundSource};

use crate::hunt::view::HuntView;

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum BackendError {
    #[error("{message}")]
    Failed { message: String },
}

impl From<uniffi::UnexpectedUniFFICallbackError> for BackendError {
    fn from(error: uniffi::UnexpectedUniFFICallbackError) -> Self {
        BackendError::Failed {
            message: error.reason,
        }
    }
}

/// Platform audio player.
///
/// `load` receives a bundled asset name, a local path or a remote URI and
/// returns an opaque handle for the loaded sound.
#[uniffi::export(with_foreign)]
pub trait SoundBackend: Send + Sync {
    fn load(&self, uri: String) -> Result<u64, BackendError>;
    fn play(&self, handle: u64) -> Result<(), BackendError>;
    fn release(&self, handle: u64);
}

#[uniffi::export(with_foreign)]
pub trait HuntListener: Send + Sync {
    fn on_update(&self, view: HuntView);
}

pub(crate) struct ForeignSoundPlayer {
    backend: Arc<dyn SoundBackend>,
}

impl ForeignSoundPlayer {
    pub(crate) fn new(backend: Arc<dyn SoundBackend>) -> Self {
        Self { backend }
    }
}

impl SoundPlayer for ForeignSoundPlayer {
    type Sound = u64;

    fn load(&mut self, source: &SoundSource) -> Result<u64, SoundError> {
        self.backend
            .load(source.to_string())
            .map_err(|error| SoundError::Load(error.to_string()))
    }

    fn play(&mut self, sound: &u64) -> Result<(), SoundError> {
        self.backend
            .play(*sound)
            .map_err(|error| SoundError::Playback(error.to_string()))
    }

    fn release(&mut self, sound: u64) {
        self.backend.release(sound);
    }
}
