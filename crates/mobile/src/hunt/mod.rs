use std::{
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{
    runtime::Runtime,
    sync::{mpsc, watch},
    task::JoinHandle,
};
use treasure_hunt_core::{
    FeedError, HuntConfig, HuntSession, HuntSnapshot, PositionSample, RunningHunt, SessionError,
    feed::{
        Granted,
        live::{Delivery, LiveFeed, LiveFeedHandle},
        simulated::SimulatedWalk,
    },
};

pub mod bridge;
pub mod view;

pub use bridge::{HuntListener, SoundBackend};

use crate::hunt::{
    bridge::ForeignSoundPlayer,
    view::{HuntSummary, HuntView, PositionSource, PositionUpdate},
};

#[derive(Debug, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum HuntError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable: {0}")]
    Location(String),

    #[error("A hunt is already running")]
    AlreadyRunning,

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<SessionError> for HuntError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::PermissionDenied => HuntError::PermissionDenied,
            SessionError::PermissionCheck(message) => HuntError::Location(message),
            SessionError::Feed(error) => HuntError::Location(error.to_string()),
            SessionError::Config(error) => HuntError::Config(error.to_string()),
            SessionError::Task(error) => HuntError::Runtime(error.to_string()),
        }
    }
}

struct ActiveHunt {
    running: RunningHunt,
    /// Only set for device-driven hunts
    device: Option<LiveFeedHandle>,
    listener: JoinHandle<()>,
}

/// One treasure hunt screen.
///
/// Owns its own runtime so every method can be called from the UI thread.
/// Listener callbacks run on a dedicated thread, outside that runtime, so a
/// listener may call back into the hunt (e.g. `stop` once the treasure is
/// found).
#[derive(uniffi::Object)]
pub struct TreasureHunt {
    runtime: Runtime,
    session: HuntSession,
    active: Mutex<Option<ActiveHunt>>,
}

#[uniffi::export]
impl TreasureHunt {
    /// `config_json` overrides any subset of the defaults. With
    /// `sound_cache_dir` set, a remote completion sound is downloaded there
    /// before it is played.
    #[uniffi::constructor]
    pub fn new(
        config_json: Option<String>,
        sound_cache_dir: Option<String>,
    ) -> Result<Arc<Self>, HuntError> {
        let config = match config_json {
            Some(json) => {
                HuntConfig::from_json_str(&json).map_err(|e| HuntError::Config(e.to_string()))?
            }
            None => HuntConfig::default(),
        };

        let mut session = HuntSession::new(config)?;
        if let Some(dir) = sound_cache_dir {
            session = session.with_sound_cache(PathBuf::from(dir));
        }
        let runtime = Runtime::new().map_err(|e| HuntError::Runtime(e.to_string()))?;

        Ok(Arc::new(Self {
            runtime,
            session,
            active: Mutex::new(None),
        }))
    }

    pub fn start(
        &self,
        permission_granted: bool,
        source: PositionSource,
        sound: Arc<dyn SoundBackend>,
        listener: Arc<dyn HuntListener>,
    ) -> Result<(), HuntError> {
        let mut active = self.lock();
        if active.is_some() {
            return Err(HuntError::AlreadyRunning);
        }

        let permission = Granted(permission_granted);
        let player = ForeignSoundPlayer::new(sound);

        let (running, device) = match source {
            PositionSource::Device => {
                let (feed, handle) = LiveFeed::new(self.session.config().feed);
                let running = self
                    .runtime
                    .block_on(self.session.start(&permission, feed, player))?;
                (running, Some(handle))
            }
            PositionSource::Simulated {
                start,
                steps,
                interval_ms,
                jitter_meters,
            } => {
                if !jitter_meters.is_finite() || jitter_meters < 0.0 {
                    return Err(HuntError::Config(format!(
                        "simulated jitter must be a non-negative number, got {jitter_meters}"
                    )));
                }

                let walk = SimulatedWalk::new(start.into(), self.session.config().target)
                    .with_steps(steps)
                    .with_interval(Duration::from_millis(interval_ms))
                    .with_jitter(jitter_meters, None);
                let running = self
                    .runtime
                    .block_on(self.session.start(&permission, walk, player))?;
                (running, None)
            }
        };

        let views = spawn_listener_thread(listener)?;
        let listener = self
            .runtime
            .spawn(forward_snapshots(running.snapshots(), views));

        *active = Some(ActiveHunt {
            running,
            device,
            listener,
        });
        Ok(())
    }

    /// Feed a device fix into the running hunt.
    ///
    /// Returns false when the fix was not forwarded: no device hunt running,
    /// too close to the previous fix, or invalid.
    pub fn push_position(&self, update: PositionUpdate) -> bool {
        let active = self.lock();
        let Some(handle) = active.as_ref().and_then(|hunt| hunt.device.as_ref()) else {
            return false;
        };

        match handle.push(PositionSample::from(update)) {
            Ok(delivery) => delivery == Delivery::Forwarded,
            Err(error) => {
                tracing::warn!(%error, "dropping position update");
                false
            }
        }
    }

    pub fn report_location_error(&self, message: String) -> bool {
        self.with_device(|handle| handle.report_error(FeedError::ServiceFailure(message)))
    }

    /// The platform revoked location access mid-hunt
    pub fn report_permission_denied(&self) -> bool {
        self.with_device(LiveFeedHandle::report_permission_denied)
    }

    pub fn is_running(&self) -> bool {
        self.lock().is_some()
    }

    pub fn snapshot(&self) -> HuntView {
        match self.lock().as_ref() {
            Some(hunt) => HuntView::from(&hunt.running.snapshot()),
            None => HuntView::default(),
        }
    }

    /// End the hunt and release its resources. None if nothing was running.
    pub fn stop(&self) -> Option<HuntSummary> {
        let hunt = self.lock().take()?;
        hunt.listener.abort();

        match self.runtime.block_on(hunt.running.stop()) {
            Ok(report) => Some(HuntSummary::from(&report)),
            Err(error) => {
                tracing::warn!(%error, "hunt did not shut down cleanly");
                None
            }
        }
    }
}

impl TreasureHunt {
    fn lock(&self) -> MutexGuard<'_, Option<ActiveHunt>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_device(&self, report: impl FnOnce(&LiveFeedHandle) -> bool) -> bool {
        self.lock()
            .as_ref()
            .and_then(|hunt| hunt.device.as_ref())
            .is_some_and(report)
    }
}

/// Deliver views to the listener off the runtime. The thread exits once the
/// sending side is dropped.
fn spawn_listener_thread(
    listener: Arc<dyn HuntListener>,
) -> Result<mpsc::UnboundedSender<HuntView>, HuntError> {
    let (views_tx, mut views_rx) = mpsc::unbounded_channel::<HuntView>();

    std::thread::Builder::new()
        .name("hunt-listener".to_owned())
        .spawn(move || {
            while let Some(view) = views_rx.blocking_recv() {
                listener.on_update(view);
            }
        })
        .map_err(|e| HuntError::Runtime(e.to_string()))?;

    Ok(views_tx)
}

async fn forward_snapshots(
    mut snapshots: watch::Receiver<HuntSnapshot>,
    views: mpsc::UnboundedSender<HuntView>,
) {
    while snapshots.changed().await.is_ok() {
        let view = HuntView::from(&*snapshots.borrow_and_update());
        if views.send(view).is_err() {
            break;
        }
    }
}
