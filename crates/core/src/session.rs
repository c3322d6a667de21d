//! Runs a hunt against a live feed.
//!
//! A single consumer task applies feed events one at a time and publishes a
//! [`HuntSnapshot`] after each. The completion sound is handed to a separate
//! worker so playback never holds up the next sample. Everything the session
//! acquires (subscription, loaded sound) is released by [`RunningHunt::stop`]
//! or when the [`RunningHunt`] is dropped.

use std::path::PathBuf;

use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};

use crate::{
    config::{ConfigError, HuntConfig},
    feed::{FeedError, FeedEvent, FeedSink, Gate, PermissionGate, PositionFeed, Subscription},
    hunt::{
        Advance, HuntEffect, HuntSnapshot, HuntState, advance,
        snapshot::PERMISSION_DENIED_NOTICE,
    },
    sound::{SoundPlayer, SoundResolver, SoundSlot, SoundSource},
};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Could not check location permission: {0}")]
    PermissionCheck(String),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Session task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Why the consumer stopped taking events
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    Stopped,
    /// The feed finished on its own (e.g. a simulated walk ran out)
    FeedEnded,
    PermissionRevoked,
}

#[derive(Clone, Debug)]
pub struct HuntReport {
    pub state: HuntState,
    pub snapshot: HuntSnapshot,
    pub end: SessionEnd,
}

pub struct HuntSession {
    config: HuntConfig,
    sound: SoundSource,
    resolver: SoundResolver,
}

impl HuntSession {
    pub fn new(config: HuntConfig) -> Result<Self> {
        config.validate()?;
        let sound = config.sound.parse().map_err(|_| ConfigError::Invalid {
            parameter: "sound",
            value: config.sound.clone(),
        })?;

        Ok(Self {
            config,
            sound,
            resolver: SoundResolver::new(None),
        })
    }

    /// Download remote sounds into `dir` before playing them
    pub fn with_sound_cache(mut self, dir: PathBuf) -> Self {
        self.resolver = SoundResolver::new(Some(dir));
        self
    }

    pub fn config(&self) -> &HuntConfig {
        &self.config
    }

    /// Ask for permission, start the feed and begin consuming samples.
    pub async fn start<F, P>(
        &self,
        permission: &dyn PermissionGate,
        mut feed: F,
        player: P,
    ) -> Result<RunningHunt>
    where
        F: PositionFeed,
        P: SoundPlayer,
    {
        match permission.request().await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("location permission denied");
                return Err(SessionError::PermissionDenied);
            }
            Err(message) => {
                tracing::warn!(%message, "location permission check failed");
                return Err(SessionError::PermissionCheck(message));
            }
        }

        let (sink, events) = FeedSink::channel();
        let gate = sink.gate();
        let subscription = feed.start(sink)?;

        let (sound_tx, sound_rx) = mpsc::unbounded_channel();
        let (sound_stop_tx, sound_stop_rx) = oneshot::channel();
        let sound = tokio::spawn(run_sound_worker(
            SoundSlot::new(player),
            self.resolver.clone(),
            self.sound.clone(),
            sound_rx,
            sound_stop_rx,
        ));

        let (snapshot_tx, snapshots) = watch::channel(HuntSnapshot::default());
        let (stop_tx, stop_rx) = oneshot::channel();
        let consumer = Consumer {
            config: self.config.clone(),
            state: HuntState::new(),
            notice: None,
            gate,
            snapshots: snapshot_tx,
            sound: sound_tx,
        };
        let consumer = tokio::spawn(consumer.run(events, stop_rx));

        tracing::info!(
            target_latitude = self.config.target.latitude,
            target_longitude = self.config.target.longitude,
            "hunt started"
        );

        Ok(RunningHunt {
            subscription,
            stop: stop_tx,
            consumer,
            sound,
            sound_stop: sound_stop_tx,
            snapshots,
        })
    }
}

/// A started hunt. Dropping it tears the session down without waiting.
pub struct RunningHunt {
    subscription: Subscription,
    stop: oneshot::Sender<()>,
    consumer: JoinHandle<HuntReport>,
    sound: JoinHandle<()>,
    /// Interrupts a pending sound download
    sound_stop: oneshot::Sender<()>,
    snapshots: watch::Receiver<HuntSnapshot>,
}

impl RunningHunt {
    pub fn snapshots(&self) -> watch::Receiver<HuntSnapshot> {
        self.snapshots.clone()
    }

    pub fn snapshot(&self) -> HuntSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Stop the feed and wait for the session to wind down.
    ///
    /// Once this returns no further event will be applied and the completion
    /// sound, if it was ever loaded, has been released.
    pub async fn stop(self) -> Result<HuntReport> {
        let RunningHunt {
            subscription,
            stop,
            consumer,
            sound,
            sound_stop,
            ..
        } = self;

        subscription.stop();
        let _ = stop.send(());
        let _ = sound_stop.send(());

        let report = consumer.await?;
        sound.await?;

        tracing::info!(
            found = report.state.is_found(),
            samples = report.state.samples_accepted,
            end = ?report.end,
            "hunt stopped"
        );
        Ok(report)
    }
}

enum Flow {
    Continue,
    Halt,
}

struct Consumer {
    config: HuntConfig,
    state: HuntState,
    notice: Option<String>,
    gate: Gate,
    snapshots: watch::Sender<HuntSnapshot>,
    sound: mpsc::UnboundedSender<HuntEffect>,
}

impl Consumer {
    async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<FeedEvent>,
        mut stop: oneshot::Receiver<()>,
    ) -> HuntReport {
        let end = loop {
            tokio::select! {
                biased;

                _ = &mut stop => break SessionEnd::Stopped,

                event = events.recv() => {
                    let Some(event) = event else {
                        tracing::debug!("position feed ended");
                        break SessionEnd::FeedEnded;
                    };

                    if !self.gate.is_open() {
                        break SessionEnd::Stopped;
                    }

                    if let Flow::Halt = self.apply(event) {
                        break SessionEnd::PermissionRevoked;
                    }
                }
            }
        };

        events.close();

        // Resources stay alive until the session itself is torn down
        if end != SessionEnd::Stopped {
            let _ = stop.await;
        }

        HuntReport {
            state: self.state,
            snapshot: self.snapshots.borrow().clone(),
            end,
        }
    }

    fn apply(&mut self, event: FeedEvent) -> Flow {
        match event {
            FeedEvent::Sample(sample) => {
                if !sample.coordinate.is_valid() {
                    tracing::warn!(?sample, "ignoring sample with invalid coordinate");
                    return Flow::Continue;
                }

                let Advance { state, effect } = advance(&self.state, &sample, &self.config);
                self.state = state;
                self.notice = None;

                let proximity = &state.proximity;
                tracing::debug!(
                    distance_m = proximity.distance_meters,
                    steps = proximity.step_count,
                    tier = %proximity.hint_tier,
                    rotation = proximity.rotation_degrees,
                    "sample applied"
                );

                if let Some(effect) = effect {
                    tracing::info!(distance_m = proximity.distance_meters, "treasure found");
                    if self.sound.send(effect).is_err() {
                        tracing::warn!("sound worker gone, skipping completion sound");
                    }
                }

                self.publish();
                Flow::Continue
            }

            FeedEvent::Error(error) => {
                tracing::warn!(%error, "position feed error");
                self.notice = Some(error.to_string());
                self.publish();
                Flow::Continue
            }

            FeedEvent::PermissionDenied => {
                tracing::warn!("location permission revoked");
                self.notice = Some(PERMISSION_DENIED_NOTICE.to_owned());
                self.publish();
                Flow::Halt
            }
        }
    }

    fn publish(&self) {
        let mut snapshot = HuntSnapshot::from_state(&self.state);
        snapshot.notice = self.notice.clone();
        self.snapshots.send_replace(snapshot);
    }
}

async fn run_sound_worker<P: SoundPlayer>(
    mut slot: SoundSlot<P>,
    resolver: SoundResolver,
    source: SoundSource,
    mut effects: mpsc::UnboundedReceiver<HuntEffect>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut resolved: Option<SoundSource> = None;

    while let Some(effect) = effects.recv().await {
        match effect {
            HuntEffect::PlayFoundSound => {
                let source = match &resolved {
                    Some(source) => source.clone(),
                    None => {
                        let source = tokio::select! {
                            biased;

                            source = resolver.resolve(&source) => source,
                            _ = &mut shutdown => {
                                tracing::debug!("session ended while fetching sound");
                                return;
                            }
                        };
                        resolved = Some(source.clone());
                        source
                    }
                };

                if let Err(error) = slot.play(&source) {
                    tracing::warn!(%error, %source, "completion sound failed");
                }
            }
        }
    }
}
