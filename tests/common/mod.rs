// Scripted engines for session tests
//
// Each mock shares a probe with the test so it can count engine calls and
// push engine events by hand.

#![allow(dead_code)]

use anyhow::{bail, Result};
use clip_recorder::audio::{
    PlaybackEngine, PlaybackEvent, RecorderEvent, RecorderPhase, RecordingEngine,
    RecordingOptions, StopOutcome,
};
use clip_recorder::{
    ClipSession, CompletionDelivery, FixedPermission, ImplicitConsent, PermissionProvider,
    SessionConfig,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

#[derive(Default)]
pub struct RecorderProbe {
    pub prepares: AtomicUsize,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub pauses: AtomicUsize,
    pub fail_start: AtomicBool,
    /// When set, `start` waits for a notification before returning
    pub start_gate: Mutex<Option<Arc<Notify>>>,
    events: Mutex<Option<mpsc::Sender<RecorderEvent>>>,
}

impl RecorderProbe {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    /// Push a progress report as the engine would
    pub fn progress(&self, elapsed: Duration) {
        if let Some(tx) = self.events.lock().unwrap().as_ref() {
            tx.try_send(RecorderEvent::Progress { elapsed }).unwrap();
        }
    }
}

pub struct MockRecorder {
    probe: Arc<RecorderProbe>,
    delivery: CompletionDelivery,
    phase: RecorderPhase,
    path: Option<PathBuf>,
}

impl MockRecorder {
    pub fn new(delivery: CompletionDelivery) -> (Self, Arc<RecorderProbe>) {
        let probe = Arc::new(RecorderProbe::default());
        let recorder = Self {
            probe: Arc::clone(&probe),
            delivery,
            phase: RecorderPhase::Idle,
            path: None,
        };
        (recorder, probe)
    }

    fn close(&mut self) -> Result<StopOutcome> {
        if self.phase != RecorderPhase::Recording {
            bail!("Not recording");
        }
        self.phase = RecorderPhase::Stopped;
        let path = self.path.take().unwrap_or_default();
        let tx = self.probe.events.lock().unwrap().take();

        Ok(match self.delivery {
            CompletionDelivery::Event => {
                if let Some(tx) = tx {
                    tx.try_send(RecorderEvent::Finished {
                        succeeded: true,
                        path,
                    })
                    .unwrap();
                }
                StopOutcome::Pending
            }
            CompletionDelivery::Return => StopOutcome::Finished { path },
        })
    }
}

#[async_trait::async_trait]
impl RecordingEngine for MockRecorder {
    async fn prepare(&mut self, path: &Path, _options: &RecordingOptions) -> Result<()> {
        self.probe.prepares.fetch_add(1, Ordering::SeqCst);
        self.path = Some(path.to_path_buf());
        self.phase = RecorderPhase::Preparing;
        Ok(())
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<RecorderEvent>> {
        let gate = self.probe.start_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.probe.starts.fetch_add(1, Ordering::SeqCst);
        if self.probe.fail_start.load(Ordering::SeqCst) {
            bail!("microphone busy");
        }
        if self.phase != RecorderPhase::Preparing {
            bail!("Take must be prepared before starting");
        }

        let (tx, rx) = mpsc::channel(100);
        *self.probe.events.lock().unwrap() = Some(tx);
        self.phase = RecorderPhase::Recording;
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<StopOutcome> {
        self.probe.stops.fetch_add(1, Ordering::SeqCst);
        self.close()
    }

    async fn pause(&mut self) -> Result<StopOutcome> {
        self.probe.pauses.fetch_add(1, Ordering::SeqCst);
        self.close()
    }

    fn phase(&self) -> RecorderPhase {
        self.phase
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[derive(Default)]
pub struct PlayerProbe {
    pub loads: AtomicUsize,
    pub plays: AtomicUsize,
    pub stops: AtomicUsize,
    pub position_reads: AtomicUsize,
    pub fail_load: AtomicBool,
    pub position: Mutex<Duration>,
    events: Mutex<Option<mpsc::Sender<PlaybackEvent>>>,
}

impl PlayerProbe {
    pub fn set_position(&self, position: Duration) {
        *self.position.lock().unwrap() = position;
    }

    /// Report the end of playback as the engine would
    pub fn finish(&self, success: bool) {
        if let Some(tx) = self.events.lock().unwrap().take() {
            tx.try_send(PlaybackEvent::Finished { success }).unwrap();
        }
    }
}

pub struct MockPlayer {
    probe: Arc<PlayerProbe>,
    duration: Duration,
}

impl MockPlayer {
    pub fn new(duration: Duration) -> (Self, Arc<PlayerProbe>) {
        let probe = Arc::new(PlayerProbe::default());
        let player = Self {
            probe: Arc::clone(&probe),
            duration,
        };
        (player, probe)
    }
}

#[async_trait::async_trait]
impl PlaybackEngine for MockPlayer {
    async fn load(&mut self, path: &Path) -> Result<Duration> {
        self.probe.loads.fetch_add(1, Ordering::SeqCst);
        if self.probe.fail_load.load(Ordering::SeqCst) {
            bail!("failed to load {}", path.display());
        }
        self.probe.set_position(Duration::ZERO);
        Ok(self.duration)
    }

    async fn play(&mut self) -> Result<mpsc::Receiver<PlaybackEvent>> {
        self.probe.plays.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(4);
        *self.probe.events.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.probe.stops.fetch_add(1, Ordering::SeqCst);
        self.probe.events.lock().unwrap().take();
        Ok(())
    }

    async fn position(&self) -> Result<Duration> {
        self.probe.position_reads.fetch_add(1, Ordering::SeqCst);
        Ok(*self.probe.position.lock().unwrap())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub struct Harness {
    pub session: ClipSession,
    pub recorder: Arc<RecorderProbe>,
    pub player: Arc<PlayerProbe>,
}

pub fn test_config() -> SessionConfig {
    SessionConfig::new(PathBuf::from("/tmp/clip-tests/test.aac"))
}

pub async fn mount_with(
    delivery: CompletionDelivery,
    clip_length: Duration,
    permissions: Arc<dyn PermissionProvider>,
) -> Harness {
    let (recorder, recorder_probe) = MockRecorder::new(delivery);
    let (player, player_probe) = MockPlayer::new(clip_length);

    let session =
        ClipSession::mount(test_config(), Box::new(recorder), Box::new(player), permissions).await;

    Harness {
        session,
        recorder: recorder_probe,
        player: player_probe,
    }
}

pub async fn mount() -> Harness {
    mount_with(
        CompletionDelivery::Event,
        Duration::from_secs(2),
        Arc::new(ImplicitConsent),
    )
    .await
}

pub async fn mount_denied() -> Harness {
    mount_with(
        CompletionDelivery::Event,
        Duration::from_secs(2),
        Arc::new(FixedPermission::denied()),
    )
    .await
}

/// Let background tasks catch up (paused clock only advances once all tasks are idle)
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
