use super::config::SessionConfig;
use super::snapshot::SessionSnapshot;
use super::state::{NoticeKind, SessionState, ViewState};
use crate::audio::{
    PlaybackEngine, PlaybackEvent, RecorderEvent, RecorderPhase, RecordingEngine, StopOutcome,
};
use crate::error::{ClipError, ClipResult};
use crate::permission::{MicrophonePermission, PermissionGate, PermissionProvider};
use crate::view::{self, Action, Layout};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Upper bound on waiting for queued recorder events after a stop
const DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Notifications for whoever hosts the component
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Exactly one per take, however the engine reported completion
    RecordingFinished { succeeded: bool, path: PathBuf },
    /// Playback ran to its end or failed while decoding
    PlaybackFinished { success: bool },
}

#[derive(Debug, Clone, Copy)]
enum StopKind {
    Stop,
    Pause,
}

impl StopKind {
    fn action(self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Pause => "pause",
        }
    }
}

/// Clears the busy flag when an action returns
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The record / review / save component
pub struct ClipSession {
    /// Session configuration
    config: SessionConfig,

    /// When the session was mounted
    mounted_at: DateTime<Utc>,

    /// Component state, shared with the background tasks
    state: Arc<Mutex<SessionState>>,

    recorder: Arc<Mutex<Box<dyn RecordingEngine>>>,

    player: Arc<Mutex<Box<dyn PlaybackEngine>>>,

    /// Set while a control action is running
    busy: AtomicBool,

    /// Handle for the task consuming recorder events of the latest take
    recorder_task: Mutex<Option<JoinHandle<()>>>,

    /// Handle for the playback polling task
    poll_task: Mutex<Option<JoinHandle<()>>>,

    events_tx: broadcast::Sender<SessionEvent>,
}

impl ClipSession {
    /// Mount a session: resolve microphone permission and prepare the first take
    pub async fn mount(
        config: SessionConfig,
        recorder: Box<dyn RecordingEngine>,
        player: Box<dyn PlaybackEngine>,
        permissions: Arc<dyn PermissionProvider>,
    ) -> Self {
        info!(
            "Mounting clip session: {} (recorder: {}, player: {})",
            config.session_id,
            recorder.name(),
            player.name()
        );

        let (events_tx, _) = broadcast::channel(16);
        let gate = PermissionGate::new(permissions, config.rationale.clone());

        let session = Self {
            state: Arc::new(Mutex::new(SessionState::new(config.audio_path.clone()))),
            config,
            mounted_at: Utc::now(),
            recorder: Arc::new(Mutex::new(recorder)),
            player: Arc::new(Mutex::new(player)),
            busy: AtomicBool::new(false),
            recorder_task: Mutex::new(None),
            poll_task: Mutex::new(None),
            events_tx,
        };

        let permission = match gate.request_microphone().await {
            Ok(granted) => MicrophonePermission::from(granted),
            Err(e) => {
                error!("Permission request failed: {:#}", e);
                MicrophonePermission::Denied
            }
        };

        {
            let mut state = session.state.lock().await;
            state.permission = permission;
            if permission == MicrophonePermission::Denied {
                state.set_notice(
                    NoticeKind::PermissionDenied,
                    "Microphone access was not granted",
                );
            }
        }

        if permission == MicrophonePermission::Granted {
            let mut recorder = session.recorder.lock().await;
            if let Err(e) = recorder
                .prepare(&session.config.audio_path, &session.config.options)
                .await
            {
                drop(recorder);
                let _ = session.engine_failure("recorder", e).await;
            }
        }

        session
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Subscribe to recording/playback completion events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        SessionSnapshot::capture(&self.config.session_id, self.mounted_at, &state)
    }

    /// Controls to show for the current state
    pub async fn layout(&self) -> Layout {
        view::layout(&self.snapshot().await)
    }

    /// Route a tapped control to its operation
    pub async fn dispatch(&self, action: Action) -> ClipResult<()> {
        debug!("Dispatching {:?}", action);
        match action {
            Action::Record => self.record().await,
            Action::Stop => self.stop().await,
            Action::Listen => self.play().await,
            Action::StopListening => self.stop_playback().await,
            Action::Cancel => self.cancel().await,
            Action::Save => self.save().await,
        }
    }

    /// Start a new take
    pub async fn record(&self) -> ClipResult<()> {
        let _busy = self.acquire("record")?;

        let playing = {
            let mut state = self.state.lock().await;
            if let Err(e) = state.check_record() {
                warn!("Ignoring record: {}", e);
                if matches!(e, ClipError::PermissionDenied) {
                    state.set_notice(
                        NoticeKind::PermissionDenied,
                        "Microphone access is needed to record",
                    );
                }
                return Err(e);
            }
            !state.is_playback_paused
        };

        // Recording and playback never overlap
        self.cancel_polling().await;
        if playing {
            info!("Stopping playback before recording");
            self.halt_playback().await?;
        }

        let events = {
            let mut recorder = self.recorder.lock().await;

            // A prepared path only covers one take
            if recorder.phase() != RecorderPhase::Preparing {
                if let Err(e) = recorder
                    .prepare(&self.config.audio_path, &self.config.options)
                    .await
                {
                    drop(recorder);
                    return Err(self.engine_failure("recorder", e).await);
                }
            }

            match recorder.start().await {
                Ok(events) => events,
                Err(e) => {
                    drop(recorder);
                    return Err(self.engine_failure("recorder", e).await);
                }
            }
        };

        let take = {
            let mut state = self.state.lock().await;
            state.begin_take();
            state.notice = None;
            state.take
        };

        info!(
            "Recording take {} to {}",
            take,
            self.config.audio_path.display()
        );

        self.spawn_recorder_listener(take, events).await;

        Ok(())
    }

    /// Finish the current take and move to review
    pub async fn stop(&self) -> ClipResult<()> {
        let _busy = self.acquire("stop")?;
        self.end_recording(StopKind::Stop).await
    }

    /// Same as `stop`: the take is closed and can't be resumed
    pub async fn pause(&self) -> ClipResult<()> {
        let _busy = self.acquire("pause")?;
        self.end_recording(StopKind::Pause).await
    }

    /// Listen to the recorded clip, stopping any active recording first
    pub async fn play(&self) -> ClipResult<()> {
        let _busy = self.acquire("play")?;

        let recording = self.state.lock().await.is_recording;
        if recording {
            self.end_recording(StopKind::Stop).await?;
        }

        {
            let mut state = self.state.lock().await;
            if state.view != ViewState::Review {
                warn!("Can't play while {}", state.view.label());
                return Err(ClipError::InvalidTransition {
                    action: "play",
                    state: state.view.label(),
                });
            }
            state.begin_playback();
        }

        self.cancel_polling().await;

        let loaded = self.player.lock().await.load(&self.config.audio_path).await;
        let total = match loaded {
            Ok(total) => total,
            Err(e) => {
                error!("Failed to load the sound: {:#}", e);
                self.state.lock().await.is_playback_paused = true;
                return Err(self.engine_failure("player", e).await);
            }
        };

        self.state.lock().await.set_playback_total(total);

        let started = self.player.lock().await.play().await;
        let events = match started {
            Ok(events) => events,
            Err(e) => {
                self.state.lock().await.is_playback_paused = true;
                return Err(self.engine_failure("player", e).await);
            }
        };

        {
            let mut state = self.state.lock().await;
            state.notice = None;
        }

        info!("Playing {} ({:.1}s)", self.config.audio_path.display(), total.as_secs_f64());

        let task = tokio::spawn(Self::poll_playback(
            Arc::clone(&self.state),
            Arc::clone(&self.player),
            self.events_tx.clone(),
            events,
            self.config.poll_interval,
        ));
        *self.poll_task.lock().await = Some(task);

        Ok(())
    }

    /// Stop listening; the polling task exits on its next tick
    pub async fn stop_playback(&self) -> ClipResult<()> {
        let _busy = self.acquire("stop playback")?;
        self.halt_playback().await
    }

    /// Leave review keeping the file on disk
    pub async fn save(&self) -> ClipResult<()> {
        let _busy = self.acquire("save")?;

        let mut state = self.state.lock().await;
        if state.view != ViewState::Review {
            warn!("Can't save while {}", state.view.label());
            return Err(ClipError::InvalidTransition {
                action: "save",
                state: state.view.label(),
            });
        }
        state.view = ViewState::Idle;

        info!("Saved take {} at {}", state.take, state.audio_path.display());
        Ok(())
    }

    /// Leave review, stopping playback whether or not it is running
    pub async fn cancel(&self) -> ClipResult<()> {
        let _busy = self.acquire("cancel")?;

        {
            let state = self.state.lock().await;
            if state.view != ViewState::Review {
                warn!("Can't cancel while {}", state.view.label());
                return Err(ClipError::InvalidTransition {
                    action: "cancel",
                    state: state.view.label(),
                });
            }
        }

        let halted = self.halt_playback().await;
        self.state.lock().await.view = ViewState::Idle;

        info!("Review cancelled");
        halted
    }

    /// Tear the session down, stopping anything still running
    pub async fn unmount(self) {
        info!("Unmounting clip session: {}", self.config.session_id);

        self.cancel_polling().await;

        let recording = self.state.lock().await.is_recording;
        if recording {
            if let Err(e) = self.recorder.lock().await.stop().await {
                warn!("Failed to stop recorder on unmount: {:#}", e);
            }
        }

        if let Err(e) = self.player.lock().await.stop().await {
            warn!("Failed to stop player on unmount: {:#}", e);
        }

        if let Some(task) = self.recorder_task.lock().await.take() {
            task.abort();
        }
    }

    fn acquire(&self, action: &'static str) -> ClipResult<BusyGuard<'_>> {
        if self.busy.swap(true, Ordering::SeqCst) {
            warn!("Ignoring {}, another action is in progress", action);
            return Err(ClipError::Busy);
        }
        Ok(BusyGuard(&self.busy))
    }

    async fn end_recording(&self, kind: StopKind) -> ClipResult<()> {
        let take = {
            let mut state = self.state.lock().await;
            if !state.is_recording {
                warn!("Can't {}, not recording!", kind.action());
                return Err(ClipError::InvalidTransition {
                    action: kind.action(),
                    state: state.view.label(),
                });
            }
            state.end_take();
            state.take
        };

        let outcome = {
            let mut recorder = self.recorder.lock().await;
            match kind {
                StopKind::Stop => recorder.stop().await,
                StopKind::Pause => recorder.pause().await,
            }
        };

        match outcome {
            Ok(StopOutcome::Finished { path }) => {
                self.drain_recorder_events(take).await;
                Self::report_finished(&self.state, &self.events_tx, take, true, path).await;
            }
            Ok(StopOutcome::Pending) => {
                debug!("Take {} closed, completion will follow from the engine", take);
            }
            Err(e) => {
                Self::report_finished(
                    &self.state,
                    &self.events_tx,
                    take,
                    false,
                    self.config.audio_path.clone(),
                )
                .await;
                return Err(self.engine_failure("recorder", e).await);
            }
        }

        Ok(())
    }

    async fn halt_playback(&self) -> ClipResult<()> {
        self.state.lock().await.is_playback_paused = true;

        let stopped = self.player.lock().await.stop().await;
        if let Err(e) = stopped {
            return Err(self.engine_failure("player", e).await);
        }
        Ok(())
    }

    async fn cancel_polling(&self) {
        if let Some(task) = self.poll_task.lock().await.take() {
            task.abort();
        }
    }

    /// Let the listener apply progress the engine queued before it stopped
    async fn drain_recorder_events(&self, take: u64) {
        let mut slot = self.recorder_task.lock().await;
        let Some(task) = slot.as_mut() else {
            return;
        };
        match tokio::time::timeout(DRAIN_TIMEOUT, task).await {
            Ok(_) => {
                slot.take();
            }
            Err(_) => debug!("Recorder events for take {} still open, reporting anyway", take),
        }
    }

    async fn spawn_recorder_listener(&self, take: u64, mut events: mpsc::Receiver<RecorderEvent>) {
        let state = Arc::clone(&self.state);
        let events_tx = self.events_tx.clone();

        let task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    RecorderEvent::Progress { elapsed } => {
                        let mut state = state.lock().await;
                        if state.take == take {
                            state.apply_progress(elapsed);
                        }
                    }
                    RecorderEvent::Finished { succeeded, path } => {
                        Self::report_finished(&state, &events_tx, take, succeeded, path).await;
                    }
                }
            }
            debug!("Recorder events for take {} closed", take);
        });

        // The previous listener ends on its own once its engine channel closes
        *self.recorder_task.lock().await = Some(task);
    }

    async fn report_finished(
        state: &Mutex<SessionState>,
        events_tx: &broadcast::Sender<SessionEvent>,
        take: u64,
        succeeded: bool,
        path: PathBuf,
    ) {
        {
            let mut state = state.lock().await;
            if state.take != take || !state.finish_take(succeeded) {
                debug!("Ignoring repeated completion for take {}", take);
                return;
            }
            info!(
                "Finished recording of duration {} seconds at path: {} (succeeded={})",
                state.current_time_secs,
                path.display(),
                succeeded
            );
        }

        let _ = events_tx.send(SessionEvent::RecordingFinished { succeeded, path });
    }

    async fn poll_playback(
        state: Arc<Mutex<SessionState>>,
        player: Arc<Mutex<Box<dyn PlaybackEngine>>>,
        events_tx: broadcast::Sender<SessionEvent>,
        mut events: mpsc::Receiver<PlaybackEvent>,
        interval: Duration,
    ) {
        let mut ticker = tokio::time::interval(interval);
        let mut events_open = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if state.lock().await.is_playback_paused {
                        debug!("Playback idle, polling stopped");
                        break;
                    }

                    let position = player.lock().await.position().await;
                    match position {
                        Ok(position) => state.lock().await.set_playback_position(position),
                        Err(e) => warn!("Failed to read playback position: {:#}", e),
                    }
                }
                event = events.recv(), if events_open => match event {
                    Some(PlaybackEvent::Finished { success }) => {
                        if success {
                            info!("Successfully finished playing");
                        } else {
                            warn!("Playback failed due to audio decoding errors");
                        }
                        state.lock().await.is_playback_paused = true;
                        let _ = events_tx.send(SessionEvent::PlaybackFinished { success });
                    }
                    None => {
                        events_open = false;
                    }
                },
            }
        }
    }

    async fn engine_failure(&self, engine: &'static str, err: anyhow::Error) -> ClipError {
        error!("{} engine failure: {:#}", engine, err);
        self.state
            .lock()
            .await
            .set_notice(NoticeKind::EngineFailure, format!("{:#}", err));
        ClipError::engine(engine, err)
    }
}

impl Drop for ClipSession {
    fn drop(&mut self) {
        if let Some(task) = self.poll_task.get_mut().take() {
            task.abort();
        }
        if let Some(task) = self.recorder_task.get_mut().take() {
            task.abort();
        }
    }
}
