use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ClipError, ClipResult};
use crate::permission::MicrophonePermission;

/// Which control layout is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewState {
    #[default]
    Idle,
    Recording,
    Review,
}

impl ViewState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Review => "reviewing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    PermissionDenied,
    EngineFailure,
}

/// Error surfaced to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// Everything the component tracks while mounted
#[derive(Debug, Clone)]
pub struct SessionState {
    pub current_time_secs: u64,
    pub is_recording: bool,
    pub has_stopped_once: bool,
    pub recording_finished: bool,
    pub audio_path: PathBuf,
    pub permission: MicrophonePermission,
    pub view: ViewState,
    pub is_playback_paused: bool,
    pub playback_total: Duration,
    pub playback_position: Duration,
    pub notice: Option<Notice>,
    /// Take counter; 0 until the first recording starts
    pub take: u64,
    finish_reported: bool,
}

impl SessionState {
    pub fn new(audio_path: PathBuf) -> Self {
        Self {
            current_time_secs: 0,
            is_recording: false,
            has_stopped_once: false,
            recording_finished: false,
            audio_path,
            permission: MicrophonePermission::Unknown,
            view: ViewState::Idle,
            is_playback_paused: true,
            playback_total: Duration::ZERO,
            playback_position: Duration::ZERO,
            notice: None,
            take: 0,
            finish_reported: false,
        }
    }

    /// Whether a new take may start from here
    pub fn check_record(&self) -> ClipResult<()> {
        if self.is_recording {
            return Err(ClipError::InvalidTransition {
                action: "record",
                state: self.view.label(),
            });
        }
        match self.permission {
            MicrophonePermission::Unknown => return Err(ClipError::PermissionUnresolved),
            MicrophonePermission::Denied => return Err(ClipError::PermissionDenied),
            MicrophonePermission::Granted => {}
        }
        if self.view != ViewState::Idle {
            return Err(ClipError::InvalidTransition {
                action: "record",
                state: self.view.label(),
            });
        }
        Ok(())
    }

    /// Recording -> enter the Recording view with fresh counters
    ///
    /// Playback must already be stopped by the caller.
    pub fn begin_take(&mut self) {
        self.take += 1;
        self.is_recording = true;
        self.current_time_secs = 0;
        self.recording_finished = false;
        self.finish_reported = false;
        self.is_playback_paused = true;
        self.playback_total = Duration::ZERO;
        self.playback_position = Duration::ZERO;
        self.view = ViewState::Recording;
    }

    /// Stop or pause accepted -> Review
    pub fn end_take(&mut self) {
        self.is_recording = false;
        self.has_stopped_once = true;
        self.view = ViewState::Review;
    }

    /// Floor an engine progress report to whole seconds; never goes backwards
    ///
    /// Reports still queued when the take is stopped count until its
    /// completion has been reported.
    pub fn apply_progress(&mut self, elapsed: Duration) {
        if self.take == 0 || self.finish_reported {
            return;
        }
        self.current_time_secs = self.current_time_secs.max(elapsed.as_secs());
    }

    /// Record the outcome of the current take
    ///
    /// Returns false if this take already reported completion.
    pub fn finish_take(&mut self, succeeded: bool) -> bool {
        if self.finish_reported {
            return false;
        }
        self.finish_reported = true;
        self.recording_finished = succeeded;
        true
    }

    pub fn begin_playback(&mut self) {
        self.is_playback_paused = false;
        self.playback_total = Duration::ZERO;
        self.playback_position = Duration::ZERO;
    }

    pub fn set_playback_total(&mut self, total: Duration) {
        self.playback_total = total;
        self.playback_position = self.playback_position.min(total);
    }

    pub fn set_playback_position(&mut self, position: Duration) {
        self.playback_position = position.min(self.playback_total);
    }

    /// Fraction of the clip played; 0 while the duration is unknown
    pub fn playback_progress(&self) -> f64 {
        if self.playback_total.is_zero() {
            return 0.0;
        }
        (self.playback_position.as_secs_f64() / self.playback_total.as_secs_f64()).clamp(0.0, 1.0)
    }

    pub fn set_notice(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.notice = Some(Notice {
            kind,
            message: message.into(),
        });
    }
}
