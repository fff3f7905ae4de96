use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::state::{Notice, SessionState, ViewState};
use crate::permission::MicrophonePermission;

/// Point-in-time copy of a session, for rendering and reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,

    /// When the session was mounted
    pub mounted_at: DateTime<Utc>,

    pub view: ViewState,
    pub permission: MicrophonePermission,

    /// Elapsed recording time in whole seconds
    pub current_time_secs: u64,

    pub is_recording: bool,
    pub has_stopped_once: bool,
    pub recording_finished: bool,
    pub audio_path: PathBuf,

    pub is_playback_paused: bool,
    pub playback_total_secs: f64,
    pub playback_position_secs: f64,

    /// Playback position as a fraction of total (0.0 to 1.0)
    pub playback_progress: f64,

    pub notice: Option<Notice>,
    pub take: u64,
}

impl SessionSnapshot {
    pub(crate) fn capture(session_id: &str, mounted_at: DateTime<Utc>, state: &SessionState) -> Self {
        Self {
            session_id: session_id.to_string(),
            mounted_at,
            view: state.view,
            permission: state.permission,
            current_time_secs: state.current_time_secs,
            is_recording: state.is_recording,
            has_stopped_once: state.has_stopped_once,
            recording_finished: state.recording_finished,
            audio_path: state.audio_path.clone(),
            is_playback_paused: state.is_playback_paused,
            playback_total_secs: state.playback_total.as_secs_f64(),
            playback_position_secs: state.playback_position.as_secs_f64(),
            playback_progress: state.playback_progress(),
            notice: state.notice.clone(),
            take: state.take,
        }
    }
}
