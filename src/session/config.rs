use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::audio::RecordingOptions;
use crate::config::Config;
use crate::permission::Rationale;

/// Configuration for a mounted clip session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier for log correlation
    pub session_id: String,

    /// Output file, overwritten by every take
    pub audio_path: PathBuf,

    /// Encoder options passed to the recording engine
    pub options: RecordingOptions,

    /// How often playback position is sampled
    /// Default: 100ms
    pub poll_interval: Duration,

    /// Text shown with the microphone consent prompt
    pub rationale: Rationale,
}

impl SessionConfig {
    pub fn new(audio_path: PathBuf) -> Self {
        Self {
            audio_path,
            ..Self::default()
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self {
            audio_path: cfg.audio_path(),
            poll_interval: Duration::from_millis(cfg.playback.poll_interval_ms),
            rationale: Rationale::for_app(&cfg.app.name),
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("clip-{}", uuid::Uuid::new_v4()),
            audio_path: PathBuf::from("test.aac"),
            options: RecordingOptions::voice_memo(),
            poll_interval: Duration::from_millis(100),
            rationale: Rationale::for_app("ClipRecorder"),
        }
    }
}
