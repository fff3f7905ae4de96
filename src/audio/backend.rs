use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Configuration for a capture source
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Sample rate the source must deliver
    pub sample_rate: u32,
    /// Channel count the source must deliver (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Buffer size in milliseconds (affects progress cadence)
    pub buffer_duration_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            channels: 1,
            buffer_duration_ms: 100,
        }
    }
}

impl CaptureConfig {
    pub fn for_options(options: &RecordingOptions, buffer_duration_ms: u64) -> Self {
        Self {
            sample_rate: options.sample_rate,
            channels: options.channels,
            buffer_duration_ms,
        }
    }

    /// Samples per buffer across all channels
    pub fn samples_per_buffer(&self) -> usize {
        (self.sample_rate as u64 * self.channels as u64 * self.buffer_duration_ms / 1000) as usize
    }
}

/// Microphone-like source of PCM frames
///
/// Implementations:
/// - `ToneSource`: synthetic sine/silence generator (desktop demo, tests)
/// - platform microphones live outside this crate
#[async_trait::async_trait]
pub trait CaptureSource: Send + Sync {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that will receive audio frames. The channel
    /// closes once the source is stopped.
    async fn start(&mut self, config: &CaptureConfig) -> Result<mpsc::Receiver<AudioFrame>>;

    /// Stop capturing audio
    async fn stop(&mut self) -> Result<()>;

    /// Check if source is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get source name for logging
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioEncoding {
    Aac,
    Pcm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioQuality {
    Low,
    Medium,
    High,
}

/// Options handed to a recording engine when preparing a take
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingOptions {
    pub sample_rate: u32,
    pub channels: u16,
    pub quality: AudioQuality,
    pub encoding: AudioEncoding,
    pub bit_rate: u32,
}

impl RecordingOptions {
    /// Fixed options used for every take: mono 22.05kHz AAC at 32kbps
    pub fn voice_memo() -> Self {
        Self {
            sample_rate: 22050,
            channels: 1,
            quality: AudioQuality::Low,
            encoding: AudioEncoding::Aac,
            bit_rate: 32000,
        }
    }
}

impl Default for RecordingOptions {
    fn default() -> Self {
        Self::voice_memo()
    }
}

/// Where a recording engine is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecorderPhase {
    Idle,
    Preparing,
    Recording,
    Stopped,
}

/// Notifications pushed by a recording engine while a take runs
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderEvent {
    /// Elapsed time of the current take
    Progress { elapsed: Duration },
    /// The take was closed; only sent by engines that deliver completion as an event
    Finished { succeeded: bool, path: PathBuf },
}

/// Result of stopping or pausing a take
#[derive(Debug, Clone, PartialEq)]
pub enum StopOutcome {
    /// The stop call itself carries the finished file
    Finished { path: PathBuf },
    /// Completion will arrive later as `RecorderEvent::Finished`
    Pending,
}

/// Recording engine trait
///
/// A prepared path is valid for one take: callers prepare again after every
/// stop or pause before the next start.
#[async_trait::async_trait]
pub trait RecordingEngine: Send + Sync {
    /// Configure the output file and encoder options for the next take
    async fn prepare(&mut self, path: &Path, options: &RecordingOptions) -> Result<()>;

    /// Start recording the prepared take
    ///
    /// Returns a channel receiver for progress (and possibly completion) events
    async fn start(&mut self) -> Result<mpsc::Receiver<RecorderEvent>>;

    /// Stop the current take
    async fn stop(&mut self) -> Result<StopOutcome>;

    /// Pause the current take
    async fn pause(&mut self) -> Result<StopOutcome>;

    fn phase(&self) -> RecorderPhase;

    /// Get engine name for logging
    fn name(&self) -> &str;
}

/// Notifications pushed by a playback engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Playback reached its end (`success = true`) or hit a decoding error
    Finished { success: bool },
}

/// Playback engine trait
#[async_trait::async_trait]
pub trait PlaybackEngine: Send + Sync {
    /// Load a file and wait until it is ready to play
    ///
    /// Returns the total duration once it can be trusted.
    async fn load(&mut self, path: &Path) -> Result<Duration>;

    /// Start playing the loaded file
    async fn play(&mut self) -> Result<mpsc::Receiver<PlaybackEvent>>;

    /// Stop playback
    async fn stop(&mut self) -> Result<()>;

    /// Current playback position
    async fn position(&self) -> Result<Duration>;

    /// Get engine name for logging
    fn name(&self) -> &str;
}
