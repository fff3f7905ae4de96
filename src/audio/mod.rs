pub mod backend;
pub mod capture;
pub mod file;
pub mod player;
pub mod recorder;

pub use backend::{
    AudioEncoding, AudioFrame, AudioQuality, CaptureConfig, CaptureSource, PlaybackEngine,
    PlaybackEvent, RecorderEvent, RecorderPhase, RecordingEngine, RecordingOptions, StopOutcome,
};
pub use capture::ToneSource;
pub use file::AudioFile;
pub use player::FilePlaybackEngine;
pub use recorder::{CompletionDelivery, WavRecordingEngine};
