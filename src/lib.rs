pub mod audio;
pub mod config;
pub mod error;
pub mod permission;
pub mod session;
pub mod view;

pub use audio::{
    AudioFile, AudioFrame, CaptureConfig, CaptureSource, CompletionDelivery, FilePlaybackEngine,
    PlaybackEngine, PlaybackEvent, RecorderEvent, RecorderPhase, RecordingEngine,
    RecordingOptions, StopOutcome, ToneSource, WavRecordingEngine,
};
pub use config::Config;
pub use error::{ClipError, ClipResult};
pub use permission::{
    FixedPermission, ImplicitConsent, MicrophonePermission, PermissionGate, PermissionProvider,
    PermissionResponse, PermissionStatus, Rationale,
};
pub use session::{ClipSession, SessionConfig, SessionEvent, SessionSnapshot, ViewState};
pub use view::{Action, Control, Layout};
