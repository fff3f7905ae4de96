//! Clip session management
//!
//! This module provides the `ClipSession` component that manages:
//! - Microphone permission resolution at mount
//! - Recording control (prepare/start/stop/pause) over a recording engine
//! - Playback control with position polling over a playback engine
//! - The Idle -> Recording -> Review view flow

mod config;
mod session;
mod snapshot;
mod state;

pub use config::SessionConfig;
pub use session::{ClipSession, SessionEvent};
pub use snapshot::SessionSnapshot;
pub use state::{Notice, NoticeKind, SessionState, ViewState};
