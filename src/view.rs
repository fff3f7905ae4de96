//! Layouts for the three view states
//!
//! Only structure and labels live here; styling is up to the host.

use serde::Serialize;
use std::fmt;

use crate::session::{Notice, SessionSnapshot, ViewState};

/// What a control does when tapped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
    Record,
    Stop,
    Listen,
    StopListening,
    Cancel,
    Save,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Control {
    Button { label: String, action: Action },
    /// Red dot with the elapsed time
    RecordingIndicator { label: String },
    /// Playback progress, tappable to stop
    ProgressBar {
        label: String,
        progress: f64,
        action: Action,
    },
}

impl Control {
    fn button(label: &str, action: Action) -> Self {
        Self::Button {
            label: label.to_string(),
            action,
        }
    }

    pub fn action(&self) -> Option<Action> {
        match self {
            Self::Button { action, .. } | Self::ProgressBar { action, .. } => Some(*action),
            Self::RecordingIndicator { .. } => None,
        }
    }
}

/// Controls for one view, in two rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub view: ViewState,
    pub banner: Option<Notice>,
    pub top: Vec<Control>,
    pub bottom: Vec<Control>,
}

impl Layout {
    /// Actions reachable from this layout
    pub fn actions(&self) -> Vec<Action> {
        self.top
            .iter()
            .chain(&self.bottom)
            .filter_map(Control::action)
            .collect()
    }
}

pub fn layout(snapshot: &SessionSnapshot) -> Layout {
    let (top, bottom) = match snapshot.view {
        ViewState::Idle => (
            Vec::new(),
            vec![Control::button("Tap to Start Recording", Action::Record)],
        ),
        ViewState::Recording => (
            vec![Control::RecordingIndicator {
                label: format!("Recording - {}s", snapshot.current_time_secs),
            }],
            vec![Control::button("Tap to Stop Recording", Action::Stop)],
        ),
        ViewState::Review => {
            let listen = if snapshot.is_playback_paused {
                Control::button("Listen", Action::Listen)
            } else {
                Control::ProgressBar {
                    label: "Stop Listening".to_string(),
                    progress: snapshot.playback_progress,
                    action: Action::StopListening,
                }
            };
            (
                vec![listen, Control::button("Cancel", Action::Cancel)],
                vec![Control::button("Tap to save recording", Action::Save)],
            )
        }
    };

    Layout {
        view: snapshot.view,
        banner: snapshot.notice.clone(),
        top,
        bottom,
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Button { label, .. } => write!(f, "[ {} ]", label),
            Self::RecordingIndicator { label } => write!(f, "● {}", label),
            Self::ProgressBar {
                label, progress, ..
            } => {
                const WIDTH: usize = 20;
                let filled = (progress.clamp(0.0, 1.0) * WIDTH as f64).round() as usize;
                write!(
                    f,
                    "[{}{}] {} ({:.0}%)",
                    "#".repeat(filled),
                    "-".repeat(WIDTH - filled),
                    label,
                    progress * 100.0
                )
            }
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(notice) = &self.banner {
            writeln!(f, "! {}", notice.message)?;
        }
        for row in [&self.top, &self.bottom] {
            if row.is_empty() {
                continue;
            }
            let line: Vec<String> = row.iter().map(ToString::to_string).collect();
            writeln!(f, "{}", line.join("  "))?;
        }
        Ok(())
    }
}
