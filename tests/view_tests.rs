// Tests for the layout chosen in each view state

use chrono::Utc;
use clip_recorder::session::{Notice, NoticeKind, SessionState};
use clip_recorder::view::{layout, Control};
use clip_recorder::{Action, MicrophonePermission, SessionSnapshot, ViewState};
use std::path::PathBuf;
use std::time::Duration;

fn snapshot(view: ViewState) -> SessionSnapshot {
    SessionSnapshot {
        session_id: "clip-test".to_string(),
        mounted_at: Utc::now(),
        view,
        permission: MicrophonePermission::Granted,
        current_time_secs: 0,
        is_recording: view == ViewState::Recording,
        has_stopped_once: false,
        recording_finished: false,
        audio_path: PathBuf::from("test.aac"),
        is_playback_paused: true,
        playback_total_secs: 0.0,
        playback_position_secs: 0.0,
        playback_progress: 0.0,
        notice: None,
        take: 0,
    }
}

#[test]
fn test_idle_layout() {
    let layout = layout(&snapshot(ViewState::Idle));

    assert_eq!(layout.actions(), vec![Action::Record]);
    assert!(layout.to_string().contains("Tap to Start Recording"));
}

#[test]
fn test_recording_layout_shows_elapsed() {
    let mut snap = snapshot(ViewState::Recording);
    snap.current_time_secs = 3;

    let layout = layout(&snap);

    assert_eq!(
        layout.top,
        vec![Control::RecordingIndicator {
            label: "Recording - 3s".to_string()
        }]
    );
    assert_eq!(layout.actions(), vec![Action::Stop]);
}

#[test]
fn test_review_layout_when_not_playing() {
    let layout = layout(&snapshot(ViewState::Review));

    assert_eq!(
        layout.actions(),
        vec![Action::Listen, Action::Cancel, Action::Save]
    );
    let text = layout.to_string();
    assert!(text.contains("Listen"));
    assert!(text.contains("Tap to save recording"));
}

#[test]
fn test_review_layout_while_playing_shows_progress() {
    let mut snap = snapshot(ViewState::Review);
    snap.is_playback_paused = false;
    snap.playback_progress = 0.5;

    let layout = layout(&snap);

    match &layout.top[0] {
        Control::ProgressBar {
            label,
            progress,
            action,
        } => {
            assert_eq!(label, "Stop Listening");
            assert_eq!(*progress, 0.5);
            assert_eq!(*action, Action::StopListening);
        }
        other => panic!("expected progress bar, got {:?}", other),
    }
    assert!(layout.to_string().contains("(50%)"));
}

#[test]
fn test_notice_becomes_banner() {
    let mut snap = snapshot(ViewState::Idle);
    snap.notice = Some(Notice {
        kind: NoticeKind::PermissionDenied,
        message: "Microphone access was not granted".to_string(),
    });

    let layout = layout(&snap);

    assert_eq!(layout.banner.as_ref().unwrap().kind, NoticeKind::PermissionDenied);
    assert!(layout.to_string().starts_with("! Microphone access was not granted"));
}

#[test]
fn test_progress_ratio_without_duration_is_zero() {
    let mut state = SessionState::new(PathBuf::from("test.aac"));
    state.begin_playback();
    state.set_playback_position(Duration::from_millis(300));

    assert_eq!(state.playback_total, Duration::ZERO);
    assert_eq!(state.playback_position, Duration::ZERO);
    assert_eq!(state.playback_progress(), 0.0);

    state.set_playback_total(Duration::from_secs(2));
    state.set_playback_position(Duration::from_millis(500));
    assert_eq!(state.playback_progress(), 0.25);
}
