use anyhow::Result;
use clap::Parser;
use clip_recorder::{
    Action, ClipError, ClipSession, CompletionDelivery, Config, FilePlaybackEngine, FixedPermission,
    ImplicitConsent, PermissionProvider, SessionConfig, SessionEvent, ToneSource,
    WavRecordingEngine,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn, Level};

#[derive(Parser, Debug)]
#[command(name = "clip-recorder", about = "Record a short clip, review it, and save or discard it")]
struct Args {
    /// Configuration file (without extension)
    #[arg(long, default_value = "config/clip-recorder")]
    config: String,

    /// Seconds to record before stopping
    #[arg(long, default_value_t = 3)]
    record_secs: u64,

    /// Listen to the take before deciding
    #[arg(long)]
    listen: bool,

    /// Leave review with Cancel instead of Save (the file stays on disk)
    #[arg(long)]
    cancel: bool,

    /// Simulate a user refusing microphone access
    #[arg(long)]
    deny_mic: bool,

    /// Print session snapshots as JSON instead of rendered layouts
    #[arg(long)]
    json: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let cfg = Config::load(&args.config)?;
    info!("{} v0.1.0", cfg.app.name);
    info!("Output file: {}", cfg.audio_path().display());

    let permissions: Arc<dyn PermissionProvider> = if args.deny_mic {
        Arc::new(FixedPermission::denied())
    } else {
        Arc::new(ImplicitConsent)
    };

    let recorder = WavRecordingEngine::new(
        Box::new(ToneSource::new(cfg.capture.tone_hz)),
        CompletionDelivery::Event,
    )
    .with_buffer_duration_ms(cfg.capture.buffer_duration_ms);

    let session = ClipSession::mount(
        SessionConfig::from_config(&cfg),
        Box::new(recorder),
        Box::new(FilePlaybackEngine::new()),
        permissions,
    )
    .await;
    let mut events = session.subscribe();

    show(&session, args.json).await?;

    if let Err(e) = session.dispatch(Action::Record).await {
        report("Recording", &e);
        show(&session, args.json).await?;
        session.unmount().await;
        return Ok(());
    }

    for _ in 0..args.record_secs {
        tokio::time::sleep(Duration::from_secs(1)).await;
        show(&session, args.json).await?;
    }

    session.dispatch(Action::Stop).await?;
    if let Ok(SessionEvent::RecordingFinished { succeeded, path }) = events.recv().await {
        info!("Take finished (succeeded={}) at {}", succeeded, path.display());
    }
    show(&session, args.json).await?;

    if args.listen {
        match session.dispatch(Action::Listen).await {
            Ok(()) => {
                while !session.snapshot().await.is_playback_paused {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    show(&session, args.json).await?;
                }
            }
            Err(e) => report("Playback", &e),
        }
    }

    let decision = if args.cancel { Action::Cancel } else { Action::Save };
    session.dispatch(decision).await?;
    show(&session, args.json).await?;

    session.unmount().await;
    Ok(())
}

fn report(what: &str, e: &ClipError) {
    if e.is_user_visible() {
        error!("{} failed: {}", what, e);
    } else {
        warn!("{} refused: {}", what, e);
    }
}

async fn show(session: &ClipSession, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(&session.snapshot().await)?);
    } else {
        println!("{}", session.layout().await);
    }
    Ok(())
}
