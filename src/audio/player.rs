// Reference playback engine. Reads the clip's duration with symphonia and
// follows playback position on the tokio clock; audio output itself belongs
// to the platform player.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::info;

use super::backend::{PlaybackEngine, PlaybackEvent};
use super::file::AudioFile;

pub struct FilePlaybackEngine {
    loaded: Option<(PathBuf, Duration)>,
    started_at: Option<Instant>,
    stopped_at: Duration,
    task: Option<JoinHandle<()>>,
}

impl FilePlaybackEngine {
    pub fn new() -> Self {
        Self {
            loaded: None,
            started_at: None,
            stopped_at: Duration::ZERO,
            task: None,
        }
    }

    fn duration(&self) -> Duration {
        self.loaded.as_ref().map(|(_, d)| *d).unwrap_or_default()
    }
}

impl Default for FilePlaybackEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PlaybackEngine for FilePlaybackEngine {
    async fn load(&mut self, path: &Path) -> Result<Duration> {
        self.stop().await?;

        let owned = path.to_path_buf();
        let audio = tokio::task::spawn_blocking(move || AudioFile::probe(owned))
            .await
            .context("Probe task panicked")??;

        info!(
            "Loaded {} for playback ({:.1}s)",
            audio.path,
            audio.duration.as_secs_f64()
        );

        self.loaded = Some((path.to_path_buf(), audio.duration));
        self.stopped_at = Duration::ZERO;
        Ok(audio.duration)
    }

    async fn play(&mut self) -> Result<mpsc::Receiver<PlaybackEvent>> {
        let Some((path, duration)) = self.loaded.clone() else {
            bail!("Nothing loaded");
        };
        if self.task.as_ref().is_some_and(|t| !t.is_finished()) {
            bail!("Already playing {}", path.display());
        }

        let (tx, rx) = mpsc::channel(4);
        self.started_at = Some(Instant::now());
        self.stopped_at = Duration::ZERO;

        let task = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            info!("Finished playing {}", path.display());
            let _ = tx.send(PlaybackEvent::Finished { success: true }).await;
        });
        self.task = Some(task);

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
            self.stopped_at = self.position().await?;
            self.started_at = None;
            info!("Playback stopped at {:.1}s", self.stopped_at.as_secs_f64());
        }
        Ok(())
    }

    async fn position(&self) -> Result<Duration> {
        Ok(match self.started_at {
            Some(started) => started.elapsed().min(self.duration()),
            None => self.stopped_at,
        })
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FilePlaybackEngine {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
