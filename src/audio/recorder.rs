// Reference recording engine: pulls frames from a capture source and writes
// one WAV file per take.

use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::backend::{
    AudioEncoding, AudioFrame, CaptureConfig, CaptureSource, RecorderEvent, RecorderPhase,
    RecordingEngine, RecordingOptions, StopOutcome,
};

/// How an engine reports that a take is closed
///
/// Platforms differ: some call back with the result, others return it from
/// the stop call. Both styles are supported so either can be exercised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionDelivery {
    /// `RecorderEvent::Finished` on the event channel
    Event,
    /// `StopOutcome::Finished` from `stop`/`pause`
    Return,
}

#[derive(Debug, Clone)]
struct PreparedTake {
    path: PathBuf,
    options: RecordingOptions,
}

/// Summary of a finished take
#[derive(Debug, Clone)]
struct TakeSummary {
    path: PathBuf,
    sample_count: usize,
    elapsed: Duration,
}

/// WAV-writing recording engine
pub struct WavRecordingEngine {
    source: Box<dyn CaptureSource>,
    delivery: CompletionDelivery,
    buffer_duration_ms: u64,
    prepared: Option<PreparedTake>,
    writer_task: Option<JoinHandle<Result<TakeSummary>>>,
    phase: RecorderPhase,
}

impl WavRecordingEngine {
    pub fn new(source: Box<dyn CaptureSource>, delivery: CompletionDelivery) -> Self {
        Self {
            source,
            delivery,
            buffer_duration_ms: 100,
            prepared: None,
            writer_task: None,
            phase: RecorderPhase::Idle,
        }
    }

    pub fn with_buffer_duration_ms(mut self, buffer_duration_ms: u64) -> Self {
        self.buffer_duration_ms = buffer_duration_ms;
        self
    }

    async fn finish_take(&mut self) -> Result<StopOutcome> {
        if self.phase != RecorderPhase::Recording {
            bail!("Not recording");
        }

        self.source.stop().await?;

        let summary = match self.writer_task.take() {
            Some(task) => task.await.context("WAV writer task panicked")?,
            None => bail!("No WAV writer running"),
        };

        self.phase = RecorderPhase::Stopped;
        let summary = summary?;

        info!(
            "Take complete: {:.1}s ({} samples) at {}",
            summary.elapsed.as_secs_f64(),
            summary.sample_count,
            summary.path.display()
        );

        Ok(match self.delivery {
            CompletionDelivery::Return => StopOutcome::Finished { path: summary.path },
            CompletionDelivery::Event => StopOutcome::Pending,
        })
    }
}

#[async_trait::async_trait]
impl RecordingEngine for WavRecordingEngine {
    async fn prepare(&mut self, path: &Path, options: &RecordingOptions) -> Result<()> {
        if self.phase == RecorderPhase::Recording {
            bail!("Can't prepare while recording");
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create output directory")?;
        }

        if options.encoding != AudioEncoding::Pcm {
            warn!(
                "{:?} encoding requested; WAV engine writes 16-bit PCM",
                options.encoding
            );
        }

        self.prepared = Some(PreparedTake {
            path: path.to_path_buf(),
            options: options.clone(),
        });
        self.phase = RecorderPhase::Preparing;

        info!(
            "Prepared take at {} ({}Hz, {} channels)",
            path.display(),
            options.sample_rate,
            options.channels
        );

        Ok(())
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<RecorderEvent>> {
        if self.phase == RecorderPhase::Recording {
            bail!("Already recording");
        }
        let take = self
            .prepared
            .take()
            .context("Take must be prepared before starting")?;

        let capture_config = CaptureConfig::for_options(&take.options, self.buffer_duration_ms);
        let writer = TakeWriter::create(&take.path, &take.options)?;
        let frames = self.source.start(&capture_config).await?;

        let (event_tx, event_rx) = mpsc::channel(100);
        let delivery = self.delivery;

        let task = tokio::spawn(async move {
            let result = writer.run(frames, &event_tx).await;

            if delivery == CompletionDelivery::Event {
                let (succeeded, path) = match &result {
                    Ok(summary) => (true, summary.path.clone()),
                    Err(_) => (false, take.path.clone()),
                };
                // Receiver may already be gone if the session was torn down
                let _ = event_tx
                    .send(RecorderEvent::Finished { succeeded, path })
                    .await;
            }

            result
        });

        self.writer_task = Some(task);
        self.phase = RecorderPhase::Recording;

        info!("Recording started via {} source", self.source.name());

        Ok(event_rx)
    }

    async fn stop(&mut self) -> Result<StopOutcome> {
        self.finish_take().await
    }

    async fn pause(&mut self) -> Result<StopOutcome> {
        // A WAV take can't be reopened, so pausing closes it
        self.finish_take().await
    }

    fn phase(&self) -> RecorderPhase {
        self.phase
    }

    fn name(&self) -> &str {
        "wav"
    }
}

impl Drop for WavRecordingEngine {
    fn drop(&mut self) {
        if let Some(task) = self.writer_task.take() {
            task.abort();
        }
    }
}

/// Writes a single take to disk as WAV file
struct TakeWriter {
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    path: PathBuf,
    sample_rate: u32,
    channels: u16,
    sample_count: usize,
}

impl TakeWriter {
    fn create(path: &Path, options: &RecordingOptions) -> Result<Self> {
        let spec = hound::WavSpec {
            channels: options.channels,
            sample_rate: options.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let writer = hound::WavWriter::create(path, spec)
            .with_context(|| format!("Failed to create WAV file: {:?}", path))?;

        Ok(Self {
            writer: Some(writer),
            path: path.to_path_buf(),
            sample_rate: options.sample_rate,
            channels: options.channels,
            sample_count: 0,
        })
    }

    async fn run(
        mut self,
        mut frames: mpsc::Receiver<AudioFrame>,
        events: &mpsc::Sender<RecorderEvent>,
    ) -> Result<TakeSummary> {
        while let Some(frame) = frames.recv().await {
            if let Err(e) = self.write_frame(&frame) {
                error!("Failed to write frame: {:#}", e);
                return Err(e);
            }

            let _ = events
                .send(RecorderEvent::Progress {
                    elapsed: self.elapsed(),
                })
                .await;
        }

        self.finish()
    }

    fn write_frame(&mut self, frame: &AudioFrame) -> Result<()> {
        if frame.sample_rate != self.sample_rate || frame.channels != self.channels {
            bail!(
                "Frame format {}Hz/{}ch doesn't match take {}Hz/{}ch",
                frame.sample_rate,
                frame.channels,
                self.sample_rate,
                self.channels
            );
        }

        if let Some(writer) = &mut self.writer {
            for &sample in &frame.samples {
                writer
                    .write_sample(sample)
                    .context("Failed to write sample to WAV")?;
            }
            self.sample_count += frame.samples.len();
        }

        Ok(())
    }

    fn elapsed(&self) -> Duration {
        let per_second = self.sample_rate as u64 * self.channels as u64;
        Duration::from_millis(self.sample_count as u64 * 1000 / per_second.max(1))
    }

    fn finish(mut self) -> Result<TakeSummary> {
        if let Some(writer) = self.writer.take() {
            writer.finalize().context("Failed to finalize WAV file")?;
        }

        Ok(TakeSummary {
            path: self.path.clone(),
            sample_count: self.sample_count,
            elapsed: self.elapsed(),
        })
    }
}

impl Drop for TakeWriter {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.finalize() {
                warn!("Failed to finalize WAV writer on drop: {}", e);
            }
        }
    }
}
