// Synthetic capture source used on desktops without a platform microphone
// binding and in tests.

use anyhow::{bail, Result};
use std::f32::consts::TAU;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::backend::{AudioFrame, CaptureConfig, CaptureSource};

/// Emits one buffer of a sine tone (or silence) per buffer period
pub struct ToneSource {
    frequency_hz: f32,
    amplitude: f32,
    task: Option<JoinHandle<()>>,
}

impl ToneSource {
    pub fn new(frequency_hz: f32) -> Self {
        Self {
            frequency_hz,
            amplitude: 0.25,
            task: None,
        }
    }

    pub fn silence() -> Self {
        Self {
            frequency_hz: 0.0,
            amplitude: 0.0,
            task: None,
        }
    }
}

#[async_trait::async_trait]
impl CaptureSource for ToneSource {
    async fn start(&mut self, config: &CaptureConfig) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.task.is_some() {
            bail!("Already capturing");
        }
        if config.buffer_duration_ms == 0 {
            bail!("Buffer duration must be positive");
        }

        let (tx, rx) = mpsc::channel(100);
        let config = config.clone();
        let frequency = self.frequency_hz;
        let amplitude = self.amplitude;

        info!(
            "Starting tone capture ({}Hz tone, {}Hz, {} channels)",
            frequency, config.sample_rate, config.channels
        );

        let task = tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(std::time::Duration::from_millis(config.buffer_duration_ms));
            let frames_per_buffer = config.samples_per_buffer() / config.channels.max(1) as usize;
            let mut frame_cursor: u64 = 0;
            let mut timestamp_ms = 0;

            loop {
                ticker.tick().await;

                let mut samples = Vec::with_capacity(frames_per_buffer * config.channels as usize);
                for i in 0..frames_per_buffer as u64 {
                    let t = (frame_cursor + i) as f32 / config.sample_rate as f32;
                    let value = (TAU * frequency * t).sin() * amplitude * i16::MAX as f32;
                    for _ in 0..config.channels {
                        samples.push(value as i16);
                    }
                }
                frame_cursor += frames_per_buffer as u64;

                let frame = AudioFrame {
                    samples,
                    sample_rate: config.sample_rate,
                    channels: config.channels,
                    timestamp_ms,
                };
                timestamp_ms += config.buffer_duration_ms;

                if tx.send(frame).await.is_err() {
                    debug!("Frame receiver dropped, ending tone capture");
                    break;
                }
            }
        });

        self.task = Some(task);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            // Dropping the task's sender closes the frame channel
            task.abort();
            info!("Tone capture stopped");
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.task.is_some()
    }

    fn name(&self) -> &str {
        "tone"
    }
}
