use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info};

/// Basic facts about a recorded clip
#[derive(Debug, Clone)]
pub struct AudioFile {
    pub path: String,
    pub duration: Duration,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioFile {
    /// Probe a clip's container and work out its duration
    ///
    /// Uses the frame count from the container header when present and
    /// otherwise walks the packets (ADTS AAC streams carry no total).
    pub fn probe(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Probing audio file: {}", path.display());

        let file = File::open(path)
            .with_context(|| format!("Failed to open audio file: {}", path.display()))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .context("Unrecognized audio format")?;
        let mut format = probed.format;

        let track = format
            .default_track()
            .context("Audio file has no playable track")?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        let sample_rate = params.sample_rate.context("Audio track has no sample rate")?;
        let channels = params.channels.map(|c| c.count() as u16).unwrap_or(1);

        let n_frames = match params.n_frames {
            Some(n) => n,
            None => {
                debug!("No frame count in header, counting packets");
                let mut total = 0u64;
                while let Ok(packet) = format.next_packet() {
                    if packet.track_id() == track_id {
                        total += packet.dur;
                    }
                }
                total
            }
        };

        let duration = Duration::from_millis(n_frames * 1000 / sample_rate as u64);

        info!(
            "Audio file probed: {:.1}s, {}Hz, {} channels",
            duration.as_secs_f64(),
            sample_rate,
            channels
        );

        Ok(Self {
            path: path.display().to_string(),
            duration,
            sample_rate,
            channels,
        })
    }
}
