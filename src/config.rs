use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub storage: StorageConfig,
    pub playback: PlaybackConfig,
    pub capture: CaptureSettings,
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    pub documents_dir: String,
    pub file_name: String,
}

#[derive(Debug, Deserialize)]
pub struct PlaybackConfig {
    pub poll_interval_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct CaptureSettings {
    pub buffer_duration_ms: u64,
    pub tone_hz: f32,
}

impl Config {
    /// Load configuration, falling back to built-in defaults for anything the
    /// file (which may be absent) doesn't set
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("app.name", "ClipRecorder")?
            .set_default("storage.documents_dir", "~/Documents")?
            .set_default("storage.file_name", "test.aac")?
            .set_default("playback.poll_interval_ms", 100)?
            .set_default("capture.buffer_duration_ms", 100)?
            .set_default("capture.tone_hz", 440.0)?
            .add_source(config::File::with_name(path).required(false))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Output path for every take: documents directory plus the file name
    pub fn audio_path(&self) -> PathBuf {
        let dir = shellexpand::tilde(&self.storage.documents_dir);
        PathBuf::from(dir.as_ref()).join(&self.storage.file_name)
    }
}
