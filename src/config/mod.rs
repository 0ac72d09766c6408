use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub detection: DetectionConfig,
    pub capture: CaptureSettings,
    pub transcription: TranscriptionConfig,
    pub notification: NotificationConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Seconds between process table polls.
    pub poll_interval_secs: u64,
    /// Substring identifying the conferencing app's main process.
    pub main_process_marker: String,
    /// Substring identifying the in-meeting helper process.
    pub companion_process_marker: String,
    /// Consecutive not-present samples required before a meeting is
    /// considered ended. 1 ends the meeting on the first missed sample.
    pub end_debounce_samples: u32,
    /// Start recording automatically when a meeting is detected.
    pub auto_record: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            main_process_marker: "/MacOS/zoom.us".to_string(),
            companion_process_marker: "/Frameworks/aomhost.app".to_string(),
            end_debounce_samples: 1,
            auto_record: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub sample_rate: u32,
    pub channels: u16,
    /// Directory for recording artifacts. Defaults to `<data_dir>/recordings`.
    pub recordings_dir: Option<PathBuf>,
    /// Path to the ffmpeg binary. Resolved from PATH when unset.
    pub ffmpeg_path: Option<String>,
    /// ffmpeg input format (e.g. "pulse", "alsa", "avfoundation").
    pub input_format: Option<String>,
    /// ffmpeg input device name.
    pub input_device: Option<String>,
    /// Seconds to wait for the capture process to exit after a graceful stop.
    pub stop_grace_secs: u64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            recordings_dir: None,
            ffmpeg_path: None,
            input_format: None,
            input_device: None,
            stop_grace_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub language: Option<String>,
    pub diarization_speaker_count: u32,
    pub request_timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            language: Some("en-US".to_string()),
            diarization_speaker_count: 2,
            request_timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,
    /// Notification command. Receives title and body as arguments.
    pub command: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "notify-send".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 6338, // MEET on a phone keypad
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}
