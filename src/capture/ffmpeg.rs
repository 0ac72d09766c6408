//! ffmpeg-backed audio capture.
//!
//! Spawns `ffmpeg` recording the configured input device to 16-bit PCM WAV.
//! Graceful stop writes `q` to ffmpeg's stdin, which makes it flush and
//! finalize the WAV header before exiting; a kill is the timeout fallback.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use super::{AudioCapture, CaptureConfig, CaptureError, CaptureSession, CaptureStopOutcome};
use crate::config::CaptureSettings;

pub struct FfmpegCapture {
    binary: String,
    input_format: String,
    input_device: String,
}

impl FfmpegCapture {
    pub fn from_settings(settings: &CaptureSettings) -> Result<Self, CaptureError> {
        let binary = match &settings.ffmpeg_path {
            Some(path) => path.clone(),
            None => which::which("ffmpeg")
                .map_err(|_| CaptureError::BinaryNotFound("ffmpeg".to_string()))?
                .to_string_lossy()
                .into_owned(),
        };

        Ok(Self {
            binary,
            input_format: settings
                .input_format
                .clone()
                .unwrap_or_else(|| default_input_format().to_string()),
            input_device: settings
                .input_device
                .clone()
                .unwrap_or_else(|| default_input_device().to_string()),
        })
    }
}

#[cfg(target_os = "macos")]
fn default_input_format() -> &'static str {
    "avfoundation"
}

#[cfg(not(target_os = "macos"))]
fn default_input_format() -> &'static str {
    "pulse"
}

#[cfg(target_os = "macos")]
fn default_input_device() -> &'static str {
    ":0"
}

#[cfg(not(target_os = "macos"))]
fn default_input_device() -> &'static str {
    "default"
}

#[async_trait]
impl AudioCapture for FfmpegCapture {
    async fn start(&self, config: &CaptureConfig) -> Result<Box<dyn CaptureSession>, CaptureError> {
        if let Some(parent) = config.output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut command = Command::new(&self.binary);
        command
            .args(["-hide_banner", "-loglevel", "error"])
            .args(["-f", &self.input_format])
            .args(["-i", &self.input_device])
            .args(["-ac", &config.channels.to_string()])
            .args(["-ar", &config.sample_rate.to_string()])
            .args(["-acodec", "pcm_s16le"])
            .arg("-y")
            .arg(&config.output_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        debug!(
            "Spawning capture: {} -f {} -i {} -> {:?}",
            self.binary, self.input_format, self.input_device, config.output_path
        );

        let child = command.spawn().map_err(CaptureError::Spawn)?;

        info!("Capture process started (pid {:?})", child.id());

        Ok(Box::new(FfmpegSession {
            child,
            config: config.clone(),
        }))
    }
}

struct FfmpegSession {
    child: Child,
    config: CaptureConfig,
}

#[async_trait]
impl CaptureSession for FfmpegSession {
    async fn exited(&mut self) {
        // Child::wait is cancel safe and caches the exit status, so racing
        // it against a stop command and re-waiting later is fine.
        let _ = self.child.wait().await;
    }

    async fn stop(mut self: Box<Self>, grace: Duration) -> CaptureStopOutcome {
        if let Some(mut stdin) = self.child.stdin.take() {
            let _ = stdin.write_all(b"q").await;
            let _ = stdin.shutdown().await;
        }

        let result = match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) if status.success() => Ok(()),
            Ok(Ok(status)) => Err(CaptureError::ProcessFailed(status.to_string())),
            Ok(Err(e)) => Err(CaptureError::Io(e)),
            Err(_) => {
                warn!(
                    "Capture process ignored graceful stop for {:?}, killing it",
                    grace
                );
                let _ = self.child.start_kill();
                let _ = tokio::time::timeout(Duration::from_secs(2), self.child.wait()).await;
                Err(CaptureError::TerminationTimeout(grace))
            }
        };

        let artifact = self
            .config
            .output_path
            .exists()
            .then(|| self.config.output_path.clone());

        CaptureStopOutcome { result, artifact }
    }
}
