//! Audio capture behind an injectable trait.
//!
//! The capture process is an independent OS process. A running capture is
//! represented as an explicit session value with a single completion path
//! (`stop`), rather than scattered exit/error callbacks.

pub mod ffmpeg;

pub use ffmpeg::FfmpegCapture;

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Parameters for one capture session. The transcription request for the
/// session's artifact is derived from this same value, so capture and
/// transcription encoding parameters cannot drift apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub output_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture binary not found: {0}")]
    BinaryNotFound(String),
    #[error("failed to spawn capture process: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("capture process exited with {0}")]
    ProcessFailed(String),
    #[error("capture process did not terminate within {0:?}")]
    TerminationTimeout(Duration),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// What a stopped session left behind. `result` reports how the process
/// terminated; `artifact` is the output file if it exists on disk, which it
/// may even when termination failed (partial recording recovery).
pub struct CaptureStopOutcome {
    pub result: Result<(), CaptureError>,
    pub artifact: Option<PathBuf>,
}

#[async_trait]
pub trait AudioCapture: Send + Sync {
    /// Spawn a capture process writing to `config.output_path`.
    async fn start(&self, config: &CaptureConfig) -> Result<Box<dyn CaptureSession>, CaptureError>;
}

#[async_trait]
pub trait CaptureSession: Send {
    /// Resolves when the capture process exits on its own. Cancel safe; a
    /// caller may race this against other work and retry.
    async fn exited(&mut self);

    /// Request graceful termination, await exit within `grace`, and report
    /// the outcome together with whatever artifact is on disk.
    async fn stop(self: Box<Self>, grace: Duration) -> CaptureStopOutcome;
}
