//! Routes completed recording artifacts to the transcription service.
//!
//! One dispatch per completed session, independent of any other session.
//! Failures are reported as UI events, never raised into the recording
//! pipeline: a broken transcription must not block the next meeting.

use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

use super::{
    RawTranscript, TranscriptionError, TranscriptionOutcome, TranscriptionRequest,
    TranscriptionService,
};
use crate::capture::CaptureConfig;
use crate::config::TranscriptionConfig;
use crate::ui::{UiEvent, UiSender};

pub struct Dispatcher {
    service: Arc<dyn TranscriptionService>,
    config: TranscriptionConfig,
    ui: UiSender,
}

impl Dispatcher {
    pub fn new(
        service: Arc<dyn TranscriptionService>,
        config: TranscriptionConfig,
        ui: UiSender,
    ) -> Self {
        Self {
            service,
            config,
            ui,
        }
    }

    /// Transcribe one artifact and forward the outcome to the UI bridge.
    ///
    /// The request's sample rate and channel count are copied from `capture`,
    /// the same value the recording was made with. Errors are emitted as
    /// `TranscriptionError` events and also returned for callers (the CLI)
    /// that want the result directly. No retry.
    pub async fn dispatch(
        &self,
        artifact: &Path,
        capture: &CaptureConfig,
    ) -> Result<TranscriptionOutcome, TranscriptionError> {
        match self.run(artifact, capture).await {
            Ok(outcome) => {
                info!(
                    "Transcription complete: {} chars, {} speakers",
                    outcome.transcript.len(),
                    outcome.speaker_segments.len()
                );
                self.ui
                    .emit(UiEvent::TranscriptionCompleted(outcome.clone()))
                    .await;
                Ok(outcome)
            }
            Err(e) => {
                error!("Transcription failed for {:?}: {}", artifact, e);
                self.ui.emit(UiEvent::TranscriptionError(e.to_string())).await;
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        artifact: &Path,
        capture: &CaptureConfig,
    ) -> Result<TranscriptionOutcome, TranscriptionError> {
        let audio = read_linear16(artifact, capture)?;
        let request = TranscriptionRequest::from_capture(capture, &self.config);

        info!(
            "Submitting {} bytes for transcription ({} Hz, {} ch, {})",
            audio.len(),
            request.sample_rate,
            request.channels,
            request.language_code
        );

        let raw = self.service.transcribe(audio, &request).await?;

        if raw.transcript.trim().is_empty() && raw.words.is_empty() {
            return Err(TranscriptionError::EmptyResponse);
        }

        Ok(TranscriptionOutcome::from_raw(raw))
    }
}

/// Read the WAV artifact and return its payload as raw little-endian
/// 16-bit PCM, the transport encoding the service expects.
///
/// The artifact header is checked against the capture config it was recorded
/// with; a disagreement means the file on disk is not the session's output.
fn read_linear16(path: &Path, capture: &CaptureConfig) -> Result<Vec<u8>, TranscriptionError> {
    let invalid = |reason: String| TranscriptionError::InvalidArtifact {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = hound::WavReader::open(path).map_err(|e| invalid(e.to_string()))?;
    let spec = reader.spec();

    if spec.sample_rate != capture.sample_rate || spec.channels != capture.channels {
        return Err(invalid(format!(
            "artifact is {} Hz / {} ch but the session captured {} Hz / {} ch",
            spec.sample_rate, spec.channels, capture.sample_rate, capture.channels
        )));
    }
    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(invalid(format!(
            "expected 16-bit PCM, got {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }

    let mut bytes = Vec::with_capacity(reader.len() as usize * 2);
    for sample in reader.samples::<i16>() {
        let sample = sample.map_err(|e| invalid(e.to_string()))?;
        bytes.extend_from_slice(&sample.to_le_bytes());
    }

    if bytes.is_empty() {
        return Err(invalid("artifact contains no samples".to_string()));
    }

    Ok(bytes)
}
