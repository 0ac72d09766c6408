//! Transcription types and service abstraction.
//!
//! The service is injected as a trait so the dispatcher is testable without
//! network access. Request encoding parameters are always derived from the
//! capture configuration that produced the artifact.

pub mod dispatcher;
pub mod providers;

pub use dispatcher::Dispatcher;
pub use providers::CloudSpeechProvider;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

use crate::capture::CaptureConfig;
use crate::config::TranscriptionConfig;

/// One recognized word with its diarization attribution.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscribedWord {
    pub text: String,
    pub speaker_tag: u32,
    /// Offset from the start of the recording, in seconds.
    pub start_offset: f64,
}

/// Raw service response: transcript text plus the ordered word list.
#[derive(Debug, Clone)]
pub struct RawTranscript {
    pub transcript: String,
    pub words: Vec<TranscribedWord>,
}

/// Final per-session result. Built once, immutable after construction.
#[derive(Debug, Clone)]
pub struct TranscriptionOutcome {
    pub transcript: String,
    pub words: Vec<TranscribedWord>,
    /// Words grouped by speaker tag, preserving their original relative
    /// order within each group.
    pub speaker_segments: BTreeMap<u32, Vec<TranscribedWord>>,
}

impl TranscriptionOutcome {
    /// Single ordered walk over the word list. Grouping is stable: each
    /// tag's words keep the order they were spoken in, no re-sort.
    pub fn from_raw(raw: RawTranscript) -> Self {
        let mut speaker_segments: BTreeMap<u32, Vec<TranscribedWord>> = BTreeMap::new();
        for word in &raw.words {
            speaker_segments
                .entry(word.speaker_tag)
                .or_default()
                .push(word.clone());
        }

        Self {
            transcript: raw.transcript,
            words: raw.words,
            speaker_segments,
        }
    }
}

/// Parameters for one transcription request.
///
/// There is deliberately no way to build one with free-standing sample rate
/// or channel count: both are copied from the `CaptureConfig` the artifact
/// was recorded with, since a mismatch silently corrupts results.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionRequest {
    pub sample_rate: u32,
    pub channels: u16,
    pub language_code: String,
    pub diarization_speaker_count: u32,
}

impl TranscriptionRequest {
    pub fn from_capture(capture: &CaptureConfig, config: &TranscriptionConfig) -> Self {
        Self {
            sample_rate: capture.sample_rate,
            channels: capture.channels,
            language_code: config
                .language
                .clone()
                .unwrap_or_else(|| "en-US".to_string()),
            diarization_speaker_count: config.diarization_speaker_count,
        }
    }
}

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("failed to read artifact {path:?}: {reason}")]
    InvalidArtifact { path: PathBuf, reason: String },
    #[error("transcription request failed: {0}")]
    Request(String),
    #[error("transcription service returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("transcription service returned an empty result")]
    EmptyResponse,
}

/// Speech-to-text collaborator contract.
#[async_trait]
pub trait TranscriptionService: Send + Sync {
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        request: &TranscriptionRequest,
    ) -> Result<RawTranscript, TranscriptionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn word(text: &str, tag: u32, offset: f64) -> TranscribedWord {
        TranscribedWord {
            text: text.to_string(),
            speaker_tag: tag,
            start_offset: offset,
        }
    }

    #[test]
    fn test_grouping_produces_one_segment_per_tag() {
        let raw = RawTranscript {
            transcript: "a b c d e f".to_string(),
            words: vec![
                word("a", 1, 0.0),
                word("b", 2, 0.5),
                word("c", 1, 1.0),
                word("d", 3, 1.5),
                word("e", 2, 2.0),
                word("f", 1, 2.5),
            ],
        };

        let outcome = TranscriptionOutcome::from_raw(raw);
        assert_eq!(outcome.speaker_segments.len(), 3);

        let tags: Vec<u32> = outcome.speaker_segments.keys().copied().collect();
        assert_eq!(tags, vec![1, 2, 3]);
    }

    #[test]
    fn test_grouping_preserves_per_tag_order() {
        let raw = RawTranscript {
            transcript: String::new(),
            words: vec![
                word("first", 1, 0.0),
                word("other", 2, 0.4),
                word("second", 1, 0.8),
                word("third", 1, 1.2),
            ],
        };

        let outcome = TranscriptionOutcome::from_raw(raw);
        let speaker_one: Vec<&str> = outcome.speaker_segments[&1]
            .iter()
            .map(|w| w.text.as_str())
            .collect();
        assert_eq!(speaker_one, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_grouping_contains_only_that_tags_words() {
        let raw = RawTranscript {
            transcript: String::new(),
            words: vec![word("x", 1, 0.0), word("y", 2, 0.5), word("z", 1, 1.0)],
        };

        let outcome = TranscriptionOutcome::from_raw(raw);
        assert!(outcome.speaker_segments[&2]
            .iter()
            .all(|w| w.speaker_tag == 2));
        assert_eq!(outcome.speaker_segments[&2].len(), 1);
    }

    #[test]
    fn test_request_copies_encoding_from_capture() {
        let capture = CaptureConfig {
            sample_rate: 44100,
            channels: 2,
            output_path: PathBuf::from("/tmp/session.wav"),
        };
        let request = TranscriptionRequest::from_capture(&capture, &TranscriptionConfig::default());
        assert_eq!(request.sample_rate, capture.sample_rate);
        assert_eq!(request.channels, capture.channels);
        assert_eq!(request.language_code, "en-US");
    }
}
