//! Cloud speech-to-text provider with speaker diarization.
//!
//! Submits base64-encoded LINEAR16 audio in a single JSON request and maps
//! the word-level diarization response to `RawTranscript`.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::TranscriptionConfig;
use crate::transcription::{
    RawTranscript, TranscribedWord, TranscriptionError, TranscriptionRequest, TranscriptionService,
};

const DEFAULT_ENDPOINT: &str = "https://speech.googleapis.com/v1/speech:recognize";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig {
    encoding: &'static str,
    sample_rate_hertz: u32,
    audio_channel_count: u16,
    language_code: String,
    enable_speaker_diarization: bool,
    diarization_speaker_count: u32,
    enable_automatic_punctuation: bool,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Serialize)]
struct RecognizeRequest {
    config: RecognitionConfig,
    audio: RecognitionAudio,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<RecognitionAlternative>,
}

#[derive(Debug, Deserialize)]
struct RecognitionAlternative {
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    words: Vec<WordInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WordInfo {
    word: String,
    #[serde(default)]
    speaker_tag: u32,
    #[serde(default)]
    start_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

pub struct CloudSpeechProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl CloudSpeechProvider {
    pub fn from_config(config: &TranscriptionConfig) -> Result<Self, TranscriptionError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            TranscriptionError::Request("transcription.api_key is not configured".to_string())
        })?;
        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| TranscriptionError::Request(e.to_string()))?;

        info!("Initialized cloud speech provider at {}", endpoint);

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    pub fn name(&self) -> &'static str {
        "cloud-speech"
    }
}

#[async_trait]
impl TranscriptionService for CloudSpeechProvider {
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        request: &TranscriptionRequest,
    ) -> Result<RawTranscript, TranscriptionError> {
        let body = RecognizeRequest {
            config: RecognitionConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: request.sample_rate,
                audio_channel_count: request.channels,
                language_code: request.language_code.clone(),
                enable_speaker_diarization: true,
                diarization_speaker_count: request.diarization_speaker_count,
                enable_automatic_punctuation: true,
            },
            audio: RecognitionAudio {
                content: base64::engine::general_purpose::STANDARD.encode(&audio),
            },
        };

        debug!(
            "Submitting {} bytes of LINEAR16 audio to {}",
            audio.len(),
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| TranscriptionError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TranscriptionError::Request(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(TranscriptionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: RecognizeResponse = serde_json::from_str(&text)
            .map_err(|e| TranscriptionError::Request(format!("invalid response body: {e}")))?;

        Ok(flatten_response(parsed))
    }
}

/// Collect the transcript and word list across all results. Diarized words
/// arrive in document order, which the downstream grouping relies on.
fn flatten_response(response: RecognizeResponse) -> RawTranscript {
    let mut transcript = String::new();
    let mut words = Vec::new();

    for result in response.results {
        let Some(alternative) = result.alternatives.into_iter().next() else {
            continue;
        };
        if !alternative.transcript.is_empty() {
            if !transcript.is_empty() {
                transcript.push(' ');
            }
            transcript.push_str(alternative.transcript.trim());
        }
        for word in alternative.words {
            words.push(TranscribedWord {
                start_offset: word
                    .start_time
                    .as_deref()
                    .and_then(parse_duration_secs)
                    .unwrap_or(0.0),
                text: word.word,
                speaker_tag: word.speaker_tag,
            });
        }
    }

    RawTranscript { transcript, words }
}

/// Durations arrive as strings like "3.400s".
fn parse_duration_secs(value: &str) -> Option<f64> {
    value.trim().trim_end_matches('s').parse().ok()
}
