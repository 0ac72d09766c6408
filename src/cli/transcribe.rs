//! Manual transcription of an existing recording.
//!
//! Runs the same dispatch path the service uses after a meeting, with the
//! capture parameters read back from the artifact's own WAV header.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::capture::CaptureConfig;
use crate::config::Config;
use crate::transcription::{CloudSpeechProvider, Dispatcher};
use crate::ui;

use super::args::TranscribeCliArgs;

pub async fn handle_transcribe_command(args: TranscribeCliArgs) -> Result<()> {
    let config = Config::load()?;

    let mut transcription = config.transcription.clone();
    if args.language.is_some() {
        transcription.language = args.language.clone();
    }

    let spec = hound::WavReader::open(&args.file)
        .with_context(|| format!("Failed to open {:?}", args.file))?
        .spec();

    let capture = CaptureConfig {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        output_path: args.file.clone(),
    };

    let provider = Arc::new(
        CloudSpeechProvider::from_config(&transcription)
            .context("Transcription provider is not configured")?,
    );

    let (ui, _ui_rx) = ui::channel(8);
    let dispatcher = Dispatcher::new(provider, transcription, ui);

    let outcome = dispatcher.dispatch(&args.file, &capture).await?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &outcome.transcript)
                .with_context(|| format!("Failed to write transcript to {:?}", path))?;
            println!("Transcript written to {:?}", path);
        }
        None => {
            println!("{}", outcome.transcript);
        }
    }

    for (tag, words) in &outcome.speaker_segments {
        let text: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
        println!("\nSpeaker {}: {}", tag, text.join(" "));
    }

    Ok(())
}
