//! Service wiring and the polling loop.
//!
//! Everything is an explicitly constructed instance wired here: the sampler,
//! presence machine and recording machine have no global state, so tests can
//! run isolated copies of each.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::api::{ApiServer, ControlState};
use crate::capture::FfmpegCapture;
use crate::config::{Config, DetectionConfig};
use crate::detect::{
    PresenceEvent, PresenceMachine, PresenceStatusHandle, ProcessSampler, PsProcessLister,
};
use crate::global;
use crate::notify::{CommandNotifier, NotificationSink};
use crate::recorder::{RecorderCommand, RecorderStatusHandle, RecordingMachine};
use crate::transcription::{CloudSpeechProvider, Dispatcher};
use crate::ui::{self, UiEvent, UiSender};

pub async fn run_service() -> Result<()> {
    info!("Starting meetwatch service");

    let config = Config::load()?;

    let (ui, ui_rx) = ui::channel(32);

    let provider = Arc::new(
        CloudSpeechProvider::from_config(&config.transcription)
            .context("Transcription provider is not configured")?,
    );
    let dispatcher = Arc::new(Dispatcher::new(
        provider,
        config.transcription.clone(),
        ui.clone(),
    ));

    let capture =
        Arc::new(FfmpegCapture::from_settings(&config.capture).context("Capture is unavailable")?);

    let recordings_dir = match &config.capture.recordings_dir {
        Some(dir) => dir.clone(),
        None => global::recordings_dir()?,
    };

    let recorder_status = RecorderStatusHandle::default();
    let presence_status = PresenceStatusHandle::default();

    let (cmd_tx, cmd_rx) = mpsc::channel::<RecorderCommand>(16);
    let machine = RecordingMachine::new(
        capture,
        dispatcher,
        ui.clone(),
        config.capture.clone(),
        recordings_dir,
        recorder_status.clone(),
    );
    tokio::spawn(machine.run(cmd_rx));

    let api_server = ApiServer::new(
        config.api.port,
        ControlState {
            tx: cmd_tx.clone(),
            recorder: recorder_status,
            presence: presence_status.clone(),
        },
    );
    tokio::spawn(async move {
        if let Err(e) = api_server.start().await {
            error!("API server failed: {}", e);
        }
    });

    let notifier: Arc<dyn NotificationSink> =
        Arc::new(CommandNotifier::from_config(&config.notification));
    tokio::spawn(run_ui_bridge(ui_rx, notifier));

    info!("meetwatch is ready, watching for meetings");
    info!(
        "Manual control: curl -X POST http://127.0.0.1:{}/start",
        config.api.port
    );

    run_polling_loop(&config.detection, cmd_tx, ui, presence_status).await;

    Ok(())
}

/// Timer-driven sampling. The sample is awaited inline and missed ticks are
/// skipped, so at most one process query is ever outstanding and no two
/// snapshots can race into the presence machine.
async fn run_polling_loop(
    detection: &DetectionConfig,
    cmd_tx: mpsc::Sender<RecorderCommand>,
    ui: UiSender,
    presence_status: PresenceStatusHandle,
) {
    let sampler = ProcessSampler::new(
        Arc::new(PsProcessLister::new()),
        &detection.main_process_marker,
        &detection.companion_process_marker,
    );
    let mut presence = PresenceMachine::new(detection.end_debounce_samples);

    let mut interval = tokio::time::interval(Duration::from_secs(detection.poll_interval_secs.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        let snapshot = match sampler.sample().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Process query failed, skipping tick: {}", e);
                continue;
            }
        };

        if let Some(event) = presence.observe(&snapshot) {
            presence_status.set(presence.state()).await;
            match event {
                PresenceEvent::MeetingStarted => {
                    info!("Meeting detected");
                    ui.emit(UiEvent::MeetingDetected).await;
                    if detection.auto_record {
                        if cmd_tx.send(RecorderCommand::Start).await.is_err() {
                            error!("Recording controller is gone, cannot start");
                        }
                    }
                }
                PresenceEvent::MeetingEnded => {
                    info!("Meeting ended");
                    ui.emit(UiEvent::MeetingEnded).await;
                    if cmd_tx.send(RecorderCommand::Stop).await.is_err() {
                        error!("Recording controller is gone, cannot stop");
                    }
                }
            }
        }
    }
}

/// Presentation edge of the core: turns outbound events into notifications
/// and log lines. Everything here is fire-and-forget.
async fn run_ui_bridge(
    mut rx: mpsc::Receiver<UiEvent>,
    notifier: Arc<dyn NotificationSink>,
) {
    while let Some(event) = rx.recv().await {
        match event {
            UiEvent::MeetingDetected => {
                notifier
                    .notify("Meeting detected", "A meeting is running.")
                    .await;
            }
            UiEvent::MeetingEnded => {
                notifier
                    .notify("Meeting ended", "Recording stopped.")
                    .await;
            }
            UiEvent::RecordingSaved(path) => {
                info!("Recording saved: {:?}", path);
            }
            UiEvent::TranscriptionCompleted(outcome) => {
                let body = format!(
                    "{} chars across {} speakers",
                    outcome.transcript.len(),
                    outcome.speaker_segments.len()
                );
                notifier.notify("Transcription ready", &body).await;
            }
            UiEvent::TranscriptionError(message) => {
                notifier.notify("Transcription failed", &message).await;
            }
        }
    }
}
