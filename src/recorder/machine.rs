//! Recording controller.
//!
//! Drives the capture subprocess from presence edges and manual triggers.
//! All commands arrive over one mpsc channel and are handled sequentially:
//! a stop that is awaiting process exit can never interleave with a start.
//! Polling continues elsewhere while this loop waits.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use crate::capture::{AudioCapture, CaptureConfig, CaptureSession};
use crate::config::CaptureSettings;
use crate::transcription::Dispatcher;
use crate::ui::{UiEvent, UiSender};

use super::session::{RecordingSession, SessionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderCommand {
    Start,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderPhase {
    Idle,
    Recording,
    Stopping,
}

impl RecorderPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecorderStatus {
    pub phase: RecorderPhase,
    pub session_id: Option<uuid::Uuid>,
    pub output_path: Option<PathBuf>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_error: Option<String>,
}

impl Default for RecorderStatus {
    fn default() -> Self {
        Self {
            phase: RecorderPhase::Idle,
            session_id: None,
            output_path: None,
            started_at: None,
            last_error: None,
        }
    }
}

/// Thread-safe handle for sharing recorder state with API handlers.
#[derive(Clone, Default)]
pub struct RecorderStatusHandle {
    inner: Arc<Mutex<RecorderStatus>>,
}

impl RecorderStatusHandle {
    pub async fn get(&self) -> RecorderStatus {
        self.inner.lock().await.clone()
    }

    pub async fn set_recording(&self, session: &RecordingSession) {
        let mut status = self.inner.lock().await;
        status.phase = RecorderPhase::Recording;
        status.session_id = Some(session.id);
        status.output_path = Some(session.config.output_path.clone());
        status.started_at = Some(session.started_at);
        status.last_error = None;
    }

    pub async fn set_stopping(&self) {
        let mut status = self.inner.lock().await;
        status.phase = RecorderPhase::Stopping;
    }

    pub async fn set_idle(&self, last_error: Option<String>) {
        let mut status = self.inner.lock().await;
        status.phase = RecorderPhase::Idle;
        status.session_id = None;
        status.output_path = None;
        status.started_at = None;
        status.last_error = last_error;
    }
}

enum ActiveCapture {
    Idle,
    Recording {
        session: RecordingSession,
        handle: Box<dyn CaptureSession>,
    },
}

enum LoopEvent {
    Command(Option<RecorderCommand>),
    CaptureExited,
}

pub struct RecordingMachine {
    capture: Arc<dyn AudioCapture>,
    dispatcher: Arc<Dispatcher>,
    ui: UiSender,
    settings: CaptureSettings,
    recordings_dir: PathBuf,
    status: RecorderStatusHandle,
    active: ActiveCapture,
}

impl RecordingMachine {
    pub fn new(
        capture: Arc<dyn AudioCapture>,
        dispatcher: Arc<Dispatcher>,
        ui: UiSender,
        settings: CaptureSettings,
        recordings_dir: PathBuf,
        status: RecorderStatusHandle,
    ) -> Self {
        Self {
            capture,
            dispatcher,
            ui,
            settings,
            recordings_dir,
            status,
            active: ActiveCapture::Idle,
        }
    }

    /// Command loop. Runs until the command channel closes; an active
    /// session is stopped on the way out.
    pub async fn run(mut self, mut rx: mpsc::Receiver<RecorderCommand>) {
        loop {
            match Self::next_event(&mut rx, &mut self.active).await {
                LoopEvent::Command(Some(RecorderCommand::Start)) => self.start().await,
                LoopEvent::Command(Some(RecorderCommand::Stop)) => self.stop().await,
                LoopEvent::Command(None) => break,
                LoopEvent::CaptureExited => {
                    warn!("Capture process exited on its own, finishing session");
                    self.stop().await;
                }
            }
        }

        if matches!(self.active, ActiveCapture::Recording { .. }) {
            info!("Command channel closed, stopping active recording");
            self.stop().await;
        }
    }

    /// Waits for the next command, racing it against capture exit while a
    /// session is active so a dying capture process is handled promptly.
    async fn next_event(
        rx: &mut mpsc::Receiver<RecorderCommand>,
        active: &mut ActiveCapture,
    ) -> LoopEvent {
        match active {
            ActiveCapture::Recording { handle, .. } => tokio::select! {
                command = rx.recv() => LoopEvent::Command(command),
                _ = handle.exited() => LoopEvent::CaptureExited,
            },
            ActiveCapture::Idle => LoopEvent::Command(rx.recv().await),
        }
    }

    /// Start a capture session. No-op while one is active, so duplicate
    /// `MeetingStarted` events and repeated manual triggers are harmless.
    async fn start(&mut self) {
        if let ActiveCapture::Recording { session, .. } = &self.active {
            debug!(
                "Recording session {} already in progress, ignoring start",
                session.id
            );
            return;
        }

        let config = CaptureConfig {
            sample_rate: self.settings.sample_rate,
            channels: self.settings.channels,
            output_path: self.generate_output_path(),
        };

        let handle = match self.capture.start(&config).await {
            Ok(handle) => handle,
            Err(e) => {
                error!("Failed to spawn capture process: {}", e);
                self.status.set_idle(Some(e.to_string())).await;
                return;
            }
        };

        let session = RecordingSession::new(config);
        info!(
            "Recording session {} started: {:?}",
            session.id, session.config.output_path
        );
        self.status.set_recording(&session).await;
        self.active = ActiveCapture::Recording { session, handle };
    }

    /// Stop the active session and hand its artifact to the dispatcher.
    /// No-op when idle. The controller returns to `Idle` whatever the
    /// dispatch outcome; a failed transcription must not wedge it.
    async fn stop(&mut self) {
        let (mut session, handle) = match std::mem::replace(&mut self.active, ActiveCapture::Idle)
        {
            ActiveCapture::Recording { session, handle } => (session, handle),
            ActiveCapture::Idle => {
                debug!("Stop requested with no active session, ignoring");
                return;
            }
        };

        session.status = SessionStatus::Stopping;
        self.status.set_stopping().await;

        let grace = Duration::from_secs(self.settings.stop_grace_secs);
        let outcome = handle.stop(grace).await;

        session.status = match &outcome.result {
            Ok(()) if outcome.artifact.is_some() => {
                info!(
                    "Recording session {} stopped cleanly after {}s",
                    session.id,
                    session.duration_seconds()
                );
                SessionStatus::Completed
            }
            Ok(()) => SessionStatus::Failed,
            Err(e) => {
                warn!("Recording session {} ended abnormally: {}", session.id, e);
                SessionStatus::Failed
            }
        };

        match outcome.artifact {
            Some(artifact) => {
                if session.status == SessionStatus::Failed {
                    warn!(
                        "Dispatching partial artifact for session {}: {:?}",
                        session.id, artifact
                    );
                }
                self.ui.emit(UiEvent::RecordingSaved(artifact.clone())).await;

                // Out-of-band: dispatches for different sessions may overlap
                // and must not block the next recording.
                let dispatcher = Arc::clone(&self.dispatcher);
                let config = session.config.clone();
                tokio::spawn(async move {
                    let _ = dispatcher.dispatch(&artifact, &config).await;
                });

                self.status.set_idle(None).await;
            }
            None => {
                error!("Recording session {} produced no artifact", session.id);
                self.status
                    .set_idle(Some("capture produced no artifact".to_string()))
                    .await;
            }
        }
    }

    fn generate_output_path(&self) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let filename = format!("meeting-{}.wav", timestamp);
        let path = self.recordings_dir.join(&filename);

        // Handle collision by appending counter
        if path.exists() {
            for i in 1..100 {
                let filename = format!("meeting-{}-{}.wav", timestamp, i);
                let alt_path = self.recordings_dir.join(&filename);
                if !alt_path.exists() {
                    return alt_path;
                }
            }
        }

        path
    }
}
