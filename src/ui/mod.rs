//! Outbound event channel toward the UI bridge.
//!
//! The core never renders anything. It emits discrete events over an mpsc
//! channel; whatever sits on the receiving end (notification bridge, frontend
//! IPC) is a presentation concern outside this crate's core.

use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::warn;

use crate::transcription::TranscriptionOutcome;

#[derive(Debug)]
pub enum UiEvent {
    MeetingDetected,
    MeetingEnded,
    RecordingSaved(PathBuf),
    TranscriptionCompleted(TranscriptionOutcome),
    TranscriptionError(String),
}

/// Sender half handed to the components that emit events.
#[derive(Clone)]
pub struct UiSender {
    tx: mpsc::Sender<UiEvent>,
}

impl UiSender {
    pub fn new(tx: mpsc::Sender<UiEvent>) -> Self {
        Self { tx }
    }

    /// Emit an event. A closed or full bridge is logged and dropped; event
    /// delivery must never stall or fail the pipeline that produced it.
    pub async fn emit(&self, event: UiEvent) {
        if let Err(e) = self.tx.send(event).await {
            warn!("UI bridge unavailable, dropping event: {}", e);
        }
    }
}

pub fn channel(buffer: usize) -> (UiSender, mpsc::Receiver<UiEvent>) {
    let (tx, rx) = mpsc::channel(buffer);
    (UiSender::new(tx), rx)
}
