//! Pipeline tests for the recording controller and dispatcher with mock
//! collaborators: no OS processes, no network.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

use meetwatch::capture::{
    AudioCapture, CaptureConfig, CaptureError, CaptureSession, CaptureStopOutcome,
};
use meetwatch::config::{CaptureSettings, TranscriptionConfig};
use meetwatch::recorder::{RecorderCommand, RecorderPhase, RecorderStatusHandle, RecordingMachine};
use meetwatch::transcription::{
    Dispatcher, RawTranscript, TranscribedWord, TranscriptionError, TranscriptionRequest,
    TranscriptionService,
};
use meetwatch::ui::{self, UiEvent};

struct MockCapture {
    spawns: Arc<AtomicUsize>,
    fail_spawn: bool,
    early_exit: Arc<Notify>,
}

struct MockSession {
    config: CaptureConfig,
    early_exit: Arc<Notify>,
}

#[async_trait]
impl AudioCapture for MockCapture {
    async fn start(&self, config: &CaptureConfig) -> Result<Box<dyn CaptureSession>, CaptureError> {
        if self.fail_spawn {
            return Err(CaptureError::BinaryNotFound("mock".to_string()));
        }
        self.spawns.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            config: config.clone(),
            early_exit: Arc::clone(&self.early_exit),
        }))
    }
}

#[async_trait]
impl CaptureSession for MockSession {
    async fn exited(&mut self) {
        self.early_exit.notified().await;
    }

    async fn stop(self: Box<Self>, _grace: Duration) -> CaptureStopOutcome {
        // A real capture process finalizes the WAV on graceful stop; the
        // mock writes an artifact honoring the session's capture config.
        let spec = hound::WavSpec {
            channels: self.config.channels,
            sample_rate: self.config.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        if let Some(parent) = self.config.output_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let mut writer = hound::WavWriter::create(&self.config.output_path, spec).unwrap();
        for sample in [100i16, -100, 50, -50] {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();

        CaptureStopOutcome {
            result: Ok(()),
            artifact: Some(self.config.output_path.clone()),
        }
    }
}

struct MockTranscription {
    requests: Mutex<Vec<TranscriptionRequest>>,
    fail_remaining: AtomicUsize,
}

impl MockTranscription {
    fn new(fail_first: usize) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail_remaining: AtomicUsize::new(fail_first),
        }
    }
}

#[async_trait]
impl TranscriptionService for MockTranscription {
    async fn transcribe(
        &self,
        _audio: Vec<u8>,
        request: &TranscriptionRequest,
    ) -> Result<RawTranscript, TranscriptionError> {
        self.requests.lock().unwrap().push(request.clone());

        if self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(TranscriptionError::Api {
                status: 500,
                message: "mock outage".to_string(),
            });
        }

        Ok(RawTranscript {
            transcript: "hello from the mock".to_string(),
            words: vec![
                TranscribedWord {
                    text: "hello".to_string(),
                    speaker_tag: 1,
                    start_offset: 0.0,
                },
                TranscribedWord {
                    text: "from".to_string(),
                    speaker_tag: 2,
                    start_offset: 0.5,
                },
            ],
        })
    }
}

struct Harness {
    tx: mpsc::Sender<RecorderCommand>,
    ui_rx: mpsc::Receiver<UiEvent>,
    spawns: Arc<AtomicUsize>,
    early_exit: Arc<Notify>,
    service: Arc<MockTranscription>,
    status: RecorderStatusHandle,
    _dir: tempfile::TempDir,
}

fn harness_with(fail_spawn: bool, fail_transcriptions: usize) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let (ui, ui_rx) = ui::channel(32);

    let service = Arc::new(MockTranscription::new(fail_transcriptions));
    let dispatcher = Arc::new(Dispatcher::new(
        service.clone(),
        TranscriptionConfig::default(),
        ui.clone(),
    ));

    let spawns = Arc::new(AtomicUsize::new(0));
    let early_exit = Arc::new(Notify::new());
    let capture = Arc::new(MockCapture {
        spawns: Arc::clone(&spawns),
        fail_spawn,
        early_exit: Arc::clone(&early_exit),
    });

    let settings = CaptureSettings {
        stop_grace_secs: 2,
        ..CaptureSettings::default()
    };

    let status = RecorderStatusHandle::default();
    let machine = RecordingMachine::new(
        capture,
        dispatcher,
        ui,
        settings,
        dir.path().to_path_buf(),
        status.clone(),
    );

    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(machine.run(rx));

    Harness {
        tx,
        ui_rx,
        spawns,
        early_exit,
        service,
        status,
        _dir: dir,
    }
}

async fn expect_event(rx: &mut mpsc::Receiver<UiEvent>) -> UiEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for UI event")
        .expect("UI channel closed")
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn test_duplicate_start_spawns_exactly_one_capture() {
    let harness = harness_with(false, 0);

    harness.tx.send(RecorderCommand::Start).await.unwrap();
    harness.tx.send(RecorderCommand::Start).await.unwrap();
    settle().await;

    assert_eq!(harness.spawns.load(Ordering::SeqCst), 1);
    assert_eq!(harness.status.get().await.phase, RecorderPhase::Recording);
}

#[tokio::test]
async fn test_stop_without_session_is_a_noop() {
    let mut harness = harness_with(false, 0);

    harness.tx.send(RecorderCommand::Stop).await.unwrap();
    settle().await;

    assert_eq!(harness.spawns.load(Ordering::SeqCst), 0);
    assert_eq!(harness.status.get().await.phase, RecorderPhase::Idle);
    assert!(harness.ui_rx.try_recv().is_err(), "no session may be emitted");
}

#[tokio::test]
async fn test_completed_session_reaches_transcription_with_capture_parameters() {
    let mut harness = harness_with(false, 0);

    harness.tx.send(RecorderCommand::Start).await.unwrap();
    settle().await;
    harness.tx.send(RecorderCommand::Stop).await.unwrap();

    let saved = expect_event(&mut harness.ui_rx).await;
    let artifact = match saved {
        UiEvent::RecordingSaved(path) => path,
        other => panic!("expected RecordingSaved, got {:?}", other),
    };
    assert!(artifact.exists());

    match expect_event(&mut harness.ui_rx).await {
        UiEvent::TranscriptionCompleted(outcome) => {
            assert_eq!(outcome.transcript, "hello from the mock");
            assert_eq!(outcome.speaker_segments.len(), 2);
        }
        other => panic!("expected TranscriptionCompleted, got {:?}", other),
    }

    // Configuration-consistency invariant: the request carries the capture
    // session's encoding parameters, not independently configured ones.
    let settings = CaptureSettings::default();
    let requests = harness.service.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].sample_rate, settings.sample_rate);
    assert_eq!(requests[0].channels, settings.channels);
}

#[tokio::test]
async fn test_spawn_failure_resets_to_idle_and_next_start_succeeds() {
    let harness = harness_with(true, 0);

    harness.tx.send(RecorderCommand::Start).await.unwrap();
    settle().await;

    let status = harness.status.get().await;
    assert_eq!(status.phase, RecorderPhase::Idle);
    assert!(status.last_error.is_some());
    assert_eq!(harness.spawns.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_transcription_failure_does_not_impair_next_session() {
    let mut harness = harness_with(false, 1);

    // Session A: transcription fails.
    harness.tx.send(RecorderCommand::Start).await.unwrap();
    settle().await;
    harness.tx.send(RecorderCommand::Stop).await.unwrap();

    match expect_event(&mut harness.ui_rx).await {
        UiEvent::RecordingSaved(_) => {}
        other => panic!("expected RecordingSaved, got {:?}", other),
    }
    match expect_event(&mut harness.ui_rx).await {
        UiEvent::TranscriptionError(message) => assert!(message.contains("mock outage")),
        other => panic!("expected TranscriptionError, got {:?}", other),
    }

    // Controller must be Idle again despite the dispatch failure.
    assert_eq!(harness.status.get().await.phase, RecorderPhase::Idle);

    // Session B: full pipeline succeeds.
    harness.tx.send(RecorderCommand::Start).await.unwrap();
    settle().await;
    harness.tx.send(RecorderCommand::Stop).await.unwrap();

    match expect_event(&mut harness.ui_rx).await {
        UiEvent::RecordingSaved(_) => {}
        other => panic!("expected RecordingSaved, got {:?}", other),
    }
    match expect_event(&mut harness.ui_rx).await {
        UiEvent::TranscriptionCompleted(_) => {}
        other => panic!("expected TranscriptionCompleted, got {:?}", other),
    }

    assert_eq!(harness.spawns.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_capture_early_exit_finishes_the_session() {
    let mut harness = harness_with(false, 0);

    harness.tx.send(RecorderCommand::Start).await.unwrap();
    settle().await;
    assert_eq!(harness.status.get().await.phase, RecorderPhase::Recording);

    // Capture process dies on its own; the controller must notice and run
    // its stop path without an external Stop command.
    harness.early_exit.notify_one();

    match expect_event(&mut harness.ui_rx).await {
        UiEvent::RecordingSaved(_) => {}
        other => panic!("expected RecordingSaved, got {:?}", other),
    }

    settle().await;
    assert_eq!(harness.status.get().await.phase, RecorderPhase::Idle);
}

#[tokio::test]
async fn test_sessions_use_distinct_artifact_paths() {
    let mut harness = harness_with(false, 0);

    let mut paths = Vec::new();
    for _ in 0..2 {
        harness.tx.send(RecorderCommand::Start).await.unwrap();
        settle().await;
        harness.tx.send(RecorderCommand::Stop).await.unwrap();

        match expect_event(&mut harness.ui_rx).await {
            UiEvent::RecordingSaved(path) => paths.push(path),
            other => panic!("expected RecordingSaved, got {:?}", other),
        }
        // Drain the transcription event before the next round.
        match expect_event(&mut harness.ui_rx).await {
            UiEvent::TranscriptionCompleted(_) => {}
            other => panic!("expected TranscriptionCompleted, got {:?}", other),
        }
    }

    assert_ne!(paths[0], paths[1]);
}
