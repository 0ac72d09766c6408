//! Recording session state.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::capture::CaptureConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Stopping,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Stopping => "stopping",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// One start-to-stop lifetime of the capture process. Created when recording
/// starts, handed off to the dispatcher with its capture config after a stop,
/// then dropped.
#[derive(Debug, Clone)]
pub struct RecordingSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub config: CaptureConfig,
    pub status: SessionStatus,
}

impl RecordingSession {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            config,
            status: SessionStatus::Active,
        }
    }

    pub fn duration_seconds(&self) -> u64 {
        let elapsed = Utc::now() - self.started_at;
        elapsed.num_seconds().max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config() -> CaptureConfig {
        CaptureConfig {
            sample_rate: 16000,
            channels: 1,
            output_path: PathBuf::from("/tmp/meeting-test.wav"),
        }
    }

    #[test]
    fn test_session_status_as_str() {
        assert_eq!(SessionStatus::Active.as_str(), "active");
        assert_eq!(SessionStatus::Stopping.as_str(), "stopping");
        assert_eq!(SessionStatus::Completed.as_str(), "completed");
        assert_eq!(SessionStatus::Failed.as_str(), "failed");
    }

    #[test]
    fn test_new_session_is_active() {
        let session = RecordingSession::new(config());
        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(session.config.channels, 1);
    }

    #[test]
    fn test_sessions_have_unique_ids() {
        let a = RecordingSession::new(config());
        let b = RecordingSession::new(config());
        assert_ne!(a.id, b.id);
    }
}
