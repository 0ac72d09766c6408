//! Reduces a raw process listing to the two-signal presence snapshot.

use std::sync::Arc;

use super::process_lister::{ProcessLister, QueryError};

/// One poll of the process table, reduced to the two booleans the presence
/// machine cares about. Produced once per tick and discarded after use.
#[derive(Debug, Clone, Copy)]
pub struct ProcessSnapshot {
    pub sampled_at: chrono::DateTime<chrono::Utc>,
    pub main_running: bool,
    pub companion_running: bool,
}

impl ProcessSnapshot {
    /// Both processes must appear in the same snapshot for a meeting to be
    /// considered possible.
    pub fn meeting_present(&self) -> bool {
        self.main_running && self.companion_running
    }
}

pub struct ProcessSampler {
    lister: Arc<dyn ProcessLister>,
    main_marker: String,
    companion_marker: String,
}

impl ProcessSampler {
    pub fn new(lister: Arc<dyn ProcessLister>, main_marker: &str, companion_marker: &str) -> Self {
        Self {
            lister,
            main_marker: main_marker.to_string(),
            companion_marker: companion_marker.to_string(),
        }
    }

    pub async fn sample(&self) -> Result<ProcessSnapshot, QueryError> {
        let lines = self.lister.query().await?;

        let mut main_running = false;
        let mut companion_running = false;
        for line in &lines {
            if !main_running && line.contains(&self.main_marker) {
                main_running = true;
            }
            if !companion_running && line.contains(&self.companion_marker) {
                companion_running = true;
            }
            if main_running && companion_running {
                break;
            }
        }

        Ok(ProcessSnapshot {
            sampled_at: chrono::Utc::now(),
            main_running,
            companion_running,
        })
    }
}
