//! Process table access behind an injectable trait.

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

/// Failure to read the OS process table. Non-fatal: the caller skips the
/// poll tick and tries again on the next one.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("process query exited with {status}")]
    Failed { status: std::process::ExitStatus },
}

/// Source of process-description lines, one per running process.
#[async_trait]
pub trait ProcessLister: Send + Sync {
    async fn query(&self) -> Result<Vec<String>, QueryError>;
}

/// Lists processes by shelling out to `ps`.
///
/// `ps -axo command=` prints one full command line per process with no
/// header, which is what the marker matching expects.
pub struct PsProcessLister {
    command: String,
}

impl PsProcessLister {
    pub fn new() -> Self {
        Self {
            command: "ps".to_string(),
        }
    }
}

impl Default for PsProcessLister {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessLister for PsProcessLister {
    async fn query(&self) -> Result<Vec<String>, QueryError> {
        let output = Command::new(&self.command)
            .args(["-axo", "command="])
            .output()
            .await
            .map_err(|source| QueryError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(QueryError::Failed {
                status: output.status,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(String::from)
            .collect())
    }
}
