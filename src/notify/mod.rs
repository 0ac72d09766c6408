//! Desktop notification sink.
//!
//! Fire-and-forget from the core's perspective: a failed notification is
//! logged and swallowed, never propagated into the pipeline.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::NotificationConfig;

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, title: &str, body: &str);
}

/// Shells out to `notify-send` (or a configured replacement taking title and
/// body as its two arguments).
pub struct CommandNotifier {
    command: String,
    enabled: bool,
}

impl CommandNotifier {
    pub fn from_config(config: &NotificationConfig) -> Self {
        Self {
            command: config.command.clone(),
            enabled: config.enabled,
        }
    }
}

#[async_trait]
impl NotificationSink for CommandNotifier {
    async fn notify(&self, title: &str, body: &str) {
        if !self.enabled {
            debug!("Notifications disabled, dropping: {}", title);
            return;
        }

        match Command::new(&self.command)
            .arg(title)
            .arg(body)
            .output()
            .await
        {
            Ok(output) if !output.status.success() => {
                warn!(
                    "Notification command exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to run notification command: {}", e),
        }
    }
}
