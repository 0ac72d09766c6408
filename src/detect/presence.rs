//! Edge-triggered meeting presence state machine.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::sampler::ProcessSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceState {
    Idle,
    MeetingActive,
}

impl PresenceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::MeetingActive => "meeting_active",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceEvent {
    MeetingStarted,
    MeetingEnded,
}

/// Debounces polled snapshots into discrete start/end transitions.
///
/// Events fire only on state edges: repeated present samples while a meeting
/// is active produce nothing. Ending requires `end_debounce` consecutive
/// not-present samples; the default of 1 ends the meeting on the first one.
pub struct PresenceMachine {
    state: PresenceState,
    end_debounce: u32,
    misses: u32,
}

impl PresenceMachine {
    pub fn new(end_debounce: u32) -> Self {
        Self {
            state: PresenceState::Idle,
            end_debounce: end_debounce.max(1),
            misses: 0,
        }
    }

    pub fn state(&self) -> PresenceState {
        self.state
    }

    /// Feed one snapshot, returning the transition it caused, if any.
    /// A sampler failure never reaches this method: errors skip the tick and
    /// leave both state and the debounce counter untouched.
    pub fn observe(&mut self, snapshot: &ProcessSnapshot) -> Option<PresenceEvent> {
        let present = snapshot.meeting_present();

        match (self.state, present) {
            (PresenceState::Idle, true) => {
                self.state = PresenceState::MeetingActive;
                self.misses = 0;
                Some(PresenceEvent::MeetingStarted)
            }
            (PresenceState::Idle, false) => None,
            (PresenceState::MeetingActive, true) => {
                self.misses = 0;
                None
            }
            (PresenceState::MeetingActive, false) => {
                self.misses += 1;
                if self.misses >= self.end_debounce {
                    self.state = PresenceState::Idle;
                    self.misses = 0;
                    Some(PresenceEvent::MeetingEnded)
                } else {
                    debug!(
                        "Presence miss {}/{} while meeting active",
                        self.misses, self.end_debounce
                    );
                    None
                }
            }
        }
    }
}

/// Thread-safe handle exposing the current presence state to API handlers.
#[derive(Clone)]
pub struct PresenceStatusHandle {
    inner: Arc<Mutex<PresenceState>>,
}

impl Default for PresenceStatusHandle {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(PresenceState::Idle)),
        }
    }
}

impl PresenceStatusHandle {
    pub async fn get(&self) -> PresenceState {
        *self.inner.lock().await
    }

    pub async fn set(&self, state: PresenceState) {
        *self.inner.lock().await = state;
    }
}
