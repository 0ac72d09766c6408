//! Recording session lifecycle.
//!
//! The machine owns at most one active capture session and is driven by a
//! single command loop, so start/stop requests are processed strictly one
//! at a time.

pub mod machine;
pub mod session;

pub use machine::{RecorderCommand, RecorderPhase, RecorderStatusHandle, RecordingMachine};
pub use session::{RecordingSession, SessionStatus};
