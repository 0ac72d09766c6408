//! Recording control endpoints.
//!
//! The manual trigger path: start/stop requests are forwarded over the same
//! command channel the presence edges use, so the controller sees one
//! serialized stream of commands regardless of origin.

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::api::error::{ApiError, ApiResult};
use crate::detect::PresenceStatusHandle;
use crate::recorder::{RecorderCommand, RecorderStatusHandle};

#[derive(Clone)]
pub struct ControlState {
    pub tx: mpsc::Sender<RecorderCommand>,
    pub recorder: RecorderStatusHandle,
    pub presence: PresenceStatusHandle,
}

pub fn router(state: ControlState) -> Router {
    Router::new()
        .route("/status", get(service_status))
        .route("/start", post(start_recording))
        .route("/stop", post(stop_recording))
        .with_state(state)
}

async fn service_status(State(state): State<ControlState>) -> Json<Value> {
    let recorder = state.recorder.get().await;
    let presence = state.presence.get().await;

    Json(json!({
        "presence": presence.as_str(),
        "recorder": {
            "phase": recorder.phase.as_str(),
            "session_id": recorder.session_id.map(|id| id.to_string()),
            "output_path": recorder.output_path,
            "started_at": recorder.started_at.map(|t| t.to_rfc3339()),
            "last_error": recorder.last_error,
        },
    }))
}

async fn start_recording(State(state): State<ControlState>) -> ApiResult<Json<Value>> {
    send_command(&state, RecorderCommand::Start).await
}

async fn stop_recording(State(state): State<ControlState>) -> ApiResult<Json<Value>> {
    send_command(&state, RecorderCommand::Stop).await
}

async fn send_command(state: &ControlState, command: RecorderCommand) -> ApiResult<Json<Value>> {
    info!("Received {:?} command via API", command);

    match state.tx.send(command).await {
        Ok(_) => {
            // Small delay to allow the status to be updated
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

            let status = state.recorder.get().await;
            Ok(Json(json!({
                "success": true,
                "phase": status.phase.as_str(),
                "session_id": status.session_id.map(|id| id.to_string()),
            })))
        }
        Err(e) => {
            error!("Failed to forward {:?} command: {}", command, e);
            Err(ApiError::internal("recording controller is unavailable"))
        }
    }
}
