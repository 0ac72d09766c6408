//! REST API server for meetwatch.
//!
//! Provides HTTP endpoints for:
//! - Service and recording status (GET /status)
//! - Manual recording control (POST /start, POST /stop)

pub mod error;
pub mod routes;

use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tracing::info;

pub use routes::control::ControlState;

pub struct ApiServer {
    port: u16,
    control_state: ControlState,
}

impl ApiServer {
    pub fn new(port: u16, control_state: ControlState) -> Self {
        Self {
            port,
            control_state,
        }
    }

    pub async fn start(self) -> Result<()> {
        let app = Router::new()
            .route("/", get(service_info))
            .route("/version", get(version))
            .merge(routes::control::router(self.control_state))
            .layer(ServiceBuilder::new());

        let listener = tokio::net::TcpListener::bind(&format!("127.0.0.1:{}", self.port)).await?;

        info!("API server listening on http://127.0.0.1:{}", self.port);
        info!("Endpoints:");
        info!("  GET  /         - Service info");
        info!("  GET  /version  - Version info");
        info!("  GET  /status   - Presence and recording status");
        info!("  POST /start    - Start recording manually");
        info!("  POST /stop     - Stop recording manually");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn service_info() -> Json<Value> {
    Json(json!({
        "service": "meetwatch",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "meetwatch"
    }))
}
