use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use cachewarmer_core::{DedupStats, PassReport, SanitizedConfig};

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Warmer status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub running: bool,
    /// Set once a stop was requested; the current item still finishes.
    pub stopping: bool,
    pub current_item: Option<String>,
    pub passes_completed: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub last_pass: Option<PassReport>,
    /// `None` when the dedup store could not be read.
    pub dedup: Option<DedupStats>,
}

/// Simple message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// Get warmer status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let status = state.status().await;
    Json(StatusResponse {
        running: status.running,
        stopping: state.stop_requested(),
        current_item: status.current_item,
        passes_completed: status.passes_completed,
        started_at: status.started_at,
        last_pass: status.last_pass,
        dedup: state.dedup_stats(),
    })
}

/// Request a graceful stop.
///
/// Takes effect at the next item boundary, or immediately while the
/// scheduler is waiting between passes.
pub async fn stop(State(state): State<Arc<AppState>>) -> (StatusCode, Json<MessageResponse>) {
    if state.request_stop() {
        info!("Stop requested via API");
        (
            StatusCode::ACCEPTED,
            Json(MessageResponse {
                message: "Stop requested".to_string(),
            }),
        )
    } else {
        (
            StatusCode::OK,
            Json(MessageResponse {
                message: "Already stopping".to_string(),
            }),
        )
    }
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state).await;
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
