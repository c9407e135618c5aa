//! Health handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use wayfarer_core::GenerativeBackend;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
    pub model: String,
    /// Whether the generative backend answered its health check
    pub healthy: bool,
}

/// GET /api/health - Server status and backend reachability
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let ai = state.planner.ai();
    let info = ai.info();
    let healthy = ai.health_check().await;

    Json(HealthResponse {
        status: "ok",
        backend: info.backend.as_str(),
        model: info.model,
        healthy,
    })
}
