//! Risk level endpoints

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::AppState;

/// Current risk payload
#[derive(Debug, Serialize)]
pub struct CurrentRisk {
    pub level: &'static str,
    pub reasons: Vec<String>,
    pub timestamp_ms: u64,
    pub is_transition: bool,
}

/// GET /api/v1/risk/current
pub async fn get_current(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    let state = state.read().await;

    let payload = match &state.current {
        Some(assessment) => CurrentRisk {
            level: assessment.level.as_str(),
            reasons: assessment.reasons.iter().cloned().collect(),
            timestamp_ms: assessment.timestamp_ms,
            is_transition: assessment.is_transition,
        },
        // No tick has run yet
        None => CurrentRisk {
            level: "NORMAL",
            reasons: Vec::new(),
            timestamp_ms: 0,
            is_transition: false,
        },
    };

    Json(payload)
}

/// GET /api/v1/risk/history
pub async fn get_history(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    let state = state.read().await;
    let points: Vec<_> = state.history.iter().cloned().collect();
    Json(points)
}
