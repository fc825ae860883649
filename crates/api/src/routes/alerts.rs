//! Alert log endpoints

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use tokio::sync::RwLock;

use crate::AppState;

/// Alerts shown on the dashboard log view
const RECENT_ALERTS: usize = 10;

/// GET /api/v1/alerts
pub async fn get_alerts(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    let state = state.read().await;
    let alerts: Vec<_> = state.alert_log.recent(RECENT_ALERTS).to_vec();
    Json(alerts)
}

/// GET /api/v1/alerts/summary
pub async fn get_summary(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    let state = state.read().await;
    Json(state.alert_log.summary())
}
