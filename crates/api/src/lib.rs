//! Driver Risk Dashboard API
//!
//! REST surface for the monitoring dashboard plus the pipeline wiring that
//! feeds it: current risk level, rolling history, alert log, health.

use std::collections::VecDeque;
use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use alerting::AlertLog;
use risk_fusion::{RiskAssessment, RiskLevel};

pub mod config;
pub mod pipeline;
pub mod simulator;

mod routes;

/// Points kept in the rolling dashboard history
const HISTORY_POINTS: usize = 20;

/// Minimum spacing between history points (milliseconds)
const HISTORY_INTERVAL_MS: u64 = 1_000;

/// One point of the dashboard's risk trend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskPoint {
    pub timestamp_ms: u64,
    pub level: RiskLevel,
}

/// Application state shared across handlers and the fusion loop
pub struct AppState {
    /// Latest assessment from the fusion loop
    pub current: Option<RiskAssessment>,
    /// Rolling risk trend for the dashboard
    pub history: VecDeque<RiskPoint>,
    /// Session alert log
    pub alert_log: AlertLog,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Fusion ticks processed
    pub ticks: u64,
}

impl AppState {
    /// Create new application state
    pub fn new() -> Self {
        Self {
            current: None,
            history: VecDeque::with_capacity(HISTORY_POINTS),
            alert_log: AlertLog::new(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            ticks: 0,
        }
    }

    /// Record a fusion tick's assessment
    pub fn record(&mut self, assessment: RiskAssessment) {
        self.ticks += 1;

        let due = self.history.back().map_or(true, |p| {
            assessment.timestamp_ms.saturating_sub(p.timestamp_ms) >= HISTORY_INTERVAL_MS
        });
        if due {
            self.history.push_back(RiskPoint {
                timestamp_ms: assessment.timestamp_ms,
                level: assessment.level,
            });
            if self.history.len() > HISTORY_POINTS {
                self.history.pop_front();
            }
        }

        self.current = Some(assessment);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentStatus,
    pub metrics: SystemMetrics,
}

/// Component status
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub ocular: ComponentHealth,
    pub vitals: ComponentHealth,
    pub fusion: ComponentHealth,
}

/// Individual component health
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: String,
}

/// System metrics
#[derive(Debug, Serialize)]
pub struct SystemMetrics {
    pub tick_count: u64,
    pub alert_count: usize,
}

/// Create the application router
pub fn create_router(state: Arc<RwLock<AppState>>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/risk/current", get(routes::risk::get_current))
        .route("/api/v1/risk/history", get(routes::risk::get_history))
        .route("/api/v1/alerts", get(routes::alerts::get_alerts))
        .route("/api/v1/alerts/summary", get(routes::alerts::get_summary))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    let state = state.read().await;

    let degraded = |token: &str| {
        state
            .current
            .as_ref()
            .is_some_and(|a| a.reasons.contains(token))
    };
    let component = |down: bool| ComponentHealth {
        status: if down { "degraded" } else { "ok" }.to_string(),
    };

    let response = HealthResponse {
        status: "healthy".to_string(),
        timestamp: epoch_ms() / 1_000,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: ComponentStatus {
            ocular: component(degraded("ocular_absent") || degraded("no_signal")),
            vitals: component(degraded("vitals_stale") || degraded("no_signal")),
            fusion: component(state.current.is_none()),
        },
        metrics: SystemMetrics {
            tick_count: state.ticks,
            alert_count: state.alert_log.len(),
        },
    };

    Json(response)
}

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Run the server
pub async fn run_server(
    addr: &str,
    state: Arc<RwLock<AppState>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);

    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Current time as epoch milliseconds
pub fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn assessment(level: RiskLevel, ts: u64) -> RiskAssessment {
        RiskAssessment {
            level,
            reasons: BTreeSet::new(),
            timestamp_ms: ts,
            is_transition: false,
        }
    }

    #[test]
    fn test_history_is_rate_limited_and_capped() {
        let mut state = AppState::new();

        // Two ticks inside the same second collapse into one point
        state.record(assessment(RiskLevel::Normal, 0));
        state.record(assessment(RiskLevel::Normal, 100));
        assert_eq!(state.history.len(), 1);

        for i in 1..40u64 {
            state.record(assessment(RiskLevel::Normal, i * 1_000));
        }
        assert_eq!(state.history.len(), HISTORY_POINTS);
        assert_eq!(state.ticks, 41);
    }

    #[test]
    fn test_record_updates_current() {
        let mut state = AppState::new();
        state.record(assessment(RiskLevel::Warning, 5_000));
        assert_eq!(state.current.as_ref().unwrap().level, RiskLevel::Warning);
    }
}
