//! Service state endpoints: health, status, manual refresh

use axum::extract::State;
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::DashboardState;
use crate::api::envelope::ApiResponse;
use crate::llm::AssistantStats;
use crate::pipeline::CycleStatus;
use crate::storage::KeySource;

// ============================================================================
// Health Endpoint
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok" while the server answers
    pub status: &'static str,
    pub cycle_status: CycleStatus,
    pub has_data: bool,
    pub uptime_secs: u64,
}

/// GET /api/v1/health - Liveness plus whether any data is loaded
pub async fn get_health(State(state): State<DashboardState>) -> Response {
    let app_state = state.app_state.read().await;
    ApiResponse::ok(HealthResponse {
        status: "ok",
        cycle_status: app_state.status,
        has_data: app_state.snapshot.is_some(),
        uptime_secs: app_state.uptime_secs(),
    })
}

// ============================================================================
// Status Endpoint
// ============================================================================

#[derive(Debug, Serialize)]
pub struct AssistantStatus {
    pub configured: bool,
    pub key_source: KeySource,
    pub model: String,
    pub stats: AssistantStats,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub cycle_status: CycleStatus,
    /// Sequence number of the snapshot currently served
    pub snapshot_sequence: Option<u64>,
    /// Highest sequence number issued so far
    pub latest_issued: u64,
    pub cycles_started: u64,
    pub cycles_applied: u64,
    pub cycles_discarded: u64,
    pub in_flight: u32,
    pub failed_sections: Vec<&'static str>,
    pub last_refresh: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub refresh_interval_secs: u64,
    pub source: String,
    pub timezone: String,
    pub assistant: AssistantStatus,
    pub uptime_secs: u64,
}

/// GET /api/v1/status - Refresh-cycle bookkeeping and assistant state
pub async fn get_status(State(state): State<DashboardState>) -> Response {
    let settings = state.settings_copy().await;
    let app_state = state.app_state.read().await;

    let snapshot = app_state.snapshot.as_deref();
    ApiResponse::ok(StatusResponse {
        cycle_status: app_state.status,
        snapshot_sequence: snapshot.map(|s| s.sequence),
        latest_issued: state.coordinator.latest_issued(),
        cycles_started: app_state.cycles_started,
        cycles_applied: app_state.cycles_applied,
        cycles_discarded: app_state.cycles_discarded,
        in_flight: app_state.in_flight,
        failed_sections: snapshot.map(|s| s.failed_sections()).unwrap_or_default(),
        last_refresh: app_state.last_refresh,
        last_error: app_state.last_error.clone(),
        refresh_interval_secs: state.config.refresh.interval_secs,
        source: state.coordinator.source().source_name().to_string(),
        timezone: state.config.analysis.timezone.clone(),
        assistant: AssistantStatus {
            configured: settings.is_configured(),
            key_source: settings.key_source(),
            model: state.config.assistant.model.clone(),
            stats: state.assistant.stats(),
        },
        uptime_secs: app_state.uptime_secs(),
    })
}

// ============================================================================
// Manual Refresh
// ============================================================================

/// POST /api/v1/refresh - Run one cycle now and report what happened to it
///
/// The cycle may be superseded by a timed cycle issued while it runs, in
/// which case the response says `discarded`.
pub async fn trigger_refresh(State(state): State<DashboardState>) -> Response {
    info!("Manual refresh requested");
    let outcome = state.coordinator.run_cycle().await;
    ApiResponse::ok(outcome)
}
