//! Grid data endpoints: snapshot sections, forecast analysis, history

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use super::{section_response, DashboardState};
use crate::analysis::{
    best_windows, forecast_summary, level_for_intensity, overnight_slice, period_average,
    range_stats, summarize_regions, worst_windows, ForecastSummary, RangeStats, RegionalSummary,
};
use crate::api::envelope::{ApiError, ApiResponse};
use crate::config::defaults::{CHART_WINDOW, HISTORICAL_DISPLAY_WINDOW};
use crate::types::{IntensityLevel, IntensityReading, RegionalEntry};

/// GET /api/v1/snapshot - The whole latest snapshot, failed sections included
pub async fn get_snapshot(State(state): State<DashboardState>) -> Response {
    match state.snapshot().await {
        Some(snapshot) => ApiResponse::from_snapshot(&*snapshot, &snapshot),
        None => ApiError::no_snapshot().into_response(),
    }
}

// ============================================================================
// Current Intensity
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CurrentResponse<'a> {
    pub reading: &'a IntensityReading,
    /// Actual when reported, otherwise forecast
    pub value: f64,
    pub level: IntensityLevel,
    pub level_label: &'static str,
}

/// GET /api/v1/current - Current national intensity and its band
pub async fn get_current(State(state): State<DashboardState>) -> Response {
    let snapshot = state.snapshot().await;
    section_response(snapshot.as_deref(), "current", |s| &s.current, |reading| {
        let value = reading.current_value();
        let level = level_for_intensity(value);
        CurrentResponse {
            reading,
            value,
            level,
            level_label: level.label(),
        }
    })
}

// ============================================================================
// Forecast
// ============================================================================

/// GET /api/v1/forecast - Forecast readings in time order
pub async fn get_forecast(State(state): State<DashboardState>) -> Response {
    let snapshot = state.snapshot().await;
    section_response(snapshot.as_deref(), "forecast", |s| &s.forecast, |readings| readings)
}

#[derive(Debug, Serialize)]
pub struct ForecastAnalysisResponse<'a> {
    pub points: usize,
    /// Low/high over the first chart window ("today" cards)
    pub chart_range: Option<RangeStats>,
    pub best: Vec<&'a IntensityReading>,
    pub worst: Vec<&'a IntensityReading>,
    pub next_period_avg: Option<f64>,
    pub following_period_avg: Option<f64>,
    pub overnight: Vec<&'a IntensityReading>,
    pub range: Option<RangeStats>,
    pub summary: Option<ForecastSummary>,
}

/// GET /api/v1/forecast/analysis - Best/worst windows, period averages and
/// the overnight slice over the whole forecast
pub async fn get_forecast_analysis(State(state): State<DashboardState>) -> Response {
    let snapshot = state.snapshot().await;
    let analysis = &state.config.analysis;
    let tz = analysis.tz();
    let today = Utc::now().with_timezone(&tz).date_naive();

    section_response(snapshot.as_deref(), "forecast", |s| &s.forecast, |readings| {
        ForecastAnalysisResponse {
            points: readings.len(),
            chart_range: range_stats(&readings[..readings.len().min(CHART_WINDOW)]),
            best: best_windows(readings, analysis.best_count),
            worst: worst_windows(readings, analysis.worst_count),
            next_period_avg: period_average(readings, 0, analysis.period_length),
            following_period_avg: period_average(
                readings,
                analysis.period_length,
                analysis.period_length.saturating_mul(2),
            ),
            overnight: overnight_slice(
                readings,
                analysis.overnight_window(),
                analysis.overnight_limit,
                &tz,
            ),
            range: range_stats(readings),
            summary: forecast_summary(readings, today, &tz),
        }
    })
}

// ============================================================================
// Generation Mix and Regions
// ============================================================================

/// GET /api/v1/generation - Aggregated generation mix
pub async fn get_generation(State(state): State<DashboardState>) -> Response {
    let snapshot = state.snapshot().await;
    section_response(snapshot.as_deref(), "generation", |s| &s.generation, |summary| summary)
}

#[derive(Debug, Serialize)]
pub struct RegionalResponse<'a> {
    pub regions: &'a [RegionalEntry],
    pub summary: Option<RegionalSummary>,
}

/// GET /api/v1/regional - Regional entries with cleanest/dirtiest ranking
pub async fn get_regional(State(state): State<DashboardState>) -> Response {
    let snapshot = state.snapshot().await;
    section_response(snapshot.as_deref(), "regional", |s| &s.regional, |regions| {
        RegionalResponse {
            regions,
            summary: summarize_regions(regions),
        }
    })
}

// ============================================================================
// Historical
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HistoricalResponse {
    pub readings: Vec<IntensityReading>,
    pub range: Option<RangeStats>,
}

/// GET /api/v1/historical - Past readings, fetched from upstream on request
///
/// Only the most recent slots that fit the display window are returned.
pub async fn get_historical(State(state): State<DashboardState>) -> Response {
    match state.coordinator.source().historical().await {
        Ok(mut readings) => {
            let excess = readings.len().saturating_sub(HISTORICAL_DISPLAY_WINDOW);
            readings.drain(..excess);
            let range = range_stats(&readings);
            ApiResponse::ok(HistoricalResponse { readings, range })
        }
        Err(e) => {
            warn!(error = %e, "Historical fetch failed");
            ApiError::upstream(format!("Historical data unavailable: {e:#}")).into_response()
        }
    }
}
