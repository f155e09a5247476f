//! API route handlers
//!
//! Request handling logic for all API endpoints including:
//! - Service health and refresh-cycle status
//! - Snapshot sections and forecast analysis
//! - Assistant context, chat and credential management

mod assistant;
mod grid;
mod status;

pub use assistant::*;
pub use grid::*;
pub use status::*;

use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::envelope::{ApiError, ApiResponse};
use crate::config::DashboardConfig;
use crate::context::{build_context, AssistantContext};
use crate::llm::Assistant;
use crate::pipeline::{AppState, DashboardSnapshot, RefreshCoordinator, Section};
use crate::storage::{KeyValueStore, UserSettings};

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct DashboardState {
    /// Application state written by the refresh coordinator
    pub app_state: Arc<RwLock<AppState>>,
    /// Triggers manual cycles and on-demand historical fetches
    pub coordinator: Arc<RefreshCoordinator>,
    pub settings: Arc<RwLock<UserSettings>>,
    /// Backing store for `settings`
    pub store: Arc<dyn KeyValueStore>,
    pub config: Arc<DashboardConfig>,
    pub assistant: Arc<Assistant>,
}

impl DashboardState {
    pub fn new(
        coordinator: Arc<RefreshCoordinator>,
        store: Arc<dyn KeyValueStore>,
        settings: UserSettings,
        config: Arc<DashboardConfig>,
        assistant: Arc<Assistant>,
    ) -> Self {
        Self {
            app_state: Arc::clone(coordinator.state()),
            coordinator,
            settings: Arc::new(RwLock::new(settings)),
            store,
            config,
            assistant,
        }
    }

    /// Latest applied snapshot. The state lock is released before returning.
    pub async fn snapshot(&self) -> Option<Arc<DashboardSnapshot>> {
        self.app_state.read().await.snapshot.clone()
    }

    /// Owned copy of the current settings, so no lock is held across an
    /// assistant call.
    pub async fn settings_copy(&self) -> UserSettings {
        self.settings.read().await.clone()
    }

    /// Assistant context for the latest snapshot, or the neutral context
    /// when nothing has been fetched yet.
    pub async fn assistant_context(&self, settings: &UserSettings) -> AssistantContext {
        let snapshot = self.snapshot().await;
        let input = snapshot
            .as_deref()
            .map(DashboardSnapshot::context_input)
            .unwrap_or_default();
        build_context(&input, settings, &self.config.analysis, Utc::now())
    }
}

/// Respond with a loaded section, or 503 naming why it is missing.
///
/// `name` is the section key used in `failed_sections`.
fn section_response<'a, T, R>(
    snapshot: Option<&'a DashboardSnapshot>,
    name: &'static str,
    select: impl FnOnce(&'a DashboardSnapshot) -> &'a Section<T>,
    render: impl FnOnce(&'a T) -> R,
) -> Response
where
    T: 'a,
    R: Serialize,
{
    let Some(snapshot) = snapshot else {
        return ApiError::no_snapshot().into_response();
    };
    match select(snapshot) {
        Section::Loaded(value) => ApiResponse::from_snapshot(render(value), snapshot),
        section => ApiError::section_unavailable(snapshot, name, section.failure()).into_response(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::acquisition::Parsed;
    use crate::pipeline::GridSource;
    use crate::storage::MemoryStore;
    use crate::types::{GenerationShare, IntensityReading, RegionalEntry};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};

    /// Canned source returning a small fixed grid picture.
    pub struct CannedSource;

    pub fn reading(hour: i64, forecast: f64) -> IntensityReading {
        let base = Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap();
        let from = base + Duration::hours(hour);
        IntensityReading::new(from, from + Duration::minutes(30), forecast)
    }

    #[async_trait]
    impl GridSource for CannedSource {
        async fn current(&self) -> anyhow::Result<IntensityReading> {
            Ok(reading(0, 185.0).with_actual(182.0))
        }

        async fn forecast(&self) -> anyhow::Result<Vec<IntensityReading>> {
            Ok([120.0, 80.0, 300.0, 250.0]
                .iter()
                .enumerate()
                .map(|(i, v)| reading(i64::try_from(i).unwrap(), *v))
                .collect())
        }

        async fn regional(&self) -> anyhow::Result<Vec<RegionalEntry>> {
            anyhow::bail!("status 503 Service Unavailable")
        }

        async fn generation(&self) -> anyhow::Result<Parsed<GenerationShare>> {
            Ok(Parsed {
                values: vec![
                    GenerationShare::new("wind", 40.0),
                    GenerationShare::new("nuclear", 20.0),
                    GenerationShare::new("gas", 40.0),
                ],
                rejected: 0,
            })
        }

        async fn historical(&self) -> anyhow::Result<Vec<IntensityReading>> {
            Ok(vec![reading(-2, 210.0), reading(-1, 190.0)])
        }

        fn source_name(&self) -> &str {
            "canned"
        }
    }

    /// State wired to [`CannedSource`], an in-memory store and the given
    /// assistant.
    pub fn state_with(assistant: Assistant) -> DashboardState {
        let config = Arc::new(DashboardConfig::default());
        let coordinator = Arc::new(RefreshCoordinator::new(
            Arc::new(CannedSource),
            Arc::new(RwLock::new(AppState::default())),
            config.analysis.integrity_tolerance_pct,
        ));
        DashboardState::new(
            coordinator,
            Arc::new(MemoryStore::new()),
            UserSettings::default(),
            Arc::clone(&config),
            Arc::new(assistant),
        )
    }
}
