//! Application State and Refresh Status
//!
//! Shared state for the dashboard, read by API handlers and written by the
//! refresh coordinator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::analysis::GenerationSummary;
use crate::context::ContextInput;
use crate::types::{IntensityReading, RegionalEntry};

// ============================================================================
// Sections
// ============================================================================

/// One independently fetched part of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Section<T> {
    /// Not fetched yet
    Pending,
    Loaded(T),
    Failed { reason: String },
}

impl<T> Section<T> {
    pub fn from_result(result: anyhow::Result<T>) -> Self {
        match result {
            Ok(value) => Self::Loaded(value),
            Err(e) => Self::Failed {
                reason: format!("{e:#}"),
            },
        }
    }

    pub const fn as_loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Result of one fetch-join cycle. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    /// Cycle sequence number that produced this snapshot
    pub sequence: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub current: Section<IntensityReading>,
    pub forecast: Section<Vec<IntensityReading>>,
    pub regional: Section<Vec<RegionalEntry>>,
    pub generation: Section<GenerationSummary>,
}

impl DashboardSnapshot {
    /// Names of the sections that failed in this cycle.
    pub fn failed_sections(&self) -> Vec<&'static str> {
        [
            ("current", self.current.is_failed()),
            ("forecast", self.forecast.is_failed()),
            ("regional", self.regional.is_failed()),
            ("generation", self.generation.is_failed()),
        ]
        .into_iter()
        .filter_map(|(name, failed)| failed.then_some(name))
        .collect()
    }

    pub fn all_failed(&self) -> bool {
        self.failed_sections().len() == 4
    }

    /// Borrowed view for the context builder. Failed sections read as empty.
    pub fn context_input(&self) -> ContextInput<'_> {
        ContextInput {
            current: self.current.as_loaded(),
            forecast: self.forecast.as_loaded().map(Vec::as_slice).unwrap_or_default(),
            generation: self.generation.as_loaded(),
            regions: self.regional.as_loaded().map(Vec::as_slice).unwrap_or_default(),
        }
    }
}

// ============================================================================
// Application State
// ============================================================================

/// Refresh cycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    /// No cycle has run yet
    Idle,
    /// At least one cycle is in flight
    Fetching,
    /// Latest applied cycle produced at least one section
    Ready,
    /// Latest applied cycle failed in every section
    Errored,
}

impl std::fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Fetching => write!(f, "Fetching"),
            Self::Ready => write!(f, "Ready"),
            Self::Errored => write!(f, "Errored"),
        }
    }
}

/// Shared application state accessible from API handlers and the refresh
/// coordinator.
///
/// This struct is wrapped in `Arc<RwLock<>>` for thread-safe access across
/// the async runtime.
#[derive(Debug, Clone)]
pub struct AppState {
    pub status: CycleStatus,

    /// Latest applied snapshot. An all-failed cycle does not replace it.
    pub snapshot: Option<Arc<DashboardSnapshot>>,

    pub uptime: Instant,

    pub cycles_started: u64,
    pub cycles_applied: u64,
    /// Cycles whose results arrived after a newer cycle was issued
    pub cycles_discarded: u64,
    pub in_flight: u32,

    pub last_refresh: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            status: CycleStatus::Idle,
            snapshot: None,
            uptime: Instant::now(),
            cycles_started: 0,
            cycles_applied: 0,
            cycles_discarded: 0,
            in_flight: 0,
            last_refresh: None,
            last_error: None,
        }
    }
}

impl AppState {
    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.uptime.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with(current: Section<IntensityReading>) -> DashboardSnapshot {
        DashboardSnapshot {
            sequence: 1,
            started_at: Utc::now(),
            completed_at: Utc::now(),
            current,
            forecast: Section::Failed {
                reason: "timeout".to_string(),
            },
            regional: Section::Failed {
                reason: "timeout".to_string(),
            },
            generation: Section::Failed {
                reason: "timeout".to_string(),
            },
        }
    }

    #[test]
    fn test_failed_sections() {
        let all = snapshot_with(Section::Failed {
            reason: "dns".to_string(),
        });
        assert!(all.all_failed());

        let partial = snapshot_with(Section::Pending);
        assert!(!partial.all_failed());
        assert_eq!(partial.failed_sections(), vec!["forecast", "regional", "generation"]);
    }

    #[test]
    fn test_failed_sections_read_as_empty() {
        let snapshot = snapshot_with(Section::Pending);
        let input = snapshot.context_input();
        assert!(input.current.is_none());
        assert!(input.forecast.is_empty());
        assert!(input.regions.is_empty());
        assert!(input.generation.is_none());
    }

    #[test]
    fn test_section_serialization() {
        let loaded: Section<u32> = Section::Loaded(7);
        assert_eq!(
            serde_json::to_value(&loaded).unwrap(),
            serde_json::json!({"status": "loaded", "data": 7})
        );
        let failed: Section<u32> = Section::from_result(Err(anyhow::anyhow!("boom")));
        assert_eq!(failed.failure(), Some("boom"));
    }
}
