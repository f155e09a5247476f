//! Refresh Coordinator - fetch-join cycles over a [`GridSource`]
//!
//! One cycle fetches the four sections concurrently, waits for all of them,
//! aggregates the generation mix and writes one new snapshot into shared
//! state. Cycles may overlap. Each cycle takes a sequence number when it
//! starts, and when it finishes its result is only applied if no newer cycle
//! has been issued in the meantime (last issued wins).

use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::source::GridSource;
use super::state::{AppState, CycleStatus, DashboardSnapshot, Section};
use crate::acquisition::Parsed;
use crate::analysis::{aggregate_with_tolerance, GenerationSummary, MixStatus};
use crate::types::GenerationShare;

/// What happened to a cycle's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CycleOutcome {
    Applied { sequence: u64, status: CycleStatus },
    /// A newer cycle was issued before this one finished
    Discarded { sequence: u64, latest: u64 },
}

/// Aggregate a parsed generation payload. Entries dropped while parsing
/// count as rejected, so a payload where every entry was malformed reports
/// `NoUsableData` rather than `NoData`.
pub fn summarize_generation(parsed: &Parsed<GenerationShare>, tolerance: f64) -> GenerationSummary {
    let mut summary = aggregate_with_tolerance(&parsed.values, tolerance);
    summary.rejected += parsed.rejected;
    if summary.status == MixStatus::NoData && parsed.rejected > 0 {
        summary.status = MixStatus::NoUsableData;
    }
    summary
}

pub struct RefreshCoordinator {
    source: Arc<dyn GridSource>,
    state: Arc<RwLock<AppState>>,
    issued: AtomicU64,
    integrity_tolerance: f64,
}

impl RefreshCoordinator {
    pub fn new(
        source: Arc<dyn GridSource>,
        state: Arc<RwLock<AppState>>,
        integrity_tolerance: f64,
    ) -> Self {
        Self {
            source,
            state,
            issued: AtomicU64::new(0),
            integrity_tolerance,
        }
    }

    pub fn source(&self) -> &Arc<dyn GridSource> {
        &self.source
    }

    pub fn state(&self) -> &Arc<RwLock<AppState>> {
        &self.state
    }

    /// Highest sequence number handed out so far.
    pub fn latest_issued(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    /// Run one fetch-join cycle and apply it unless it has been superseded.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let sequence = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let started_at = Utc::now();
        {
            let mut state = self.state.write().await;
            state.cycles_started += 1;
            state.in_flight += 1;
            state.status = CycleStatus::Fetching;
        }
        info!(cycle = sequence, source = self.source.source_name(), "🔄 Refresh cycle started");

        let (current, forecast, regional, generation) = tokio::join!(
            self.source.current(),
            self.source.forecast(),
            self.source.regional(),
            self.source.generation(),
        );

        let generation =
            generation.map(|parsed| summarize_generation(&parsed, self.integrity_tolerance));

        let snapshot = DashboardSnapshot {
            sequence,
            started_at,
            completed_at: Utc::now(),
            current: Section::from_result(current),
            forecast: Section::from_result(forecast),
            regional: Section::from_result(regional),
            generation: Section::from_result(generation),
        };

        self.apply(snapshot).await
    }

    async fn apply(&self, snapshot: DashboardSnapshot) -> CycleOutcome {
        let sequence = snapshot.sequence;
        let mut state = self.state.write().await;
        state.in_flight = state.in_flight.saturating_sub(1);

        let latest = self.issued.load(Ordering::SeqCst);
        if sequence != latest {
            state.cycles_discarded += 1;
            warn!(cycle = sequence, latest, "Discarding superseded refresh cycle");
            return CycleOutcome::Discarded { sequence, latest };
        }

        let failed = snapshot.failed_sections();
        let reasons = || {
            [
                snapshot.current.failure().map(|r| format!("current: {r}")),
                snapshot.forecast.failure().map(|r| format!("forecast: {r}")),
                snapshot.regional.failure().map(|r| format!("regional: {r}")),
                snapshot.generation.failure().map(|r| format!("generation: {r}")),
            ]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("; ")
        };

        let status = if snapshot.all_failed() {
            let reason = reasons();
            error!(cycle = sequence, %reason, "Refresh cycle failed in every section");
            state.last_error = Some(reason);
            CycleStatus::Errored
        } else {
            if failed.is_empty() {
                state.last_error = None;
                info!(
                    cycle = sequence,
                    elapsed_ms = (snapshot.completed_at - snapshot.started_at).num_milliseconds(),
                    "✓ Refresh cycle complete"
                );
            } else {
                let reason = reasons();
                warn!(cycle = sequence, failed = ?failed, %reason, "Refresh cycle partially failed");
                state.last_error = Some(reason);
            }
            state.last_refresh = Some(snapshot.completed_at);
            state.snapshot = Some(Arc::new(snapshot));
            CycleStatus::Ready
        };

        state.status = status;
        state.cycles_applied += 1;
        CycleOutcome::Applied { sequence, status }
    }

    /// Timed refresh loop. Each tick spawns a cycle so a slow upstream never
    /// delays the timer. Returns when `cancel` fires; in-flight cycles are
    /// left to finish on their own.
    pub async fn run_periodic(
        self: Arc<Self>,
        period: Duration,
        run_on_start: bool,
        cancel: CancellationToken,
    ) {
        info!(interval_secs = period.as_secs(), "[Refresh] Task starting");

        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        if !run_on_start {
            // the first tick completes immediately
            interval.tick().await;
        }

        let mut triggered = 0u64;
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!(triggered, "[Refresh] Received shutdown signal");
                    return;
                }
                _ = interval.tick() => {
                    triggered += 1;
                    let this = Arc::clone(&self);
                    tokio::spawn(async move {
                        this.run_cycle().await;
                    });
                }
            }
        }
    }
}
