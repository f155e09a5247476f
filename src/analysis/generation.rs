//! Generation-mix aggregator
//!
//! Turns one generation-mix snapshot into the renewable / low-carbon / fossil
//! cards, a display ordering and an integrity flag. Invalid entries are
//! dropped and counted, never fatal.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::classification::{classify_fuel, is_fossil};
use crate::config::defaults::INTEGRITY_TOLERANCE_PCT;
use crate::types::GenerationShare;

/// Whether a snapshot produced usable aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixStatus {
    /// At least one valid share was aggregated.
    Available,
    /// The upstream returned no entries at all.
    NoData,
    /// The upstream returned entries, but none survived validation.
    NoUsableData,
}

/// Aggregated view of a generation-mix snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub status: MixStatus,
    pub renewable_pct: f64,
    pub low_carbon_pct: f64,
    pub fossil_pct: f64,
    pub total_pct: f64,
    /// `|total_pct - 100|` exceeded the tolerance
    pub integrity_warning: bool,
    /// Valid shares, highest percentage first (stable for ties)
    pub shares: Vec<GenerationShare>,
    /// Number of entries dropped by validation
    pub rejected: usize,
}

impl GenerationSummary {
    fn empty(status: MixStatus, rejected: usize) -> Self {
        Self {
            status,
            renewable_pct: 0.0,
            low_carbon_pct: 0.0,
            fossil_pct: 0.0,
            total_pct: 0.0,
            integrity_warning: false,
            shares: Vec::new(),
            rejected,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == MixStatus::Available
    }
}

/// A share is usable when its label is non-blank and its percentage finite.
pub fn is_valid_share(share: &GenerationShare) -> bool {
    !share.fuel.trim().is_empty() && share.percentage.is_finite()
}

/// Aggregate with the default ±5 point integrity tolerance.
pub fn aggregate(shares: &[GenerationShare]) -> GenerationSummary {
    aggregate_with_tolerance(shares, INTEGRITY_TOLERANCE_PCT)
}

/// Aggregate a snapshot, flagging totals further than `tolerance` points
/// from 100.
pub fn aggregate_with_tolerance(shares: &[GenerationShare], tolerance: f64) -> GenerationSummary {
    if shares.is_empty() {
        return GenerationSummary::empty(MixStatus::NoData, 0);
    }

    let valid: Vec<GenerationShare> = shares
        .iter()
        .filter(|share| {
            let ok = is_valid_share(share);
            if !ok {
                debug!(fuel = %share.fuel, percentage = share.percentage, "Dropping invalid generation share");
            }
            ok
        })
        .cloned()
        .collect();

    let rejected = shares.len() - valid.len();
    if valid.is_empty() {
        return GenerationSummary::empty(MixStatus::NoUsableData, rejected);
    }

    let mut renewable_pct = 0.0;
    let mut low_carbon_pct = 0.0;
    let mut fossil_pct = 0.0;
    let mut total_pct = 0.0;
    for share in &valid {
        let class = classify_fuel(&share.fuel);
        if class.is_renewable {
            renewable_pct += share.percentage;
        }
        if class.is_low_carbon {
            low_carbon_pct += share.percentage;
        }
        if is_fossil(&share.fuel) {
            fossil_pct += share.percentage;
        }
        total_pct += share.percentage;
    }

    let mut sorted = valid;
    sorted.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));

    GenerationSummary {
        status: MixStatus::Available,
        renewable_pct,
        low_carbon_pct,
        fossil_pct,
        total_pct,
        integrity_warning: (total_pct - 100.0).abs() > tolerance,
        shares: sorted,
        rejected,
    }
}
