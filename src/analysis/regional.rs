//! Regional comparison over a DNO snapshot

use serde::{Deserialize, Serialize};

use super::classification::level_for_intensity;
use crate::types::{IntensityLevel, RegionalEntry};

/// Condensed view of one region for ranking output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRegion {
    pub region_id: u32,
    pub short_name: String,
    pub forecast_intensity: f64,
    pub level: IntensityLevel,
}

impl From<&RegionalEntry> for RankedRegion {
    fn from(entry: &RegionalEntry) -> Self {
        Self {
            region_id: entry.region_id,
            short_name: entry.short_name.clone(),
            forecast_intensity: entry.forecast_intensity,
            level: level_for_intensity(entry.forecast_intensity),
        }
    }
}

/// Cleanest / dirtiest region plus national mean and spread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalSummary {
    pub cleanest: RankedRegion,
    pub dirtiest: RankedRegion,
    pub average_intensity: f64,
    /// dirtiest minus cleanest, gCO₂/kWh
    pub spread: f64,
    /// All regions, cleanest first (stable for ties)
    pub ranking: Vec<RankedRegion>,
}

/// Rank a regional snapshot. `None` for an empty snapshot.
#[allow(clippy::cast_precision_loss)]
pub fn summarize_regions(regions: &[RegionalEntry]) -> Option<RegionalSummary> {
    let mut ranking: Vec<RankedRegion> = regions.iter().map(RankedRegion::from).collect();
    ranking.sort_by(|a, b| a.forecast_intensity.total_cmp(&b.forecast_intensity));

    let cleanest = ranking.first()?.clone();
    let dirtiest = ranking.last()?.clone();
    let sum: f64 = ranking.iter().map(|r| r.forecast_intensity).sum();

    Some(RegionalSummary {
        spread: dirtiest.forecast_intensity - cleanest.forecast_intensity,
        average_intensity: sum / ranking.len() as f64,
        cleanest,
        dirtiest,
        ranking,
    })
}
