//! Regional (DNO area) intensity entries

use serde::{Deserialize, Serialize};

use super::GenerationShare;

/// One distribution-network-operator region in a regional snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalEntry {
    pub region_id: u32,
    /// Full DNO name, e.g. "Scottish Hydro Electric Power Distribution"
    pub region_name: String,
    /// Short display name, e.g. "North Scotland"
    pub short_name: String,
    /// Forecast intensity for the region in gCO₂/kWh
    pub forecast_intensity: f64,
    /// Upstream qualitative label, display only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    /// Regional generation mix (may be empty)
    #[serde(default)]
    pub generation_mix: Vec<GenerationShare>,
}
