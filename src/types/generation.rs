//! Generation mix shares and fuel classification results

use serde::{Deserialize, Serialize};

/// One fuel's share of a generation-mix snapshot.
///
/// The fuel label is compared case-insensitively everywhere. A full
/// snapshot should sum to roughly 100%, but upstream rounding and partial
/// data mean that is flagged rather than enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationShare {
    pub fuel: String,
    pub percentage: f64,
}

impl GenerationShare {
    pub fn new(fuel: impl Into<String>, percentage: f64) -> Self {
        Self {
            fuel: fuel.into(),
            percentage,
        }
    }
}

/// Result of classifying a fuel label.
///
/// `is_low_carbon` is always true when `is_renewable` is. Labels outside
/// the fixed vocabulary classify as neither.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelClass {
    pub is_renewable: bool,
    pub is_low_carbon: bool,
}
