//! Intensity readings and qualitative severity bands

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Intensity Reading
// ============================================================================

/// One half-hourly (or otherwise spaced) slot of national carbon intensity.
///
/// `forecast` is always present. `actual` is only reported for the current
/// and past periods. Sequences of readings are ordered by `from` ascending
/// when they leave the acquisition layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityReading {
    /// Slot start (UTC)
    pub from: DateTime<Utc>,
    /// Slot end (UTC)
    pub to: DateTime<Utc>,
    /// Forecast intensity in gCO₂/kWh
    pub forecast: f64,
    /// Measured intensity in gCO₂/kWh, when the slot has already happened
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<f64>,
    /// Upstream qualitative label ("low", "moderate", ...), display only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
}

impl IntensityReading {
    pub const fn new(from: DateTime<Utc>, to: DateTime<Utc>, forecast: f64) -> Self {
        Self {
            from,
            to,
            forecast,
            actual: None,
            index: None,
        }
    }

    #[must_use]
    pub const fn with_actual(mut self, actual: f64) -> Self {
        self.actual = Some(actual);
        self
    }

    /// Best available value for "right now": the measured intensity when the
    /// upstream has one, otherwise the forecast.
    pub fn current_value(&self) -> f64 {
        self.actual.unwrap_or(self.forecast)
    }
}

// ============================================================================
// Intensity Level
// ============================================================================

/// Five ordered severity bands over gCO₂/kWh.
///
/// Cut points are closed-below / open-above: Very Low (<100), Low (<200),
/// Moderate (<300), High (<400), Very High (≥400). The same bands drive the
/// dashboard colours and the assistant's qualitative wording.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IntensityLevel {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl IntensityLevel {
    /// All bands, lowest first.
    pub const ALL: [Self; 5] = [
        Self::VeryLow,
        Self::Low,
        Self::Moderate,
        Self::High,
        Self::VeryHigh,
    ];

    /// Human-readable band name.
    pub const fn label(self) -> &'static str {
        match self {
            Self::VeryLow => "Very Low",
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }

    /// Short usage advice shown next to the band.
    pub const fn description(self) -> &'static str {
        match self {
            Self::VeryLow => "Excellent time to use electricity",
            Self::Low => "Good time to use electricity",
            Self::Moderate => "Average carbon intensity",
            Self::High => "Consider reducing usage",
            Self::VeryHigh => "Avoid high energy usage",
        }
    }

    /// Lower bound of the band (inclusive), in gCO₂/kWh.
    pub const fn lower_bound(self) -> f64 {
        match self {
            Self::VeryLow => f64::NEG_INFINITY,
            Self::Low => 100.0,
            Self::Moderate => 200.0,
            Self::High => 300.0,
            Self::VeryHigh => 400.0,
        }
    }
}

impl std::fmt::Display for IntensityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
