//! Assistant context builder
//!
//! Condenses one snapshot into a bounded [`AssistantContext`]. At most
//! `horizon` readings are looked at and every list has a fixed cap, so the
//! prompt size does not grow with the upstream response.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::analysis::forecast::format_slot;
use crate::analysis::{
    best_windows, forecast_summary, level_for_intensity, overnight_slice, period_average,
    summarize_regions, worst_windows, ForecastSummary, GenerationSummary, MixStatus,
    RegionalSummary,
};
use crate::config::AnalysisConfig;
use crate::storage::UserSettings;
use crate::types::{IntensityLevel, IntensityReading, RegionalEntry};

/// One forecast slot as the assistant sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedValue {
    pub from: DateTime<Utc>,
    /// Local "Mon 14:30" style label
    pub label: String,
    pub intensity: f64,
}

impl TimedValue {
    fn new(reading: &IntensityReading, tz: &Tz) -> Self {
        Self {
            from: reading.from,
            label: format_slot(reading.from, tz),
            intensity: reading.forecast,
        }
    }

    /// Local "HH:MM" without the weekday.
    pub fn clock(&self, tz: &Tz) -> String {
        self.from.with_timezone(tz).format("%H:%M").to_string()
    }
}

/// Cleanest and dirtiest slot of the first averaging period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlook {
    pub best: TimedValue,
    pub worst: TimedValue,
}

/// Everything the assistant is told about the grid. Never carries raw
/// readings beyond the capped lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantContext {
    pub generated_at: DateTime<Utc>,
    /// IANA zone used for every label below
    pub timezone: String,

    pub current_intensity: f64,
    pub current_level: IntensityLevel,

    pub generation_status: MixStatus,
    pub renewable_pct: f64,
    pub low_carbon_pct: f64,
    pub fossil_pct: f64,

    /// Readings considered (≤ horizon)
    pub forecast_points: usize,
    pub horizon: usize,
    pub period_length: usize,
    pub best: Vec<TimedValue>,
    pub worst: Vec<TimedValue>,
    pub next_period_avg: Option<f64>,
    pub following_period_avg: Option<f64>,
    pub overnight: Vec<TimedValue>,
    pub outlook: Option<Outlook>,
    pub summary: Option<ForecastSummary>,

    pub regional: Option<RegionalSummary>,

    pub assistant_configured: bool,
    pub location_enabled: bool,
}

impl AssistantContext {
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(chrono_tz::Europe::London)
    }

    pub fn has_forecast(&self) -> bool {
        self.forecast_points > 0
    }
}

/// Borrowed view of the snapshot sections the builder reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextInput<'a> {
    pub current: Option<&'a IntensityReading>,
    pub forecast: &'a [IntensityReading],
    pub generation: Option<&'a GenerationSummary>,
    pub regions: &'a [RegionalEntry],
}

/// Build the assistant context for `input` as of `now`.
pub fn build_context(
    input: &ContextInput<'_>,
    settings: &UserSettings,
    config: &AnalysisConfig,
    now: DateTime<Utc>,
) -> AssistantContext {
    let tz = config.tz();
    let horizon = &input.forecast[..input.forecast.len().min(config.horizon)];

    let current_intensity = input.current.map_or(0.0, IntensityReading::current_value);

    let (generation_status, renewable_pct, low_carbon_pct, fossil_pct) = input
        .generation
        .map_or((MixStatus::NoData, 0.0, 0.0, 0.0), |g| {
            (g.status, g.renewable_pct, g.low_carbon_pct, g.fossil_pct)
        });

    let labelled = |readings: Vec<&IntensityReading>| -> Vec<TimedValue> {
        readings.into_iter().map(|r| TimedValue::new(r, &tz)).collect()
    };

    let period = &horizon[..horizon.len().min(config.period_length)];
    let outlook = best_windows(period, 1)
        .first()
        .zip(worst_windows(period, 1).first())
        .map(|(best, worst)| Outlook {
            best: TimedValue::new(best, &tz),
            worst: TimedValue::new(worst, &tz),
        });

    AssistantContext {
        generated_at: now,
        timezone: tz.name().to_string(),
        current_intensity,
        current_level: level_for_intensity(current_intensity),
        generation_status,
        renewable_pct,
        low_carbon_pct,
        fossil_pct,
        forecast_points: horizon.len(),
        horizon: config.horizon,
        period_length: config.period_length,
        best: labelled(best_windows(horizon, config.best_count)),
        worst: labelled(worst_windows(horizon, config.worst_count)),
        next_period_avg: period_average(horizon, 0, config.period_length),
        following_period_avg: period_average(
            horizon,
            config.period_length,
            config.period_length.saturating_mul(2),
        ),
        overnight: labelled(overnight_slice(
            horizon,
            config.overnight_window(),
            config.overnight_limit,
            &tz,
        )),
        outlook,
        summary: forecast_summary(horizon, now.with_timezone(&tz).date_naive(), &tz),
        regional: summarize_regions(input.regions),
        assistant_configured: settings.is_configured(),
        location_enabled: settings.use_location(),
    }
}
