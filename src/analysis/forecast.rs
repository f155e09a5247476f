//! Forecast analyzer
//!
//! Pure functions over an ordered sequence of [`IntensityReading`]s. Only the
//! `forecast` value and the `from` timestamp are used; no fixed slot length
//! is assumed. Every operation returns an empty/neutral result for empty
//! input.

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::types::IntensityReading;

// ============================================================================
// Best / Worst Windows
// ============================================================================

/// Stable ascending sort by forecast. Ties keep their original order.
fn sorted_ascending(readings: &[IntensityReading]) -> Vec<&IntensityReading> {
    let mut sorted: Vec<&IntensityReading> = readings.iter().collect();
    sorted.sort_by(|a, b| a.forecast.total_cmp(&b.forecast));
    sorted
}

/// The `k` lowest-forecast readings, cleanest first.
pub fn best_windows(readings: &[IntensityReading], k: usize) -> Vec<&IntensityReading> {
    let mut sorted = sorted_ascending(readings);
    sorted.truncate(k);
    sorted
}

/// The `k` highest-forecast readings, dirtiest first.
///
/// Built from the same stable ascending sort as [`best_windows`], taking the
/// tail and reversing it, so `worst_windows(r, r.len())` is exactly
/// `best_windows(r, r.len())` reversed.
pub fn worst_windows(readings: &[IntensityReading], k: usize) -> Vec<&IntensityReading> {
    let sorted = sorted_ascending(readings);
    let start = sorted.len().saturating_sub(k);
    sorted[start..].iter().rev().copied().collect()
}

// ============================================================================
// Period Averages
// ============================================================================

/// Mean forecast over the half-open index range `start..end`.
///
/// The range is clamped to the slice. Returns `None` ("unavailable") when
/// nothing is left after clamping.
#[allow(clippy::cast_precision_loss)]
pub fn period_average(readings: &[IntensityReading], start: usize, end: usize) -> Option<f64> {
    let end = end.min(readings.len());
    if start >= end {
        return None;
    }
    let window = &readings[start..end];
    let sum: f64 = window.iter().map(|r| r.forecast).sum();
    Some(sum / window.len() as f64)
}

/// Min / max / mean of the forecast values in a slice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub count: usize,
}

/// Summary statistics for the "low / high / average" cards.
pub fn range_stats(readings: &[IntensityReading]) -> Option<RangeStats> {
    let mean = period_average(readings, 0, readings.len())?;
    let (min, max) = readings
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
            (lo.min(r.forecast), hi.max(r.forecast))
        });
    Some(RangeStats {
        min,
        max,
        mean,
        count: readings.len(),
    })
}

// ============================================================================
// Overnight Slice
// ============================================================================

/// Local hour-of-day window, inclusive at both ends.
///
/// When `start_hour > end_hour` the window wraps midnight and membership is
/// `hour >= start || hour <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for HourWindow {
    fn default() -> Self {
        Self {
            start_hour: 23,
            end_hour: 6,
        }
    }
}

impl HourWindow {
    pub const fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    pub const fn contains(&self, hour: u32) -> bool {
        if self.start_hour > self.end_hour {
            hour >= self.start_hour || hour <= self.end_hour
        } else {
            hour >= self.start_hour && hour <= self.end_hour
        }
    }
}

/// Readings whose local start hour falls in `window`, in original order,
/// truncated to `limit`.
pub fn overnight_slice<'a>(
    readings: &'a [IntensityReading],
    window: HourWindow,
    limit: usize,
    tz: &Tz,
) -> Vec<&'a IntensityReading> {
    readings
        .iter()
        .filter(|r| window.contains(r.from.with_timezone(tz).hour()))
        .take(limit)
        .collect()
}

// ============================================================================
// Forecast Summary
// ============================================================================

/// Format a slot start as "Mon 14:30" in the given zone.
pub fn format_slot(from: DateTime<Utc>, tz: &Tz) -> String {
    from.with_timezone(tz).format("%a %H:%M").to_string()
}

/// Label a slot start relative to `today`: "Today 14:30", "Tomorrow 02:00",
/// or "Sat 18:00" for anything else.
pub fn relative_label(from: DateTime<Utc>, today: NaiveDate, tz: &Tz) -> String {
    let local = from.with_timezone(tz);
    let time = local.format("%H:%M");
    let date = local.date_naive();
    if date == today {
        format!("Today {time}")
    } else if Some(date) == today.checked_add_signed(Duration::days(1)) {
        format!("Tomorrow {time}")
    } else {
        format!("{} {time}", local.format("%a"))
    }
}

/// A single annotated forecast point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelledPoint {
    pub from: DateTime<Utc>,
    pub label: String,
    pub forecast: f64,
}

impl LabelledPoint {
    fn new(reading: &IntensityReading, today: NaiveDate, tz: &Tz) -> Self {
        Self {
            from: reading.from,
            label: relative_label(reading.from, today, tz),
            forecast: reading.forecast,
        }
    }
}

/// Best and worst single points of a forecast, labelled for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub best: LabelledPoint,
    pub worst: LabelledPoint,
}

impl ForecastSummary {
    /// Two-line text used in the welcome message and `snapshot` output.
    pub fn to_text(&self) -> String {
        format!(
            "📈 Best: {} ({} gCO₂/kWh)\n📉 Worst: {} ({} gCO₂/kWh)",
            self.best.label, self.best.forecast, self.worst.label, self.worst.forecast
        )
    }
}

/// Best/worst annotation relative to the caller's current date. `None` when
/// there are no readings.
pub fn forecast_summary(
    readings: &[IntensityReading],
    today: NaiveDate,
    tz: &Tz,
) -> Option<ForecastSummary> {
    let best = best_windows(readings, 1).into_iter().next()?;
    let worst = worst_windows(readings, 1).into_iter().next()?;
    Some(ForecastSummary {
        best: LabelledPoint::new(best, today, tz),
        worst: LabelledPoint::new(worst, today, tz),
    })
}
