//! Analysis core
//!
//! Pure, deterministic functions over one immutable snapshot:
//! - `classification`: fuel classes and the five intensity bands
//! - `forecast`: best/worst windows, period averages, overnight slice, summaries
//! - `generation`: generation-mix aggregates and integrity check
//! - `regional`: cleanest/dirtiest region ranking
//!
//! Nothing here performs I/O or holds state, so running the same snapshot
//! through twice always yields identical output.

pub mod classification;
pub mod forecast;
pub mod generation;
pub mod regional;

pub use classification::{classify_fuel, is_fossil, level_for_intensity};
pub use forecast::{
    best_windows, forecast_summary, overnight_slice, period_average, range_stats, worst_windows,
    ForecastSummary, HourWindow, LabelledPoint, RangeStats,
};
pub use generation::{aggregate, aggregate_with_tolerance, GenerationSummary, MixStatus};
pub use regional::{summarize_regions, RankedRegion, RegionalSummary};
