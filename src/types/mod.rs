//! Shared data structures for the carbon-intensity dashboard
//!
//! These are the normalized shapes every other module works with:
//! - `IntensityReading`: one time slot of national intensity (forecast + optional actual)
//! - `GenerationShare`: one fuel's share of the national generation mix
//! - `RegionalEntry`: one DNO region's forecast intensity and sub-mix
//! - `IntensityLevel`: the five qualitative severity bands
//!
//! Values are built once per refresh cycle by the acquisition layer and never
//! mutated afterwards.

mod generation;
mod intensity;
mod regional;

pub use generation::*;
pub use intensity::*;
pub use regional::*;
