//! Refresh Pipeline Module
//!
//! ```text
//! timer tick / POST /refresh
//!        │
//!        ▼
//! issue sequence N ──► join(current, forecast, regional, generation)
//!                                   │
//!                                   ▼
//!                     aggregate generation mix
//!                                   │
//!                                   ▼
//!              N still latest? ── no ──► discard (logged)
//!                    │ yes
//!                    ▼
//!       AppState.snapshot = Arc<DashboardSnapshot>
//! ```
//!
//! The analysis and context layers never see partially-shaped input: every
//! section is either `Loaded` with validated values or `Failed`.

mod refresh;
mod state;
pub mod source;

pub use refresh::{summarize_generation, CycleOutcome, RefreshCoordinator};
pub use source::GridSource;
pub use state::*;
