//! Dashboard Configuration Module
//!
//! Operator-tunable settings loaded from TOML, replacing hardcoded limits
//! (forecast horizon, best/worst counts, overnight window, assistant tuning).
//!
//! ## Loading Order
//!
//! 1. `GRID_CARBON_CONFIG` environment variable (path to TOML file)
//! 2. `grid_carbon.toml` in the current working directory
//! 3. Built-in defaults (see [`defaults`])
//!
//! ## Usage
//!
//! The config is loaded once in `main()` and handed to each component that
//! needs it. There is no global lookup:
//!
//! ```ignore
//! let config = Arc::new(DashboardConfig::load());
//! let client = GridClient::new(&config.grid_api)?;
//! ```

mod dashboard_config;
pub mod defaults;
pub mod validation;

pub use dashboard_config::*;
