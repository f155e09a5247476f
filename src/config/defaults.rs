//! System-wide default constants.
//!
//! Every operator-tunable value in `DashboardConfig` defaults to one of
//! these. Grouped by subsystem for easy discovery.

// ============================================================================
// Server
// ============================================================================

/// Default HTTP bind address.
pub const SERVER_ADDR: &str = "0.0.0.0:8080";

// ============================================================================
// Grid API
// ============================================================================

/// Public UK carbon-intensity API.
pub const GRID_API_BASE_URL: &str = "https://api.carbonintensity.org.uk";

/// Forecast horizon requested from the grid API (hours).
pub const FORECAST_HOURS: u32 = 48;

/// Look-back window for the historical endpoint (hours).
pub const HISTORICAL_HOURS: u32 = 24;

/// HTTP client timeout for grid API requests (seconds).
pub const GRID_HTTP_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Refresh
// ============================================================================

/// Interval between timed refresh cycles (seconds). 1 800 = 30 minutes.
pub const REFRESH_INTERVAL_SECS: u64 = 1_800;

// ============================================================================
// Analysis
// ============================================================================

/// Number of cleanest slots handed to the assistant.
pub const BEST_WINDOW_COUNT: usize = 5;

/// Number of dirtiest slots handed to the assistant.
pub const WORST_WINDOW_COUNT: usize = 5;

/// Maximum readings the context builder considers.
pub const CONTEXT_HORIZON: usize = 48;

/// Largest accepted horizon: 48 hours of half-hourly slots.
pub const MAX_CONTEXT_HORIZON: usize = 96;

/// Readings per averaging period ("next 24", "following 24").
pub const PERIOD_LENGTH: usize = 24;

/// First local hour of the overnight window.
pub const OVERNIGHT_START_HOUR: u32 = 23;

/// Last local hour of the overnight window (inclusive).
pub const OVERNIGHT_END_HOUR: u32 = 6;

/// Maximum overnight slots handed to the assistant.
pub const OVERNIGHT_LIMIT: usize = 8;

/// Allowed deviation of a generation-mix total from 100% (points).
pub const INTEGRITY_TOLERANCE_PCT: f64 = 5.0;

/// Readings shown on the "today" chart (low/high cards).
pub const CHART_WINDOW: usize = 24;

/// Readings kept for the past-24h chart (30-minute slots).
pub const HISTORICAL_DISPLAY_WINDOW: usize = 48;

/// Zone used for hour-of-day and day labelling.
pub const TIMEZONE: &str = "Europe/London";

// ============================================================================
// Assistant
// ============================================================================

/// Gemini model collection endpoint.
pub const ASSISTANT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini model name.
pub const ASSISTANT_MODEL: &str = "gemini-1.5-flash";

pub const ASSISTANT_TEMPERATURE: f64 = 0.7;
pub const ASSISTANT_TOP_K: u32 = 40;
pub const ASSISTANT_TOP_P: f64 = 0.95;
pub const ASSISTANT_MAX_OUTPUT_TOKENS: u32 = 1_024;

/// Maximum time to wait for one assistant response (seconds).
pub const ASSISTANT_TIMEOUT_SECS: u64 = 60;

/// Every Gemini API key starts with this.
pub const API_KEY_PREFIX: &str = "AIza";

/// Environment variable that overrides any stored key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

// ============================================================================
// Storage
// ============================================================================

/// Default sled path for the settings store.
pub const STORAGE_PATH: &str = "./data/settings.db";
