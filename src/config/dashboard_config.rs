//! Dashboard Configuration - every tunable as a TOML value
//!
//! Each section implements `Default` with the values in [`super::defaults`],
//! so a missing file or a partial file behaves exactly like the built-in
//! configuration.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;
use crate::analysis::HourWindow;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "GRID_CARBON_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "grid_carbon.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a dashboard deployment.
///
/// Load with `DashboardConfig::load()` which searches:
/// 1. `$GRID_CARBON_CONFIG`
/// 2. `./grid_carbon.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream grid data source
    #[serde(default)]
    pub grid_api: GridApiConfig,

    /// Timed refresh behaviour
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Analyzer / context-builder limits
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Third-party assistant endpoint
    #[serde(default)]
    pub assistant: AssistantConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl DashboardConfig {
    /// Load configuration using the standard search order. Errors in a file
    /// are logged and the next source is tried.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded dashboard config from {}", CONFIG_ENV);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded dashboard config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Toml(err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse and validate a TOML document. Unknown keys only warn.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }
        let config: Self = toml::from_str(contents).map_err(ConfigError::Toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize back to TOML (used by `grid-carbon config --print`).
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Range and consistency checks. Collects every problem before failing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.server.addr.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!("server.addr '{}' is not a socket address", self.server.addr));
        }
        if !self.grid_api.base_url.starts_with("http") {
            errors.push(format!("grid_api.base_url '{}' must be an http(s) URL", self.grid_api.base_url));
        }
        if self.grid_api.forecast_hours == 0 || self.grid_api.forecast_hours > 96 {
            errors.push(format!(
                "grid_api.forecast_hours ({}) must be in 1..=96",
                self.grid_api.forecast_hours
            ));
        }
        if self.grid_api.historical_hours == 0 || self.grid_api.historical_hours > 168 {
            errors.push(format!(
                "grid_api.historical_hours ({}) must be in 1..=168",
                self.grid_api.historical_hours
            ));
        }
        if self.grid_api.timeout_secs == 0 {
            errors.push("grid_api.timeout_secs must be positive".to_string());
        }
        if self.refresh.interval_secs < 60 {
            errors.push(format!(
                "refresh.interval_secs ({}) must be at least 60",
                self.refresh.interval_secs
            ));
        }

        let a = &self.analysis;
        if a.overnight_start_hour > 23 || a.overnight_end_hour > 23 {
            errors.push(format!(
                "analysis.overnight hours ({}..={}) must be in 0..=23",
                a.overnight_start_hour, a.overnight_end_hour
            ));
        }
        if a.period_length == 0 {
            errors.push("analysis.period_length must be positive".to_string());
        }
        if a.horizon > defaults::MAX_CONTEXT_HORIZON {
            errors.push(format!(
                "analysis.horizon ({}) must not exceed {}",
                a.horizon,
                defaults::MAX_CONTEXT_HORIZON
            ));
        }
        if a.horizon < a.period_length {
            errors.push(format!(
                "analysis.horizon ({}) must cover at least one period ({})",
                a.horizon, a.period_length
            ));
        }
        if !(a.integrity_tolerance_pct.is_finite() && a.integrity_tolerance_pct >= 0.0) {
            errors.push("analysis.integrity_tolerance_pct must be a non-negative number".to_string());
        }
        if a.timezone.parse::<Tz>().is_err() {
            errors.push(format!("analysis.timezone '{}' is not an IANA zone", a.timezone));
        }

        let s = &self.assistant;
        if !(0.0..=2.0).contains(&s.temperature) {
            errors.push(format!("assistant.temperature ({}) must be in 0.0..=2.0", s.temperature));
        }
        if !(0.0..=1.0).contains(&s.top_p) {
            errors.push(format!("assistant.top_p ({}) must be in 0.0..=1.0", s.top_p));
        }
        if s.max_output_tokens == 0 {
            errors.push("assistant.max_output_tokens must be positive".to_string());
        }
        if s.model.trim().is_empty() {
            errors.push("assistant.model must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: defaults::SERVER_ADDR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridApiConfig {
    pub base_url: String,
    pub forecast_hours: u32,
    pub historical_hours: u32,
    pub timeout_secs: u64,
}

impl Default for GridApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::GRID_API_BASE_URL.to_string(),
            forecast_hours: defaults::FORECAST_HOURS,
            historical_hours: defaults::HISTORICAL_HOURS,
            timeout_secs: defaults::GRID_HTTP_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_secs: u64,
    /// Run a cycle immediately at startup instead of waiting one interval
    pub run_on_start: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::REFRESH_INTERVAL_SECS,
            run_on_start: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub best_count: usize,
    pub worst_count: usize,
    /// Readings considered by the context builder
    pub horizon: usize,
    /// Readings per averaging period
    pub period_length: usize,
    pub overnight_start_hour: u32,
    pub overnight_end_hour: u32,
    pub overnight_limit: usize,
    pub integrity_tolerance_pct: f64,
    /// IANA zone name for hour-of-day and day labels
    pub timezone: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            best_count: defaults::BEST_WINDOW_COUNT,
            worst_count: defaults::WORST_WINDOW_COUNT,
            horizon: defaults::CONTEXT_HORIZON,
            period_length: defaults::PERIOD_LENGTH,
            overnight_start_hour: defaults::OVERNIGHT_START_HOUR,
            overnight_end_hour: defaults::OVERNIGHT_END_HOUR,
            overnight_limit: defaults::OVERNIGHT_LIMIT,
            integrity_tolerance_pct: defaults::INTEGRITY_TOLERANCE_PCT,
            timezone: defaults::TIMEZONE.to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Configured zone. Falls back to Europe/London for an unparseable name,
    /// which `validate()` already rejects for loaded files.
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(chrono_tz::Europe::London)
    }

    pub const fn overnight_window(&self) -> HourWindow {
        HourWindow::new(self.overnight_start_hour, self.overnight_end_hour)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
    /// Superficial format check applied before a key is stored
    pub key_prefix: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::ASSISTANT_ENDPOINT.to_string(),
            model: defaults::ASSISTANT_MODEL.to_string(),
            temperature: defaults::ASSISTANT_TEMPERATURE,
            top_k: defaults::ASSISTANT_TOP_K,
            top_p: defaults::ASSISTANT_TOP_P,
            max_output_tokens: defaults::ASSISTANT_MAX_OUTPUT_TOKENS,
            timeout_secs: defaults::ASSISTANT_TIMEOUT_SECS,
            key_prefix: defaults::API_KEY_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: defaults::STORAGE_PATH.to_string(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, std::io::Error),
    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, toml::de::Error),
    #[error("Config parse error: {0}")]
    Toml(toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(toml::ser::Error),
    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(DashboardConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = DashboardConfig::from_toml_str(
            r#"
[refresh]
interval_secs = 600

[analysis]
overnight_limit = 4
"#,
        )
        .unwrap();
        assert_eq!(config.refresh.interval_secs, 600);
        assert!(config.refresh.run_on_start);
        assert_eq!(config.analysis.overnight_limit, 4);
        assert_eq!(config.analysis.best_count, 5);
        assert_eq!(config.grid_api, GridApiConfig::default());
    }

    #[test]
    fn validation_collects_every_error() {
        let mut config = DashboardConfig::default();
        config.refresh.interval_secs = 5;
        config.analysis.timezone = "Mars/Olympus".to_string();
        config.assistant.top_p = 1.5;
        match config.validate() {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn round_trips_through_toml() {
        let config = DashboardConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(DashboardConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn load_from_missing_file_is_io_error() {
        let err = DashboardConfig::load_from_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(err, Err(ConfigError::Io(_, _))));
    }

    #[test]
    fn timezone_and_window_accessors() {
        let analysis = AnalysisConfig::default();
        assert_eq!(analysis.tz(), chrono_tz::Europe::London);
        assert!(analysis.overnight_window().contains(0));
        assert!(!analysis.overnight_window().contains(12));
    }
}
