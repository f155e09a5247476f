//! Config validation: unknown-key detection with Levenshtein suggestions
//! and suspicious-value warnings.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

use super::DashboardConfig;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `DashboardConfig`.
///
/// Maintained by hand to match the struct hierarchy in dashboard_config.rs.
/// Any new field added there must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [server]
        "server",
        "server.addr",
        // [grid_api]
        "grid_api",
        "grid_api.base_url",
        "grid_api.forecast_hours",
        "grid_api.historical_hours",
        "grid_api.timeout_secs",
        // [refresh]
        "refresh",
        "refresh.interval_secs",
        "refresh.run_on_start",
        // [analysis]
        "analysis",
        "analysis.best_count",
        "analysis.worst_count",
        "analysis.horizon",
        "analysis.period_length",
        "analysis.overnight_start_hour",
        "analysis.overnight_end_hour",
        "analysis.overnight_limit",
        "analysis.integrity_tolerance_pct",
        "analysis.timezone",
        // [assistant]
        "assistant",
        "assistant.endpoint",
        "assistant.model",
        "assistant.temperature",
        "assistant.top_k",
        "assistant.top_p",
        "assistant.max_output_tokens",
        "assistant.timeout_secs",
        "assistant.key_prefix",
        // [storage]
        "storage",
        "storage.path",
    ];
    keys.iter().copied().collect()
}

/// Recursively collect dotted key paths from a TOML value.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let b_len = b_chars.len();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Suggest the closest known key within an edit distance of 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (*k, levenshtein(unknown, k)))
        .filter(|(_, dist)| *dist <= 3)
        .min_by(|(ka, da), (kb, db)| da.cmp(db).then_with(|| ka.cmp(kb)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys; it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        // parse errors are reported by serde later
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Suspicious Values
// ============================================================================

/// Values that are legal but probably not what the operator meant.
pub fn suspicious_values(config: &DashboardConfig) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    // Upstream data only changes every 30 minutes
    if config.refresh.interval_secs < 300 {
        warnings.push(ValidationWarning {
            field: "refresh.interval_secs".to_string(),
            message: format!(
                "refresh.interval_secs = {} polls far more often than the 30-minute upstream update",
                config.refresh.interval_secs
            ),
            suggestion: None,
        });
    }

    let a = &config.analysis;
    if a.best_count == 0 || a.worst_count == 0 {
        warnings.push(ValidationWarning {
            field: "analysis.best_count".to_string(),
            message: "best_count / worst_count of 0 leaves the assistant without recommendations"
                .to_string(),
            suggestion: None,
        });
    }
    if a.best_count > a.horizon || a.worst_count > a.horizon {
        warnings.push(ValidationWarning {
            field: "analysis.horizon".to_string(),
            message: format!(
                "best/worst counts ({}/{}) exceed the horizon ({})",
                a.best_count, a.worst_count, a.horizon
            ),
            suggestion: None,
        });
    }
    if a.overnight_limit == 0 {
        warnings.push(ValidationWarning {
            field: "analysis.overnight_limit".to_string(),
            message: "overnight_limit = 0 disables the overnight section".to_string(),
            suggestion: None,
        });
    }

    if config.assistant.key_prefix.is_empty() {
        warnings.push(ValidationWarning {
            field: "assistant.key_prefix".to_string(),
            message: "empty key_prefix accepts any non-empty string as an API key".to_string(),
            suggestion: None,
        });
    }

    warnings
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("hello", "hello"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("timezon", "timezone"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
[analysis]
best_count = 3
"#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"analysis".to_string()));
        assert!(keys.contains(&"analysis.best_count".to_string()));
    }

    #[test]
    fn test_suspicious_fast_refresh() {
        let mut config = DashboardConfig::default();
        config.refresh.interval_secs = 120;
        let warnings = suspicious_values(&config);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "refresh.interval_secs");
    }

    #[test]
    fn test_defaults_are_not_suspicious() {
        assert!(suspicious_values(&DashboardConfig::default()).is_empty());
    }
}
