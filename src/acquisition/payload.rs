//! Grid API payload normalisation
//!
//! The upstream JSON is decoded in two steps. The envelope (`{"data": ...}`)
//! must match or the whole payload is unusable. Each entry inside it is then
//! decoded on its own, so one malformed entry is dropped and counted instead
//! of poisoning the rest of the response.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{GenerationShare, IntensityReading, RegionalEntry};

// ============================================================================
// Result Types
// ============================================================================

/// Entries that survived validation plus how many were dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub values: Vec<T>,
    pub rejected: usize,
}

impl<T> Parsed<T> {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("Payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Payload is missing '{0}'")]
    MissingField(&'static str),
}

// ============================================================================
// Raw Upstream Shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawIntensityEntry {
    from: String,
    to: String,
    intensity: RawIntensity,
}

#[derive(Debug, Deserialize)]
struct RawIntensity {
    forecast: f64,
    #[serde(default)]
    actual: Option<f64>,
    #[serde(default)]
    index: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRegion {
    regionid: u32,
    #[serde(default)]
    dnoregion: String,
    shortname: String,
    intensity: RawRegionIntensity,
    #[serde(default)]
    generationmix: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawRegionIntensity {
    forecast: f64,
    #[serde(default)]
    index: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawShare {
    fuel: String,
    perc: f64,
}

// ============================================================================
// Timestamps
// ============================================================================

/// Parse an upstream timestamp.
///
/// The grid API emits minute precision without seconds (`2018-01-20T12:00Z`).
/// Full RFC 3339 is accepted as well.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ")
        .ok()
        .map(|naive| naive.and_utc())
}

// ============================================================================
// Entry Decoding
// ============================================================================

/// Decode every entry of `items` independently, keeping the ones `convert`
/// accepts.
fn parse_each<R, T>(
    items: Vec<Value>,
    what: &'static str,
    convert: impl Fn(R) -> Option<T>,
) -> Parsed<T>
where
    R: DeserializeOwned,
{
    let total = items.len();
    let mut values = Vec::with_capacity(total);
    for item in items {
        match serde_json::from_value::<R>(item) {
            Ok(raw) => match convert(raw) {
                Some(v) => values.push(v),
                None => debug!(kind = what, "Dropped entry with unusable fields"),
            },
            Err(e) => debug!(kind = what, error = %e, "Dropped malformed entry"),
        }
    }
    let rejected = total - values.len();
    if rejected > 0 {
        warn!(kind = what, rejected, total, "Rejected malformed grid API entries");
    }
    Parsed { values, rejected }
}

fn to_reading(raw: RawIntensityEntry) -> Option<IntensityReading> {
    let from = parse_timestamp(&raw.from)?;
    let to = parse_timestamp(&raw.to)?;
    if !raw.intensity.forecast.is_finite() {
        return None;
    }
    Some(IntensityReading {
        from,
        to,
        forecast: raw.intensity.forecast,
        actual: raw.intensity.actual.filter(|a| a.is_finite()),
        index: raw.intensity.index,
    })
}

fn to_share(raw: RawShare) -> Option<GenerationShare> {
    Some(GenerationShare::new(raw.fuel, raw.perc))
}

fn to_region(raw: RawRegion) -> Option<RegionalEntry> {
    if !raw.intensity.forecast.is_finite() {
        return None;
    }
    let generation_mix = parse_each(raw.generationmix, "regional_share", to_share).values;
    Some(RegionalEntry {
        region_id: raw.regionid,
        region_name: raw.dnoregion,
        short_name: raw.shortname,
        forecast_intensity: raw.intensity.forecast,
        index: raw.intensity.index,
        generation_mix,
    })
}

fn data_field(body: &[u8]) -> Result<Value, PayloadError> {
    let mut doc: Value = serde_json::from_slice(body)?;
    doc.get_mut("data")
        .map(Value::take)
        .ok_or(PayloadError::MissingField("data"))
}

fn as_array(value: Value, field: &'static str) -> Result<Vec<Value>, PayloadError> {
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(PayloadError::MissingField(field)),
    }
}

// ============================================================================
// Public Parsers
// ============================================================================

/// `/intensity`, `/intensity/{from}/{to}` and `/intensity/date`.
///
/// Readings are returned ordered by `from` ascending.
pub fn parse_intensity(body: &[u8]) -> Result<Parsed<IntensityReading>, PayloadError> {
    let items = as_array(data_field(body)?, "data")?;
    let mut parsed = parse_each(items, "intensity", to_reading);
    parsed.values.sort_by_key(|r| r.from);
    Ok(parsed)
}

/// `/regional`: regions of the first (current) period.
pub fn parse_regional(body: &[u8]) -> Result<Parsed<RegionalEntry>, PayloadError> {
    let periods = as_array(data_field(body)?, "data")?;
    let regions = periods
        .into_iter()
        .next()
        .and_then(|mut period| period.get_mut("regions").map(Value::take))
        .ok_or(PayloadError::MissingField("data[0].regions"))?;
    Ok(parse_each(as_array(regions, "regions")?, "region", to_region))
}

/// `/generation`: the national generation mix.
///
/// The upstream sends `data` as an object; some mirrors wrap it in a
/// one-element array, which is accepted too.
pub fn parse_generation(body: &[u8]) -> Result<Parsed<GenerationShare>, PayloadError> {
    let data = match data_field(body)? {
        Value::Array(items) => items
            .into_iter()
            .next()
            .ok_or(PayloadError::MissingField("data[0]"))?,
        other => other,
    };
    let mix = match data {
        Value::Object(mut obj) => obj
            .remove("generationmix")
            .ok_or(PayloadError::MissingField("generationmix"))?,
        _ => return Err(PayloadError::MissingField("generationmix")),
    };
    Ok(parse_each(as_array(mix, "generationmix")?, "generation", to_share))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_minute_precision_timestamps() {
        let ts = parse_timestamp("2018-01-20T12:00Z").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2018, 1, 20, 12, 0, 0).unwrap());
    }

    #[test]
    fn parses_rfc3339_timestamps() {
        let ts = parse_timestamp("2018-01-20T12:30:00+01:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2018, 1, 20, 11, 30, 0).unwrap());
    }

    #[test]
    fn rejects_garbage_timestamps() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn intensity_drops_bad_entries_and_sorts() {
        let body = br#"{"data":[
            {"from":"2025-01-06T01:00Z","to":"2025-01-06T01:30Z","intensity":{"forecast":150,"actual":140,"index":"moderate"}},
            {"from":"not a date","to":"2025-01-06T01:30Z","intensity":{"forecast":150}},
            {"from":"2025-01-06T00:30Z","to":"2025-01-06T01:00Z","intensity":{"forecast":"high"}},
            {"from":"2025-01-06T00:00Z","to":"2025-01-06T00:30Z","intensity":{"forecast":120,"actual":null,"index":"low"}}
        ]}"#;
        let parsed = parse_intensity(body).unwrap();
        assert_eq!(parsed.rejected, 2);
        assert_eq!(parsed.values.len(), 2);
        assert_eq!(parsed.values[0].forecast, 120.0);
        assert_eq!(parsed.values[0].actual, None);
        assert_eq!(parsed.values[1].actual, Some(140.0));
        assert_eq!(parsed.values[1].index.as_deref(), Some("moderate"));
    }

    #[test]
    fn missing_data_is_unusable() {
        assert!(matches!(
            parse_intensity(br#"{"error":"nope"}"#),
            Err(PayloadError::MissingField("data"))
        ));
        assert!(matches!(parse_intensity(b"<html>"), Err(PayloadError::Json(_))));
    }

    #[test]
    fn regional_reads_first_period() {
        let body = br#"{"data":[{"from":"2025-01-06T00:00Z","to":"2025-01-06T00:30Z","regions":[
            {"regionid":1,"dnoregion":"Scottish Hydro Electric Power Distribution","shortname":"North Scotland",
             "intensity":{"forecast":20,"index":"very low"},
             "generationmix":[{"fuel":"wind","perc":80.5},{"fuel":"gas"}]},
            {"regionid":2,"shortname":"South Scotland","intensity":{}}
        ]}]}"#;
        let parsed = parse_regional(body).unwrap();
        assert_eq!(parsed.rejected, 1);
        let north = &parsed.values[0];
        assert_eq!(north.short_name, "North Scotland");
        assert_eq!(north.forecast_intensity, 20.0);
        assert_eq!(north.generation_mix, vec![GenerationShare::new("wind", 80.5)]);
    }

    #[test]
    fn generation_accepts_object_and_array_data() {
        let object = br#"{"data":{"from":"2025-01-06T00:00Z","to":"2025-01-06T00:30Z",
            "generationmix":[{"fuel":"wind","perc":40},{"fuel":"gas","perc":30},{"perc":5}]}}"#;
        let parsed = parse_generation(object).unwrap();
        assert_eq!(parsed.values.len(), 2);
        assert_eq!(parsed.rejected, 1);

        let array = br#"{"data":[{"generationmix":[{"fuel":"solar","perc":12.5}]}]}"#;
        let parsed = parse_generation(array).unwrap();
        assert_eq!(parsed.values, vec![GenerationShare::new("solar", 12.5)]);
    }
}
