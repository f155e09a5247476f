//! Grid API client
//!
//! Thin reqwest wrapper over the public carbon-intensity REST API. Every
//! method returns typed, validated values or a [`GridClientError`]; nothing
//! here retries. The refresh pipeline decides what a failure means.

use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;
use tracing::{debug, warn};

use super::payload::{self, Parsed, PayloadError};
use crate::config::GridApiConfig;
use crate::types::{GenerationShare, IntensityReading, RegionalEntry};

/// Path-segment format for `/intensity/{from}/{to}`.
const RANGE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, thiserror::Error)]
pub enum GridClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Grid API returned status {status} for {path}")]
    Status { status: StatusCode, path: String },
    #[error("Unusable payload from {path}: {source}")]
    Payload {
        path: String,
        #[source]
        source: PayloadError,
    },
    #[error("Grid API returned no usable {0}")]
    Empty(&'static str),
}

/// HTTP client for the grid carbon-intensity API.
#[derive(Debug, Clone)]
pub struct GridClient {
    http: reqwest::Client,
    base_url: String,
    forecast_hours: u32,
    historical_hours: u32,
}

impl GridClient {
    pub fn new(config: &GridApiConfig) -> Result<Self, GridClientError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("grid-carbon/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            forecast_hours: config.forecast_hours,
            historical_hours: config.historical_hours,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, GridClientError> {
        let resp = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GridClientError::Status {
                status,
                path: path.to_string(),
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }

    async fn get_parsed<T>(
        &self,
        path: &str,
        parse: fn(&[u8]) -> Result<Parsed<T>, PayloadError>,
    ) -> Result<Parsed<T>, GridClientError> {
        let body = self.get_bytes(path).await?;
        let parsed = parse(&body).map_err(|source| GridClientError::Payload {
            path: path.to_string(),
            source,
        })?;
        debug!(
            path,
            accepted = parsed.values.len(),
            rejected = parsed.rejected,
            "Grid API response parsed"
        );
        Ok(parsed)
    }

    /// Current national intensity (`GET /intensity`).
    pub async fn current(&self) -> Result<IntensityReading, GridClientError> {
        self.get_parsed("/intensity", payload::parse_intensity)
            .await?
            .values
            .into_iter()
            .next()
            .ok_or(GridClientError::Empty("current intensity"))
    }

    /// Forecast readings from now over the configured horizon.
    pub async fn forecast(&self) -> Result<Vec<IntensityReading>, GridClientError> {
        self.forecast_from(Utc::now()).await
    }

    /// Forecast starting at `now`. Falls back to `GET /intensity/date` when
    /// the range endpoint answers with a non-2xx status.
    pub async fn forecast_from(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<IntensityReading>, GridClientError> {
        let end = now + Duration::hours(i64::from(self.forecast_hours));
        let path = range_path(now, end);

        let parsed = match self.get_parsed(&path, payload::parse_intensity).await {
            Err(GridClientError::Status { status, .. }) => {
                warn!(%status, "Forecast range request failed, falling back to /intensity/date");
                self.get_parsed("/intensity/date", payload::parse_intensity)
                    .await?
            }
            other => other?,
        };
        non_empty(parsed, "forecast readings")
    }

    /// Readings over the configured look-back window ending now.
    pub async fn historical(&self) -> Result<Vec<IntensityReading>, GridClientError> {
        self.historical_until(Utc::now()).await
    }

    pub async fn historical_until(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<IntensityReading>, GridClientError> {
        let start = now - Duration::hours(i64::from(self.historical_hours));
        let parsed = self
            .get_parsed(&range_path(start, now), payload::parse_intensity)
            .await?;
        non_empty(parsed, "historical readings")
    }

    /// Regional snapshot (`GET /regional`).
    pub async fn regional(&self) -> Result<Vec<RegionalEntry>, GridClientError> {
        let parsed = self.get_parsed("/regional", payload::parse_regional).await?;
        non_empty(parsed, "regions")
    }

    /// National generation mix (`GET /generation`).
    ///
    /// An empty mix is returned as-is: the aggregator distinguishes "no data"
    /// from "no usable data" and needs to see the rejected count for that.
    pub async fn generation(&self) -> Result<Parsed<GenerationShare>, GridClientError> {
        self.get_parsed("/generation", payload::parse_generation)
            .await
    }
}

fn range_path(from: DateTime<Utc>, to: DateTime<Utc>) -> String {
    format!(
        "/intensity/{}/{}",
        from.format(RANGE_FORMAT),
        to.format(RANGE_FORMAT)
    )
}

fn non_empty<T>(parsed: Parsed<T>, what: &'static str) -> Result<Vec<T>, GridClientError> {
    if parsed.is_empty() {
        Err(GridClientError::Empty(what))
    } else {
        Ok(parsed.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::{Matcher, Server};

    const INTENSITY_BODY: &str = r#"{"data":[
        {"from":"2025-01-06T12:00Z","to":"2025-01-06T12:30Z","intensity":{"forecast":180,"actual":175,"index":"moderate"}}
    ]}"#;

    fn client_for(url: String) -> GridClient {
        let config = GridApiConfig {
            base_url: url,
            ..GridApiConfig::default()
        };
        GridClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_current_intensity() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/intensity")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(INTENSITY_BODY)
            .create_async()
            .await;

        let client = client_for(server.url());
        let reading = client.current().await.unwrap();
        assert_eq!(reading.forecast, 180.0);
        assert_eq!(reading.current_value(), 175.0);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_forecast_uses_range_path() {
        let mut server = Server::new_async().await;
        let now = Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap();
        let mock = server
            .mock("GET", "/intensity/2025-01-06T12:00:00Z/2025-01-08T12:00:00Z")
            .with_status(200)
            .with_body(INTENSITY_BODY)
            .create_async()
            .await;

        let client = client_for(server.url());
        let readings = client.forecast_from(now).await.unwrap();
        assert_eq!(readings.len(), 1);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_forecast_falls_back_to_date_endpoint() {
        let mut server = Server::new_async().await;
        let range = server
            .mock("GET", Matcher::Regex(r"^/intensity/\d{4}-\d{2}-\d{2}T".to_string()))
            .with_status(500)
            .create_async()
            .await;
        let fallback = server
            .mock("GET", "/intensity/date")
            .with_status(200)
            .with_body(INTENSITY_BODY)
            .create_async()
            .await;

        let client = client_for(server.url());
        let readings = client.forecast().await.unwrap();
        assert_eq!(readings[0].forecast, 180.0);

        range.assert_async().await;
        fallback.assert_async().await;
    }

    #[tokio::test]
    async fn test_status_error_is_reported() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/regional")
            .with_status(503)
            .create_async()
            .await;

        let client = client_for(server.url());
        let err = client.regional().await.unwrap_err();
        assert!(matches!(
            err,
            GridClientError::Status { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE
        ));
    }

    #[tokio::test]
    async fn test_garbage_payload_is_unusable() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/generation")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let client = client_for(server.url());
        assert!(matches!(
            client.generation().await,
            Err(GridClientError::Payload { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_current_is_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/intensity")
            .with_status(200)
            .with_body(r#"{"data":[]}"#)
            .create_async()
            .await;

        let client = client_for(server.url());
        assert!(matches!(
            client.current().await,
            Err(GridClientError::Empty(_))
        ));
    }
}
