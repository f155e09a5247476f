//! Response bodies for the dashboard API
//!
//! Success is `{ "data": ..., "meta": ... }`, failure is
//! `{ "error": ..., "meta": ... }`. Whenever a response is derived from a
//! snapshot, `meta.snapshot` says which cycle produced it, when that cycle
//! finished and which sections it lost, so a client can tell how stale a
//! number is without a second request.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::pipeline::DashboardSnapshot;
use crate::storage::{CredentialError, StoreError};

pub const API_VERSION: &str = "1";

// ============================================================================
// Meta
// ============================================================================

/// Provenance of the snapshot a response was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotMeta {
    pub sequence: u64,
    pub fetched_at: DateTime<Utc>,
    pub failed_sections: Vec<&'static str>,
}

impl SnapshotMeta {
    pub fn of(snapshot: &DashboardSnapshot) -> Self {
        Self {
            sequence: snapshot.sequence,
            fetched_at: snapshot.completed_at,
            failed_sections: snapshot.failed_sections(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub api_version: &'static str,
    pub served_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotMeta>,
}

impl ResponseMeta {
    fn new(snapshot: Option<SnapshotMeta>) -> Self {
        Self {
            api_version: API_VERSION,
            served_at: Utc::now(),
            snapshot,
        }
    }
}

// ============================================================================
// Success
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 for data that does not come from a snapshot (settings, status).
    pub fn ok(data: T) -> Response {
        Self::respond(data, None)
    }

    /// 200 for data read out of `snapshot`.
    pub fn from_snapshot(data: T, snapshot: &DashboardSnapshot) -> Response {
        Self::respond(data, Some(SnapshotMeta::of(snapshot)))
    }

    fn respond(data: T, snapshot: Option<SnapshotMeta>) -> Response {
        let body = Self {
            data,
            meta: ResponseMeta::new(snapshot),
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Every way a dashboard request can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No refresh cycle has been applied yet
    NoSnapshot,
    /// The requested section failed (or never loaded) in the latest snapshot
    SectionUnavailable,
    /// An on-demand upstream fetch failed
    UpstreamError,
    InvalidRequest,
    /// Assistant key rejected before it reached the store
    InvalidApiKey,
    StorageError,
}

impl ErrorCode {
    pub const fn status(self) -> StatusCode {
        match self {
            Self::NoSnapshot | Self::SectionUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::UpstreamError => StatusCode::BAD_GATEWAY,
            Self::InvalidRequest | Self::InvalidApiKey => StatusCode::BAD_REQUEST,
            Self::StorageError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    /// Snapshot section the error is about
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<&'static str>,
    #[serde(skip)]
    snapshot: Option<SnapshotMeta>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            section: None,
            snapshot: None,
        }
    }

    pub fn no_snapshot() -> Self {
        Self::new(ErrorCode::NoSnapshot, "No data fetched yet")
    }

    /// `section` of `snapshot` is missing; `reason` is its failure, if any.
    pub fn section_unavailable(
        snapshot: &DashboardSnapshot,
        section: &'static str,
        reason: Option<&str>,
    ) -> Self {
        let message = match reason {
            Some(reason) => format!("{section} unavailable: {reason}"),
            None => format!("{section} not fetched yet"),
        };
        Self {
            code: ErrorCode::SectionUnavailable,
            message,
            section: Some(section),
            snapshot: Some(SnapshotMeta::of(snapshot)),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::new(ErrorCode::StorageError, e.to_string())
    }
}

impl From<CredentialError> for ApiError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::InvalidFormat(_) => Self::new(ErrorCode::InvalidApiKey, e.to_string()),
            CredentialError::Store(inner) => inner.into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ApiError,
    meta: ResponseMeta,
}

impl IntoResponse for ApiError {
    fn into_response(mut self) -> Response {
        let status = self.code.status();
        let meta = ResponseMeta::new(self.snapshot.take());
        (status, Json(ErrorBody { error: self, meta })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Section;

    async fn split(resp: Response) -> (StatusCode, serde_json::Value) {
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn snapshot_with_failed_regional() -> DashboardSnapshot {
        let at = Utc::now();
        DashboardSnapshot {
            sequence: 7,
            started_at: at,
            completed_at: at,
            current: Section::Pending,
            forecast: Section::Loaded(Vec::new()),
            regional: Section::Failed {
                reason: "HTTP 503".to_string(),
            },
            generation: Section::Pending,
        }
    }

    #[tokio::test]
    async fn test_plain_data_has_no_snapshot_meta() {
        let (status, v) = split(ApiResponse::ok(serde_json::json!({"enabled": true}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["data"]["enabled"], true);
        assert_eq!(v["meta"]["api_version"], API_VERSION);
        assert!(v["meta"].get("snapshot").is_none());
    }

    #[tokio::test]
    async fn test_snapshot_data_carries_provenance() {
        let snapshot = snapshot_with_failed_regional();
        let (_, v) = split(ApiResponse::from_snapshot(42, &snapshot)).await;
        assert_eq!(v["data"], 42);
        assert_eq!(v["meta"]["snapshot"]["sequence"], 7);
        assert_eq!(
            v["meta"]["snapshot"]["fetched_at"],
            serde_json::to_value(snapshot.completed_at).unwrap()
        );
        assert_eq!(v["meta"]["snapshot"]["failed_sections"], serde_json::json!(["regional"]));
    }

    #[tokio::test]
    async fn test_failed_section_error_names_section_and_reason() {
        let snapshot = snapshot_with_failed_regional();
        let error = ApiError::section_unavailable(&snapshot, "regional", snapshot.regional.failure());
        let (status, v) = split(error.into_response()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(v["error"]["code"], "SECTION_UNAVAILABLE");
        assert_eq!(v["error"]["section"], "regional");
        assert_eq!(v["error"]["message"], "regional unavailable: HTTP 503");
        assert_eq!(v["meta"]["snapshot"]["sequence"], 7);
    }

    #[tokio::test]
    async fn test_pending_section_message() {
        let snapshot = snapshot_with_failed_regional();
        let (_, v) = split(ApiError::section_unavailable(&snapshot, "current", None).into_response()).await;
        assert_eq!(v["error"]["message"], "current not fetched yet");
    }

    #[test]
    fn test_error_codes_map_to_status() {
        assert_eq!(ErrorCode::NoSnapshot.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ErrorCode::UpstreamError.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(ErrorCode::InvalidApiKey.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::StorageError.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_credential_errors_are_typed() {
        let invalid: ApiError = CredentialError::InvalidFormat("missing AIza prefix".into()).into();
        assert_eq!(invalid.code, ErrorCode::InvalidApiKey);

        let store: ApiError = CredentialError::Store(StoreError::Storage("disk full".into())).into();
        let (status, v) = split(store.into_response()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(v["error"]["code"], "STORAGE_ERROR");
        assert!(v["meta"].get("snapshot").is_none());
    }
}
