//! Assistant endpoints: context, chat, credential and location preference

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::DashboardState;
use crate::api::envelope::{ApiError, ApiResponse};
use crate::storage::{CredentialError, KeySource};

// ============================================================================
// Context and Chat
// ============================================================================

/// GET /api/v1/assistant/context - What the assistant would be told right now
pub async fn get_assistant_context(State(state): State<DashboardState>) -> Response {
    let settings = state.settings_copy().await;
    ApiResponse::ok(state.assistant_context(&settings).await)
}

/// GET /api/v1/assistant/welcome - Opening chat message
pub async fn get_welcome(State(state): State<DashboardState>) -> Response {
    let settings = state.settings_copy().await;
    let ctx = state.assistant_context(&settings).await;
    ApiResponse::ok(state.assistant.welcome(&ctx, &settings))
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// POST /api/v1/assistant/ask - Ask one question
///
/// Always answers with an exchange once the question is non-empty. Backend
/// failures come back as an `error`-kind reply carrying local fallback text.
pub async fn ask_assistant(
    State(state): State<DashboardState>,
    Json(request): Json<AskRequest>,
) -> Response {
    if request.question.trim().is_empty() {
        return ApiError::invalid_request("Question must not be empty").into_response();
    }

    let settings = state.settings_copy().await;
    let ctx = state.assistant_context(&settings).await;
    let exchange = state.assistant.ask(&request.question, &ctx, &settings).await;
    ApiResponse::ok(exchange)
}

// ============================================================================
// Credential
// ============================================================================

#[derive(Debug, Serialize)]
pub struct KeyStatus {
    pub configured: bool,
    pub source: KeySource,
    /// First and last four characters only
    pub masked: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetKeyRequest {
    pub key: String,
}

async fn key_status(state: &DashboardState) -> KeyStatus {
    let settings = state.settings.read().await;
    KeyStatus {
        configured: settings.is_configured(),
        source: settings.key_source(),
        masked: settings.masked_key(),
    }
}

/// GET /api/v1/assistant/key - Whether a key is configured, never the key
pub async fn get_api_key(State(state): State<DashboardState>) -> Response {
    ApiResponse::ok(key_status(&state).await)
}

/// PUT /api/v1/assistant/key - Validate and persist a key
pub async fn set_api_key(
    State(state): State<DashboardState>,
    Json(request): Json<SetKeyRequest>,
) -> Response {
    let result = state.settings.write().await.set_api_key(
        state.store.as_ref(),
        &request.key,
        &state.config.assistant.key_prefix,
    );
    match result {
        Ok(()) => ApiResponse::ok(key_status(&state).await),
        Err(e) => {
            match &e {
                CredentialError::InvalidFormat(reason) => info!(%reason, "Rejected assistant API key"),
                CredentialError::Store(inner) => {
                    error!(error = %inner, "Failed to persist assistant API key");
                }
            }
            ApiError::from(e).into_response()
        }
    }
}

/// DELETE /api/v1/assistant/key - Forget the stored key
///
/// A key supplied through the environment stays active.
pub async fn delete_api_key(State(state): State<DashboardState>) -> Response {
    let result = state.settings.write().await.clear_api_key(state.store.as_ref());
    match result {
        Ok(()) => ApiResponse::ok(key_status(&state).await),
        Err(e) => {
            error!(error = %e, "Failed to remove assistant API key");
            ApiError::from(e).into_response()
        }
    }
}

// ============================================================================
// Preferences
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct LocationPreference {
    pub enabled: bool,
}

/// GET /api/v1/preferences/location
pub async fn get_location_preference(State(state): State<DashboardState>) -> Response {
    let enabled = state.settings.read().await.use_location();
    ApiResponse::ok(LocationPreference { enabled })
}

/// PUT /api/v1/preferences/location
pub async fn set_location_preference(
    State(state): State<DashboardState>,
    Json(request): Json<LocationPreference>,
) -> Response {
    let result = state
        .settings
        .write()
        .await
        .set_use_location(state.store.as_ref(), request.enabled);
    match result {
        Ok(()) => {
            info!(enabled = request.enabled, "Location preference updated");
            ApiResponse::ok(request)
        }
        Err(e) => {
            error!(error = %e, "Failed to persist location preference");
            ApiError::from(e).into_response()
        }
    }
}

/// DELETE /api/v1/preferences - Remove every stored setting
pub async fn clear_preferences(State(state): State<DashboardState>) -> Response {
    let result = state.settings.write().await.clear(state.store.as_ref());
    match result {
        Ok(()) => ApiResponse::ok(key_status(&state).await),
        Err(e) => {
            error!(error = %e, "Failed to clear settings");
            ApiError::from(e).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::state_with;
    use super::*;
    use crate::config::AssistantConfig;
    use crate::llm::{Assistant, LlmBackend};
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use std::sync::Arc;

    struct Echo;

    #[async_trait]
    impl LlmBackend for Echo {
        async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
            Ok(format!("prompt had {} chars", prompt.len()))
        }

        fn backend_name(&self) -> &'static str {
            "echo"
        }
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn ask(question: &str) -> Json<AskRequest> {
        Json(AskRequest {
            question: question.to_string(),
        })
    }

    #[tokio::test]
    async fn test_empty_question_is_rejected() {
        let state = state_with(Assistant::with_backend(Arc::new(Echo)));
        let resp = ask_assistant(State(state), ask("   ")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ask_with_backend() {
        let state = state_with(Assistant::with_backend(Arc::new(Echo)));
        state.coordinator.run_cycle().await;

        let v = body_json(ask_assistant(State(state), ask("When is the best time?")).await).await;
        assert_eq!(v["data"]["question"]["kind"], "user");
        assert_eq!(v["data"]["reply"]["kind"], "assistant");
        assert!(v["data"]["reply"]["content"]
            .as_str()
            .unwrap()
            .starts_with("prompt had"));
    }

    #[tokio::test]
    async fn test_ask_unconfigured_answers_locally() {
        let state = state_with(Assistant::gemini(AssistantConfig::default()));
        let v = body_json(ask_assistant(State(state), ask("Is now a good time?")).await).await;
        assert_eq!(v["data"]["reply"]["kind"], "assistant");
        assert!(v["data"]["reply"]["content"]
            .as_str()
            .unwrap()
            .contains("/api/v1/assistant/key"));
    }

    #[tokio::test]
    async fn test_key_lifecycle() {
        let state = state_with(Assistant::gemini(AssistantConfig::default()));

        let bad = set_api_key(
            State(state.clone()),
            Json(SetKeyRequest {
                key: "sk-not-a-gemini-key".to_string(),
            }),
        )
        .await;
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(bad).await["error"]["code"], "INVALID_API_KEY");

        let good = body_json(
            set_api_key(
                State(state.clone()),
                Json(SetKeyRequest {
                    key: "AIzaSyTestKey0000001234".to_string(),
                }),
            )
            .await,
        )
        .await;
        assert_eq!(good["data"]["configured"], true);
        assert_eq!(good["data"]["source"], "stored");
        assert_eq!(good["data"]["masked"], "AIza…1234");
        assert_eq!(
            state.store.get("gemini_api_key").unwrap().as_deref(),
            Some("AIzaSyTestKey0000001234")
        );

        let cleared = body_json(delete_api_key(State(state.clone())).await).await;
        assert_eq!(cleared["data"]["configured"], false);
        assert_eq!(state.store.get("gemini_api_key").unwrap(), None);
    }

    #[tokio::test]
    async fn test_location_preference_persists() {
        let state = state_with(Assistant::gemini(AssistantConfig::default()));
        set_location_preference(State(state.clone()), Json(LocationPreference { enabled: true }))
            .await;

        let v = body_json(get_location_preference(State(state.clone())).await).await;
        assert_eq!(v["data"]["enabled"], true);
        assert_eq!(state.store.get("use_location").unwrap().as_deref(), Some("true"));

        clear_preferences(State(state.clone())).await;
        let v = body_json(get_location_preference(State(state)).await).await;
        assert_eq!(v["data"]["enabled"], false);
    }
}
