//! API route definitions
//!
//! Organizes endpoints for the carbon-intensity dashboard:
//! - /api/v1/health, /status, /refresh - service and refresh-cycle state
//! - /api/v1/snapshot, /current, /forecast, /generation, /regional - snapshot sections
//! - /api/v1/forecast/analysis, /historical - derived and on-demand data
//! - /api/v1/assistant/* - assistant context, chat and credential
//! - /api/v1/preferences/* - persisted user preferences

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::handlers::{self, DashboardState};

/// Create all API routes for the dashboard
pub fn api_routes(state: DashboardState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/status", get(handlers::get_status))
        .route("/refresh", post(handlers::trigger_refresh))
        // Snapshot sections
        .route("/snapshot", get(handlers::get_snapshot))
        .route("/current", get(handlers::get_current))
        .route("/forecast", get(handlers::get_forecast))
        .route("/forecast/analysis", get(handlers::get_forecast_analysis))
        .route("/generation", get(handlers::get_generation))
        .route("/regional", get(handlers::get_regional))
        .route("/historical", get(handlers::get_historical))
        // Assistant
        .route("/assistant/context", get(handlers::get_assistant_context))
        .route("/assistant/welcome", get(handlers::get_welcome))
        .route("/assistant/ask", post(handlers::ask_assistant))
        .route(
            "/assistant/key",
            get(handlers::get_api_key)
                .put(handlers::set_api_key)
                .delete(handlers::delete_api_key),
        )
        // Preferences
        .route("/preferences", delete(handlers::clear_preferences))
        .route(
            "/preferences/location",
            get(handlers::get_location_preference).put(handlers::set_location_preference),
        )
        .with_state(state)
}

/// Bare health endpoint at root level for load balancers
pub fn legacy_routes(state: DashboardState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::handlers::test_support::state_with;
    use super::*;
    use crate::config::AssistantConfig;
    use crate::llm::Assistant;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn create_test_app() -> Router {
        api_routes(state_with(Assistant::gemini(AssistantConfig::default())))
    }

    #[tokio::test]
    async fn test_api_routes_health() {
        let response = create_test_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_routes_refresh_requires_post() {
        let response = create_test_app()
            .oneshot(Request::builder().uri("/refresh").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_api_routes_key_put_requires_json() {
        let response = create_test_app()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/assistant/key")
                    .body(Body::from("AIzaPlainText"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = create_test_app()
            .oneshot(Request::builder().uri("/spectrum").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
