//! Gemini backend - Google Generative Language `generateContent`
//!
//! One POST per prompt, one text block back. No streaming and no retries;
//! the assistant falls back to local text when this fails.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use super::{LlmBackend, LlmError};
use crate::config::AssistantConfig;

/// Every harm category is blocked at this threshold.
const SAFETY_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_k: u32,
    top_p: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

// ============================================================================
// Backend
// ============================================================================

/// Gemini `generateContent` client bound to one API key.
#[derive(Clone)]
pub struct GeminiBackend {
    http: reqwest::Client,
    url: String,
    api_key: String,
    generation: GenerationConfig,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl GeminiBackend {
    pub fn new(config: &AssistantConfig, api_key: impl Into<String>) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            url: format!(
                "{}/{}:generateContent",
                config.endpoint.trim_end_matches('/'),
                config.model
            ),
            api_key: api_key.into(),
            generation: GenerationConfig {
                temperature: config.temperature,
                top_k: config.top_k,
                top_p: config.top_p,
                max_output_tokens: config.max_output_tokens,
            },
        })
    }

    fn request_body<'a>(&self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
            generation_config: self.generation,
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: SAFETY_THRESHOLD,
                })
                .collect(),
        }
    }

    /// Send one prompt and return the first text part of the first candidate.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, LlmError> {
        let start = Instant::now();
        let resp = self
            .http
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&self.request_body(prompt))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, "Gemini API returned an error");
            return Err(LlmError::Status { status, body });
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| LlmError::MalformedResponse("no candidate text".to_string()))?;

        debug!(
            latency_ms = start.elapsed().as_millis(),
            chars = text.len(),
            "Gemini response received"
        );
        Ok(text)
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(self.generate_text(prompt).await?)
    }

    fn backend_name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use reqwest::StatusCode;
    use serde_json::json;

    fn backend_for(url: &str) -> GeminiBackend {
        let config = AssistantConfig {
            endpoint: url.to_string(),
            ..AssistantConfig::default()
        };
        GeminiBackend::new(&config, "AIzaTestKey").unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let backend = backend_for("http://localhost");
        let body = serde_json::to_value(backend.request_body("hello")).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(body["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(body["safetySettings"][3]["threshold"], SAFETY_THRESHOLD);
    }

    #[test]
    fn test_debug_redacts_key() {
        let backend = backend_for("http://localhost");
        assert!(!format!("{backend:?}").contains("AIzaTestKey"));
    }

    #[tokio::test]
    async fn test_generate_returns_first_part() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/gemini-1.5-flash:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "AIzaTestKey".into()))
            .match_body(Matcher::PartialJson(json!({
                "generationConfig": {"temperature": 0.7, "topP": 0.95}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"candidates":[{"content":{"parts":[{"text":"🌱 Charge at 02:00"}]}}]})
                    .to_string(),
            )
            .create_async()
            .await;

        let backend = backend_for(&server.url());
        assert_eq!(backend.generate("prompt").await.unwrap(), "🌱 Charge at 02:00");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_ok_status_is_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/gemini-1.5-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("API key not valid")
            .create_async()
            .await;

        let backend = backend_for(&server.url());
        match backend.generate_text("prompt").await {
            Err(LlmError::Status { status, body }) => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert!(body.contains("not valid"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_candidates_is_malformed() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/gemini-1.5-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
            .create_async()
            .await;

        let backend = backend_for(&server.url());
        assert!(matches!(
            backend.generate_text("prompt").await,
            Err(LlmError::MalformedResponse(_))
        ));
    }
}
