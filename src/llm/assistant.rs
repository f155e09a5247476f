//! Assistant - question in, chat message out
//!
//! Wraps an [`LlmBackend`] with the behaviour the dashboard relies on:
//! - no credential: a local "not configured" reply, no network call
//! - backend success: the model's text plus follow-up suggestions
//! - backend failure: an `Error` message carrying the local fallback text
//!
//! `ask` never returns an error; the chat always gets a message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use super::gemini::GeminiBackend;
use super::suggestions::{smart_suggestions, to_owned_list, ERROR_SUGGESTIONS, WELCOME_SUGGESTIONS};
use super::LlmBackend;
use crate::config::AssistantConfig;
use crate::context::{fallback_text, render_prompt, unconfigured_text, welcome_text, AssistantContext};
use crate::storage::UserSettings;

// ============================================================================
// Chat Messages
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    User,
    Assistant,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub kind: MessageKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ChatMessage {
    pub fn new(kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            content: content.into(),
            timestamp: Utc::now(),
            suggestions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }
}

/// A question and its reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    pub question: ChatMessage,
    pub reply: ChatMessage,
}

// ============================================================================
// Statistics
// ============================================================================

#[derive(Debug, Default)]
struct Counters {
    asked: AtomicU64,
    answered: AtomicU64,
    fallbacks: AtomicU64,
    unconfigured: AtomicU64,
    total_latency_ms: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssistantStats {
    pub asked: u64,
    pub answered: u64,
    pub fallbacks: u64,
    pub unconfigured: u64,
    pub avg_latency_ms: f64,
}

// ============================================================================
// Assistant
// ============================================================================

enum BackendSource {
    /// Build a Gemini client from the active key on each question
    Gemini(AssistantConfig),
    /// Always use this backend (tests, alternative providers)
    Fixed(Arc<dyn LlmBackend>),
}

pub struct Assistant {
    source: BackendSource,
    counters: Counters,
}

impl Assistant {
    pub fn gemini(config: AssistantConfig) -> Self {
        Self {
            source: BackendSource::Gemini(config),
            counters: Counters::default(),
        }
    }

    pub fn with_backend(backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            source: BackendSource::Fixed(backend),
            counters: Counters::default(),
        }
    }

    /// Backend for this request, or `None` when no credential exists.
    fn backend_for(&self, settings: &UserSettings) -> anyhow::Result<Option<Arc<dyn LlmBackend>>> {
        match &self.source {
            BackendSource::Fixed(backend) => Ok(Some(Arc::clone(backend))),
            BackendSource::Gemini(config) => match settings.api_key() {
                Some(key) => Ok(Some(Arc::new(GeminiBackend::new(config, key)?))),
                None => Ok(None),
            },
        }
    }

    /// Greeting for a freshly opened chat.
    pub fn welcome(&self, ctx: &AssistantContext, settings: &UserSettings) -> ChatMessage {
        let configured = matches!(self.source, BackendSource::Fixed(_)) || settings.is_configured();
        if configured {
            ChatMessage::new(MessageKind::Assistant, welcome_text(ctx))
                .with_suggestions(to_owned_list(&WELCOME_SUGGESTIONS))
        } else {
            ChatMessage::new(MessageKind::Assistant, unconfigured_text(ctx))
        }
    }

    /// Answer one question against `ctx`.
    pub async fn ask(
        &self,
        question: &str,
        ctx: &AssistantContext,
        settings: &UserSettings,
    ) -> Exchange {
        let question_msg = ChatMessage::new(MessageKind::User, question.trim());
        self.counters.asked.fetch_add(1, Ordering::Relaxed);

        let backend = match self.backend_for(settings) {
            Ok(Some(backend)) => backend,
            Ok(None) => {
                self.counters.unconfigured.fetch_add(1, Ordering::Relaxed);
                info!("Assistant not configured, answering locally");
                let reply = ChatMessage::new(MessageKind::Assistant, unconfigured_text(ctx))
                    .with_suggestions(smart_suggestions(question));
                return Exchange {
                    question: question_msg,
                    reply,
                };
            }
            Err(e) => return self.fallback(question_msg, ctx, &e),
        };

        let prompt = render_prompt(ctx, question);
        let start = Instant::now();
        match backend.generate(&prompt).await {
            Ok(text) => {
                let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                self.counters.answered.fetch_add(1, Ordering::Relaxed);
                self.counters
                    .total_latency_ms
                    .fetch_add(latency_ms, Ordering::Relaxed);
                info!(
                    backend = backend.backend_name(),
                    latency_ms,
                    prompt_chars = prompt.len(),
                    "✓ Assistant answered"
                );
                Exchange {
                    question: question_msg,
                    reply: ChatMessage::new(MessageKind::Assistant, text)
                        .with_suggestions(smart_suggestions(question)),
                }
            }
            Err(e) => self.fallback(question_msg, ctx, &e),
        }
    }

    fn fallback(
        &self,
        question: ChatMessage,
        ctx: &AssistantContext,
        error: &anyhow::Error,
    ) -> Exchange {
        self.counters.fallbacks.fetch_add(1, Ordering::Relaxed);
        warn!(error = %error, "Assistant call failed, using local fallback");
        Exchange {
            question,
            reply: ChatMessage::new(MessageKind::Error, fallback_text(ctx))
                .with_suggestions(to_owned_list(&ERROR_SUGGESTIONS)),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> AssistantStats {
        let answered = self.counters.answered.load(Ordering::Relaxed);
        let total = self.counters.total_latency_ms.load(Ordering::Relaxed);
        AssistantStats {
            asked: self.counters.asked.load(Ordering::Relaxed),
            answered,
            fallbacks: self.counters.fallbacks.load(Ordering::Relaxed),
            unconfigured: self.counters.unconfigured.load(Ordering::Relaxed),
            avg_latency_ms: if answered == 0 {
                0.0
            } else {
                total as f64 / answered as f64
            },
        }
    }
}
