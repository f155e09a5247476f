//! LLM Backend Module
//!
//! Provides a unified interface for text-generation backends and the
//! assistant that sits on top of them.
//!
//! ## Architecture
//!
//! - **LlmBackend**: one prompt in, one text block out
//! - **GeminiBackend**: Google Gemini `generateContent` over HTTPS
//! - **Assistant**: prompt rendering, fallback and follow-up suggestions

use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;

pub mod assistant;
mod gemini;
pub mod suggestions;

pub use assistant::{Assistant, AssistantStats, ChatMessage, Exchange, MessageKind};
pub use gemini::GeminiBackend;
pub use suggestions::smart_suggestions;

/// Unified trait for LLM backends
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a response from the LLM given a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Backend errors
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Assistant endpoint returned status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Malformed assistant response: {0}")]
    MalformedResponse(String),
}
