//! Grid Carbon: UK grid carbon-intensity dashboard service
//!
//! Fetches national intensity, forecast, regional and generation-mix data,
//! analyses it, and answers questions about it through an LLM assistant.
//!
//! ## Architecture
//!
//! - **Acquisition**: HTTP client and parse-or-reject payload decoding
//! - **Pipeline**: fetch-join refresh cycles with a last-issued-wins guard
//! - **Analysis**: pure functions over one immutable snapshot
//! - **Context / LLM**: bounded assistant context, prompt and Gemini backend
//! - **Storage**: user settings behind a key-value store (sled on disk)
//! - **API**: axum routes under `/api/v1`

pub mod acquisition;
pub mod analysis;
pub mod api;
pub mod config;
pub mod context;
pub mod llm;
pub mod pipeline;
pub mod storage;
pub mod types;

// Re-export configuration
pub use config::DashboardConfig;

// Re-export commonly used types
pub use types::{GenerationShare, IntensityLevel, IntensityReading, RegionalEntry};

// Re-export pipeline components
pub use pipeline::{AppState, CycleOutcome, CycleStatus, DashboardSnapshot, GridSource, RefreshCoordinator};

// Re-export assistant components
pub use llm::{Assistant, ChatMessage, LlmBackend, MessageKind};
