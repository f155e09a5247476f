//! Context module - what the assistant is told
//!
//! `builder` condenses a snapshot into a bounded [`AssistantContext`];
//! `render` turns that context into prompt, fallback and greeting text.
//! The assistant never sees raw readings.

pub mod builder;
pub mod render;

pub use builder::{build_context, AssistantContext, ContextInput, Outlook, TimedValue};
pub use render::{
    fallback_text, forecast_analysis, render_prompt, status_advice, unconfigured_text,
    welcome_text,
};
