//! Grid data acquisition module
//!
//! Fetches intensity, regional and generation data from the upstream API and
//! normalises it into the typed model.

pub mod grid_client;
pub mod payload;

pub use grid_client::{GridClient, GridClientError};
pub use payload::{parse_timestamp, Parsed, PayloadError};
