//! Grid source abstraction for the refresh pipeline.
//!
//! The coordinator only needs "give me each section"; where it comes from
//! (the live API, a canned snapshot in tests) is behind [`GridSource`].

use anyhow::Result;
use async_trait::async_trait;

use crate::acquisition::{GridClient, Parsed};
use crate::types::{GenerationShare, IntensityReading, RegionalEntry};

/// Trait abstracting where grid data comes from.
///
/// Each method is one independent section; the coordinator runs them
/// concurrently and tolerates any subset failing.
#[async_trait]
pub trait GridSource: Send + Sync + 'static {
    async fn current(&self) -> Result<IntensityReading>;

    async fn forecast(&self) -> Result<Vec<IntensityReading>>;

    async fn regional(&self) -> Result<Vec<RegionalEntry>>;

    async fn generation(&self) -> Result<Parsed<GenerationShare>>;

    /// Past readings, fetched on demand rather than per cycle
    async fn historical(&self) -> Result<Vec<IntensityReading>>;

    /// Human-readable name for logging
    fn source_name(&self) -> &str;
}

#[async_trait]
impl GridSource for GridClient {
    async fn current(&self) -> Result<IntensityReading> {
        Ok(Self::current(self).await?)
    }

    async fn forecast(&self) -> Result<Vec<IntensityReading>> {
        Ok(Self::forecast(self).await?)
    }

    async fn regional(&self) -> Result<Vec<RegionalEntry>> {
        Ok(Self::regional(self).await?)
    }

    async fn generation(&self) -> Result<Parsed<GenerationShare>> {
        Ok(Self::generation(self).await?)
    }

    async fn historical(&self) -> Result<Vec<IntensityReading>> {
        Ok(Self::historical(self).await?)
    }

    fn source_name(&self) -> &str {
        self.base_url()
    }
}
