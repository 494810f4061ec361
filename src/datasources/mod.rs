pub mod cached;
pub mod mistral;
pub mod nasa_power;
pub mod planetary;

pub use cached::CachedClimateProvider;
pub use mistral::MistralSummarizer;
pub use nasa_power::NasaPowerClient;
pub use planetary::PlanetaryClient;

use crate::error::Result;
use crate::models::{ClimateSeries, Polygon, RecommendationReport, SurfaceTemperatureSample};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Source of a complete daily climate series at a point
#[async_trait]
pub trait ClimateProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// One record per calendar day of `year`. Failures are surfaced, never
    /// retried here.
    async fn fetch_climate_series(&self, latitude: f64, longitude: f64, year: i32)
        -> Result<ClimateSeries>;
}

/// Source of sparse, high-resolution surface temperature observations
#[async_trait]
pub trait SurfaceTemperatureProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Zero or more dated samples within `[start, end]`. An empty result is
    /// not an error.
    async fn fetch_surface_temperature(
        &self,
        polygon: &Polygon,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SurfaceTemperatureSample>>;
}

/// Narrative generation over a finished report
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, report: &RecommendationReport) -> Result<String>;
}
