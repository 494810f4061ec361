//! Request pipeline: polygon in, ranked report out.

use super::aggregation::{analyze_climate, monthly_means};
use super::calculations::{round_to, sun_hours_from_radiation};
use super::geometry::{centroid, planar_area_m2};
use super::recommend::{RankingOptions, RecommendationEngine};
use super::surface_merge::merge_surface_temperature;
use crate::datasources::{ClimateProvider, Summarizer, SurfaceTemperatureProvider};
use crate::error::{HomeGrownError, Result};
use crate::models::{
    ClimateAnalysis, ClimateSeries, ClimateSummary, CropCatalog, DataProvenance, DataSource,
    LocationSummary, MonthlyTemperature, Polygon, RecommendationReport, SurfaceTemperatureSample,
};
use chrono::NaiveDate;
use futures::future::join_all;
use std::sync::Arc;

/// Shown in place of a narrative when the summarizer fails
pub const SUMMARY_PLACEHOLDER: &str = "Summary unavailable at the moment.";

/// Service-wide limits and defaults
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisSettings {
    pub max_area_m2: f64,
    pub default_sunshine_factor: f64,
}

#[derive(Debug, Clone)]
pub struct RecommendRequest {
    pub polygon: Polygon,
    pub year: i32,
    pub min_score: f64,
    pub limit: usize,
    /// Overrides the factor derived from the polygon
    pub sunshine_factor: Option<f64>,
    pub use_imagery: bool,
    pub summarize: bool,
}

/// Parcel location derived from a validated polygon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParcelGeometry {
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub area_m2: f64,
}

pub struct AnalysisService {
    climate: Arc<dyn ClimateProvider>,
    surface: Option<Arc<dyn SurfaceTemperatureProvider>>,
    summarizer: Option<Arc<dyn Summarizer>>,
    engine: RecommendationEngine,
    settings: AnalysisSettings,
}

impl AnalysisService {
    pub fn new(
        climate: Arc<dyn ClimateProvider>,
        catalog: Arc<CropCatalog>,
        settings: AnalysisSettings,
    ) -> Self {
        Self {
            climate,
            surface: None,
            summarizer: None,
            engine: RecommendationEngine::new(catalog),
            settings,
        }
    }

    pub fn with_surface_provider(mut self, surface: Arc<dyn SurfaceTemperatureProvider>) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Validate the polygon and derive its centroid and area. Runs before
    /// any upstream call.
    pub fn parcel_geometry(&self, polygon: &Polygon) -> Result<ParcelGeometry> {
        polygon.validate()?;

        let (center_latitude, center_longitude) = centroid(&polygon.coordinates)
            .ok_or_else(|| HomeGrownError::InvalidPolygon("polygon has no points".into()))?;
        let area_m2 = planar_area_m2(&polygon.coordinates);

        if area_m2 > self.settings.max_area_m2 {
            return Err(HomeGrownError::AreaTooLarge {
                actual_m2: area_m2,
                max_m2: self.settings.max_area_m2,
            });
        }

        Ok(ParcelGeometry {
            center_latitude,
            center_longitude,
            area_m2,
        })
    }

    pub async fn recommend(&self, request: &RecommendRequest) -> Result<RecommendationReport> {
        let parcel = self.parcel_geometry(&request.polygon)?;
        let sunshine_factor = request
            .sunshine_factor
            .unwrap_or_else(|| request.polygon.sunshine_factor(self.settings.default_sunshine_factor));
        if !(0.0..=1.0).contains(&sunshine_factor) {
            return Err(HomeGrownError::InvalidPolygon(format!(
                "sunshine factor {} outside [0, 1]",
                sunshine_factor
            )));
        }

        tracing::info!(
            lat = parcel.center_latitude,
            lon = parcel.center_longitude,
            area_m2 = parcel.area_m2,
            vertices = request.polygon.len(),
            year = request.year,
            "Analyzing parcel"
        );

        let (coarse, surface) = tokio::join!(
            self.climate
                .fetch_climate_series(parcel.center_latitude, parcel.center_longitude, request.year),
            self.fetch_surface(&request.polygon, request.year, request.use_imagery),
        );
        let coarse = coarse?;
        let imagery_attempted = request.use_imagery && self.surface.is_some();
        let imagery_source = self.surface.as_ref().map(|s| s.name());

        let (series, data_source) = match surface {
            Ok(samples) if !samples.is_empty() => {
                let outcome = merge_surface_temperature(&coarse, &samples);
                tracing::info!(
                    samples = samples.len(),
                    days_replaced = outcome.days_replaced,
                    "Merged Landsat surface temperature"
                );
                let provenance = DataProvenance {
                    source: DataSource::NasaPowerWithLandsat,
                    surface_samples: samples.len(),
                    days_replaced: outcome.days_replaced,
                    note: None,
                };
                (outcome.series, provenance)
            }
            Ok(_) => (
                coarse,
                DataProvenance::coarse_only(imagery_source.filter(|_| imagery_attempted).map(
                    |source| format!("no usable imagery for the period from {}", source),
                )),
            ),
            Err(e) => {
                let source = imagery_source.unwrap_or("surface imagery");
                tracing::warn!(source, "Surface temperature unavailable, using coarse series: {}", e);
                (
                    coarse,
                    DataProvenance::coarse_only(Some(format!(
                        "imagery unavailable from {}: {}",
                        source, e
                    ))),
                )
            }
        };

        // Annual statistics always come from the series that gets scored
        let analysis = analyze_climate(&series)?;

        let ranked = self.engine.rank(
            &series,
            &analysis,
            &RankingOptions {
                min_score: request.min_score,
                limit: request.limit,
                sunshine_factor,
                area_m2: parcel.area_m2,
            },
        );

        let mut report = RecommendationReport {
            location: LocationSummary {
                center_latitude: round_to(parcel.center_latitude, 6),
                center_longitude: round_to(parcel.center_longitude, 6),
                area_m2: round_to(parcel.area_m2, 2),
                area_hectares: round_to(parcel.area_m2 / 10_000.0, 4),
            },
            year: request.year,
            sunshine_factor,
            climate_summary: climate_summary(&analysis, sunshine_factor),
            data_source,
            recommendations: ranked.recommendations,
            filtered_crops: ranked.filtered,
            total_suitable_crops: ranked.total_suitable,
            total_filtered_by_sunlight: ranked.total_filtered,
            summary: None,
        };

        if request.summarize {
            report.summary = Some(self.summary_for(&report).await);
        }

        tracing::info!(
            suitable = report.total_suitable_crops,
            filtered = report.total_filtered_by_sunlight,
            source = %report.data_source.source,
            "Analysis complete"
        );

        Ok(report)
    }

    async fn fetch_surface(
        &self,
        polygon: &Polygon,
        year: i32,
        enabled: bool,
    ) -> Result<Vec<SurfaceTemperatureSample>> {
        let Some(surface) = self.surface.as_ref().filter(|_| enabled) else {
            return Ok(Vec::new());
        };
        let (Some(start), Some(end)) = (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) else {
            return Err(HomeGrownError::InvalidData(format!("invalid year {}", year)));
        };
        surface.fetch_surface_temperature(polygon, start, end).await
    }

    async fn summary_for(&self, report: &RecommendationReport) -> String {
        let Some(summarizer) = &self.summarizer else {
            return SUMMARY_PLACEHOLDER.to_string();
        };
        match summarizer.summarize(report).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Summary generation failed: {}", e);
                SUMMARY_PLACEHOLDER.to_string()
            }
        }
    }

    /// Annual statistics for a point
    pub async fn climate(&self, latitude: f64, longitude: f64, year: i32) -> Result<(ClimateSeries, ClimateAnalysis)> {
        validate_point(latitude, longitude)?;
        let series = self
            .climate
            .fetch_climate_series(latitude, longitude, year)
            .await?;
        let analysis = analyze_climate(&series)?;
        Ok((series, analysis))
    }

    /// Per-month temperature means pooled across several years, fetched
    /// concurrently. Any failed year fails the whole request.
    pub async fn monthly_climate(
        &self,
        latitude: f64,
        longitude: f64,
        years: &[i32],
    ) -> Result<Vec<MonthlyTemperature>> {
        validate_point(latitude, longitude)?;
        let fetches = years
            .iter()
            .map(|&year| self.climate.fetch_climate_series(latitude, longitude, year));
        let series = join_all(fetches)
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?;
        Ok(monthly_means(&series))
    }
}

fn validate_point(latitude: f64, longitude: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(HomeGrownError::InvalidPolygon(format!(
            "coordinate ({}, {}) out of range",
            latitude, longitude
        )));
    }
    Ok(())
}

fn climate_summary(analysis: &ClimateAnalysis, sunshine_factor: f64) -> ClimateSummary {
    let sun = sun_hours_from_radiation(analysis.solar_radiation.mean);
    ClimateSummary {
        avg_temp_max: round_to(analysis.temperature_max.mean, 1),
        avg_temp_min: round_to(analysis.temperature_min.mean, 1),
        annual_precipitation_mm: round_to(analysis.precipitation.total_annual, 1),
        avg_sun_hours_daily: round_to(sun, 1),
        adjusted_sun_hours_daily: round_to(sun * sunshine_factor, 1),
    }
}
