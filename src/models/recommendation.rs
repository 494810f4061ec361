use super::climate::DataProvenance;
use super::crop::{DroughtResistance, FrostTolerance, Season};
use super::suitability::SuitabilityResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub crop_id: String,
    pub crop_name: String,
    pub season: Season,
    pub frost_tolerance: FrostTolerance,
    pub drought_resistance: DroughtResistance,
    pub suitability: SuitabilityResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterReason {
    InsufficientSunlight,
}

impl FilterReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterReason::InsufficientSunlight => "insufficient_sunlight",
        }
    }
}

impl std::fmt::Display for FilterReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A crop excluded before scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilteredCrop {
    pub crop_id: String,
    pub crop_name: String,
    pub reason: FilterReason,
    pub adjusted_sun_hours: f64,
    pub required_sun_hours: f64,
    pub growing_days: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSummary {
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub area_m2: f64,
    pub area_hectares: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimateSummary {
    pub avg_temp_max: f64,
    pub avg_temp_min: f64,
    pub annual_precipitation_mm: f64,
    pub avg_sun_hours_daily: f64,
    pub adjusted_sun_hours_daily: f64,
}

/// Everything a request-handling layer needs to render one analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub location: LocationSummary,
    pub year: i32,
    pub sunshine_factor: f64,
    pub climate_summary: ClimateSummary,
    pub data_source: DataProvenance,
    pub recommendations: Vec<Recommendation>,
    pub filtered_crops: Vec<FilteredCrop>,
    pub total_suitable_crops: usize,
    pub total_filtered_by_sunlight: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}
