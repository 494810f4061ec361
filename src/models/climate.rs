use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of coarse gridded climate data at the parcel centroid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyClimateRecord {
    pub date: NaiveDate,
    pub tmax_c: f64,
    pub tmin_c: f64,
    /// All-sky surface shortwave radiation, MJ/m²/day
    pub solar_radiation_mj: f64,
    pub precipitation_mm: f64,
}

impl DailyClimateRecord {
    pub fn avg_temp_c(&self) -> f64 {
        (self.tmax_c + self.tmin_c) / 2.0
    }
}

/// Full-year daily series for one location, ordered by date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateSeries {
    pub latitude: f64,
    pub longitude: f64,
    pub year: i32,
    pub records: Vec<DailyClimateRecord>,
}

impl ClimateSeries {
    pub fn new(latitude: f64, longitude: f64, year: i32, mut records: Vec<DailyClimateRecord>) -> Self {
        records.sort_by_key(|r| r.date);
        Self {
            latitude,
            longitude,
            year,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Satellite-derived land surface temperature extremes for one date.
///
/// Either value may be missing when the scene statistics lacked it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceTemperatureSample {
    pub date: NaiveDate,
    pub tmin_c: Option<f64>,
    pub tmax_c: Option<f64>,
}

impl SurfaceTemperatureSample {
    pub fn new(date: NaiveDate, tmin_c: f64, tmax_c: f64) -> Self {
        Self {
            date,
            tmin_c: Some(tmin_c),
            tmax_c: Some(tmax_c),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatSummary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrecipitationSummary {
    pub total_annual: f64,
    pub mean_daily: f64,
    pub max_daily: f64,
}

/// Annual summary statistics of a daily series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateAnalysis {
    pub solar_radiation: StatSummary,
    pub temperature_max: StatSummary,
    pub temperature_min: StatSummary,
    pub precipitation: PrecipitationSummary,
    /// Sun hours implied by the annual mean radiation, before shading
    pub estimated_sun_hours_daily: f64,
    pub days: usize,
}

impl ClimateAnalysis {
    pub fn mean_temp_c(&self) -> f64 {
        (self.temperature_max.mean + self.temperature_min.mean) / 2.0
    }
}

/// Per-calendar-month temperature means, possibly pooled over several years
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTemperature {
    pub month: u32,
    pub mean_tmax_c: f64,
    pub mean_tmin_c: f64,
    pub mean_avg_c: f64,
    pub days: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    NasaPower,
    #[serde(rename = "nasa_power+landsat")]
    NasaPowerWithLandsat,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::NasaPower => "nasa_power",
            DataSource::NasaPowerWithLandsat => "nasa_power+landsat",
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which sources contributed to the daily temperatures that were scored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataProvenance {
    pub source: DataSource,
    pub surface_samples: usize,
    pub days_replaced: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl DataProvenance {
    pub fn coarse_only(note: Option<String>) -> Self {
        Self {
            source: DataSource::NasaPower,
            surface_samples: 0,
            days_replaced: 0,
            note,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn record(month: u32, day: u32) -> DailyClimateRecord {
        DailyClimateRecord {
            date: NaiveDate::from_ymd_opt(2023, month, day).unwrap(),
            tmax_c: 20.0,
            tmin_c: 10.0,
            solar_radiation_mj: 15.0,
            precipitation_mm: 1.0,
        }
    }

    #[test]
    fn series_is_sorted_on_construction() {
        let series = ClimateSeries::new(48.0, 11.0, 2023, vec![record(3, 1), record(1, 5)]);
        assert_eq!(series.records[0].date.month(), 1);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn record_average_temperature() {
        assert_eq!(record(1, 1).avg_temp_c(), 15.0);
    }

    #[test]
    fn data_source_display() {
        assert_eq!(DataSource::NasaPower.as_str(), "nasa_power");
        assert_eq!(DataSource::NasaPowerWithLandsat.to_string(), "nasa_power+landsat");
        assert_eq!(
            serde_json::to_string(&DataSource::NasaPowerWithLandsat).unwrap(),
            "\"nasa_power+landsat\""
        );
    }
}
