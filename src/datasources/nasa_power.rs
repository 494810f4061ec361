use super::ClimateProvider;
use crate::config::NasaPowerConfig;
use crate::error::{HomeGrownError, Result};
use crate::models::{ClimateSeries, DailyClimateRecord};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

const SOURCE_NAME: &str = "NASA POWER";
const PARAMETERS: &str = "ALLSKY_SFC_SW_DWN,T2M_MAX,T2M_MIN,PRECTOTCORR";
/// Marker POWER uses for days it has no value for
const FILL_VALUE: f64 = -999.0;

pub struct NasaPowerClient {
    client: reqwest::Client,
    config: NasaPowerConfig,
}

// NASA POWER daily point response, keyed parameter -> YYYYMMDD -> value
#[derive(Debug, Deserialize)]
struct PowerResponse {
    properties: PowerProperties,
}

#[derive(Debug, Deserialize)]
struct PowerProperties {
    parameter: HashMap<String, BTreeMap<String, f64>>,
}

impl NasaPowerClient {
    pub fn new(config: NasaPowerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, config })
    }

    fn request_url(&self, latitude: f64, longitude: f64, year: i32) -> String {
        format!(
            "{}?parameters={}&community={}&longitude={}&latitude={}&start={}0101&end={}1231&format=JSON",
            self.config.base_url, PARAMETERS, self.config.community, longitude, latitude, year, year
        )
    }

    /// Check the API with a tiny request
    pub async fn test_connection(&self) -> Result<bool> {
        let url = format!(
            "{}?parameters=T2M_MAX&community={}&longitude=0&latitude=0&start=20230101&end=20230101&format=JSON",
            self.config.base_url, self.config.community
        );
        let response = self.client.get(&url).send().await.map_err(|e| {
            HomeGrownError::DataSourceUnavailable(format!("{}: {}", SOURCE_NAME, e))
        })?;
        Ok(response.status().is_success())
    }
}

#[async_trait]
impl ClimateProvider for NasaPowerClient {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch_climate_series(
        &self,
        latitude: f64,
        longitude: f64,
        year: i32,
    ) -> Result<ClimateSeries> {
        let url = self.request_url(latitude, longitude, year);
        tracing::debug!(%url, "Fetching NASA POWER daily series");

        let response = self.client.get(&url).send().await.map_err(|e| {
            HomeGrownError::DataSourceUnavailable(format!("{}: {}", SOURCE_NAME, e))
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(HomeGrownError::RateLimited(SOURCE_NAME.into()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HomeGrownError::Upstream {
                source_name: SOURCE_NAME.into(),
                status: status.as_u16(),
                message: truncate(&body, 200),
            });
        }

        let body = response.text().await.map_err(|e| {
            HomeGrownError::DataSourceUnavailable(format!("{}: {}", SOURCE_NAME, e))
        })?;

        parse_series(&body, latitude, longitude, year)
    }
}

/// Turn a POWER JSON body into a daily series.
///
/// Days missing any of the four parameters, or carrying the fill value, are
/// dropped.
pub fn parse_series(body: &str, latitude: f64, longitude: f64, year: i32) -> Result<ClimateSeries> {
    let response: PowerResponse = serde_json::from_str(body).map_err(|e| {
        HomeGrownError::InvalidData(format!("Failed to parse {} response: {}", SOURCE_NAME, e))
    })?;
    let params = response.properties.parameter;

    let column = |name: &str| {
        params.get(name).ok_or_else(|| {
            HomeGrownError::InvalidData(format!("{} response lacks {}", SOURCE_NAME, name))
        })
    };
    let radiation = column("ALLSKY_SFC_SW_DWN")?;
    let tmax = column("T2M_MAX")?;
    let tmin = column("T2M_MIN")?;
    let precip = column("PRECTOTCORR")?;

    let mut records = Vec::with_capacity(tmax.len());
    let mut dropped = 0usize;

    for (key, &max) in tmax {
        let Ok(date) = NaiveDate::parse_from_str(key, "%Y%m%d") else {
            dropped += 1;
            continue;
        };
        let values = (tmin.get(key), radiation.get(key), precip.get(key));
        let (Some(&min), Some(&rad), Some(&rain)) = values else {
            dropped += 1;
            continue;
        };
        if [max, min, rad, rain].iter().any(|v| *v <= FILL_VALUE) {
            dropped += 1;
            continue;
        }

        records.push(DailyClimateRecord {
            date,
            tmax_c: max,
            tmin_c: min,
            solar_radiation_mj: rad,
            precipitation_mm: rain,
        });
    }

    if dropped > 0 {
        tracing::warn!(
            dropped,
            kept = records.len(),
            year,
            "NASA POWER returned incomplete days"
        );
    }

    Ok(ClimateSeries::new(latitude, longitude, year, records))
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "Feature",
        "geometry": {"type": "Point", "coordinates": [11.58, 48.14, 520.0]},
        "properties": {
            "parameter": {
                "ALLSKY_SFC_SW_DWN": {"20230102": 3.1, "20230101": 2.4, "20230103": -999.0},
                "T2M_MAX": {"20230102": 6.2, "20230101": 4.5, "20230103": 3.0},
                "T2M_MIN": {"20230102": -0.8, "20230101": -2.1, "20230103": -4.0},
                "PRECTOTCORR": {"20230102": 0.0, "20230101": 1.7, "20230103": 0.2}
            }
        }
    }"#;

    #[test]
    fn parses_and_orders_days() {
        let series = parse_series(SAMPLE, 48.14, 11.58, 2023).unwrap();
        assert_eq!(series.len(), 2);
        let first = &series.records[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(first.tmax_c, 4.5);
        assert_eq!(first.tmin_c, -2.1);
        assert_eq!(first.solar_radiation_mj, 2.4);
        assert_eq!(first.precipitation_mm, 1.7);
    }

    #[test]
    fn fill_values_are_dropped() {
        let series = parse_series(SAMPLE, 48.14, 11.58, 2023).unwrap();
        assert!(series
            .records
            .iter()
            .all(|r| r.date != NaiveDate::from_ymd_opt(2023, 1, 3).unwrap()));
    }

    #[test]
    fn missing_parameter_is_invalid_data() {
        let body = r#"{"properties": {"parameter": {"T2M_MAX": {"20230101": 1.0}}}}"#;
        assert!(matches!(
            parse_series(body, 0.0, 0.0, 2023),
            Err(HomeGrownError::InvalidData(_))
        ));
    }

    #[test]
    fn request_url_covers_whole_year() {
        let client = NasaPowerClient::new(NasaPowerConfig::default()).unwrap();
        let url = client.request_url(48.1, 11.5, 2022);
        assert!(url.contains("start=20220101"));
        assert!(url.contains("end=20221231"));
        assert!(url.contains("community=AG"));
        assert!(url.contains(PARAMETERS));
    }
}
