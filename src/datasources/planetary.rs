//! Landsat Collection 2 surface temperature via Microsoft Planetary Computer.
//!
//! Scenes are located with a STAC search over the parcel; per scene the data
//! API computes zonal statistics of the thermal band inside the polygon, so
//! no raster ever has to be downloaded or decoded here.

use super::SurfaceTemperatureProvider;
use crate::config::PlanetaryConfig;
use crate::error::{HomeGrownError, Result};
use crate::models::{Polygon, SurfaceTemperatureSample};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

const SOURCE_NAME: &str = "Planetary Computer";
/// Landsat C2 L2 surface temperature scale and offset (Kelvin)
const ST_SCALE: f64 = 0.00341802;
const ST_OFFSET: f64 = 149.0;
const KELVIN_OFFSET: f64 = 273.15;
const SEARCH_LIMIT: usize = 250;

pub struct PlanetaryClient {
    client: reqwest::Client,
    config: PlanetaryConfig,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    features: Vec<StacItem>,
}

#[derive(Debug, Deserialize)]
struct StacItem {
    id: String,
    properties: StacProperties,
}

#[derive(Debug, Deserialize)]
struct StacProperties {
    datetime: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatisticsFeature {
    properties: StatisticsProperties,
}

#[derive(Debug, Deserialize)]
struct StatisticsProperties {
    #[serde(default)]
    statistics: HashMap<String, BandStatistics>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct BandStatistics {
    min: Option<f64>,
    max: Option<f64>,
}

/// One scene's extremes before conversion
#[derive(Debug, Clone, Copy, PartialEq)]
struct SceneExtremes {
    date: NaiveDate,
    raw_min: Option<f64>,
    raw_max: Option<f64>,
}

impl PlanetaryClient {
    pub fn new(config: PlanetaryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn search_body(&self, polygon: &Polygon, start: NaiveDate, end: NaiveDate) -> Value {
        json!({
            "collections": [self.config.collection],
            "intersects": polygon.to_geojson(),
            "datetime": format!("{}/{}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d")),
            "query": {"eo:cloud_cover": {"lte": self.config.max_cloud_cover}},
            "limit": SEARCH_LIMIT,
        })
    }

    async fn search(&self, polygon: &Polygon, start: NaiveDate, end: NaiveDate) -> Result<Vec<StacItem>> {
        let url = format!("{}/search", self.config.stac_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&self.search_body(polygon, start, end))
            .send()
            .await
            .map_err(|e| HomeGrownError::DataSourceUnavailable(format!("{}: {}", SOURCE_NAME, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(HomeGrownError::Upstream {
                source_name: SOURCE_NAME.into(),
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let parsed: SearchResponse = response.json().await.map_err(|e| {
            HomeGrownError::DataSourceUnavailable(format!(
                "Failed to parse {} search response: {}",
                SOURCE_NAME, e
            ))
        })?;
        Ok(parsed.features)
    }

    /// Zero is the band's nodata value; masking it keeps a scene's real
    /// minimum when the polygon overlaps the scene edge.
    fn statistics_url(&self, item_id: &str) -> String {
        format!(
            "{}/item/statistics?collection={}&item={}&assets={}&nodata=0",
            self.config.data_api_url.trim_end_matches('/'),
            self.config.collection,
            item_id,
            self.config.band
        )
    }

    async fn scene_extremes(&self, item: &StacItem, feature: &Value) -> Result<SceneExtremes> {
        let date = item_date(item).ok_or_else(|| {
            HomeGrownError::InvalidData(format!("scene {} has no usable datetime", item.id))
        })?;

        let url = self.statistics_url(&item.id);

        let response = self
            .client
            .post(&url)
            .json(feature)
            .send()
            .await
            .map_err(|e| HomeGrownError::DataSourceUnavailable(format!("{}: {}", SOURCE_NAME, e)))?;

        if !response.status().is_success() {
            return Err(HomeGrownError::Upstream {
                source_name: SOURCE_NAME.into(),
                status: response.status().as_u16(),
                message: format!("statistics for scene {}", item.id),
            });
        }

        let stats: StatisticsFeature = response.json().await.map_err(|e| {
            HomeGrownError::InvalidData(format!("scene {} statistics: {}", item.id, e))
        })?;

        let band = band_statistics(&stats.properties.statistics, &self.config.band).ok_or_else(|| {
            HomeGrownError::InvalidData(format!(
                "scene {} has no statistics for band {}",
                item.id, self.config.band
            ))
        })?;

        Ok(SceneExtremes {
            date,
            raw_min: band.min,
            raw_max: band.max,
        })
    }

    pub async fn test_connection(&self) -> Result<bool> {
        let url = format!(
            "{}/collections/{}",
            self.config.stac_url.trim_end_matches('/'),
            self.config.collection
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| HomeGrownError::DataSourceUnavailable(format!("{}: {}", SOURCE_NAME, e)))?;
        Ok(response.status().is_success())
    }
}

#[async_trait]
impl SurfaceTemperatureProvider for PlanetaryClient {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch_surface_temperature(
        &self,
        polygon: &Polygon,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SurfaceTemperatureSample>> {
        let items = self.search(polygon, start, end).await?;
        tracing::info!(scenes = items.len(), "Found Landsat scenes");

        let feature = json!({
            "type": "Feature",
            "properties": {},
            "geometry": polygon.to_geojson(),
        });

        let feature = &feature;
        let scene_futures: Vec<_> = items
            .iter()
            .map(move |item| async move { (item, self.scene_extremes(item, feature).await) })
            .collect();
        let results: Vec<_> = stream::iter(scene_futures)
            .buffer_unordered(self.config.max_concurrent_requests.max(1))
            .collect()
            .await;

        let mut scenes = Vec::with_capacity(results.len());
        for (item, result) in results {
            match result {
                Ok(extremes) => scenes.push(extremes),
                Err(e) => tracing::warn!(scene = %item.id, "Skipping scene: {}", e),
            }
        }

        Ok(combine_by_date(&scenes))
    }
}

fn item_date(item: &StacItem) -> Option<NaiveDate> {
    let raw = item.properties.datetime.as_deref()?;
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

/// Statistics keys carry a band suffix (`lwir11_b1`), so match on the asset
/// name prefix.
fn band_statistics(stats: &HashMap<String, BandStatistics>, band: &str) -> Option<BandStatistics> {
    stats.get(band).copied().or_else(|| {
        let prefix = format!("{}_", band);
        stats
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, s)| *s)
    })
}

/// Raw surface temperature digital number to °C. Zero is the nodata value.
pub fn dn_to_celsius(raw: f64) -> Option<f64> {
    (raw.is_finite() && raw > 0.0).then(|| raw * ST_SCALE + ST_OFFSET - KELVIN_OFFSET)
}

/// Convert scene extremes to °C and merge scenes sharing a date
fn combine_by_date(scenes: &[SceneExtremes]) -> Vec<SurfaceTemperatureSample> {
    let mut by_date: BTreeMap<NaiveDate, SurfaceTemperatureSample> = BTreeMap::new();

    for scene in scenes {
        let tmin = scene.raw_min.and_then(dn_to_celsius);
        let tmax = scene.raw_max.and_then(dn_to_celsius);
        if tmin.is_none() && tmax.is_none() {
            continue;
        }

        let entry = by_date.entry(scene.date).or_insert(SurfaceTemperatureSample {
            date: scene.date,
            tmin_c: None,
            tmax_c: None,
        });
        entry.tmin_c = match (entry.tmin_c, tmin) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        entry.tmax_c = match (entry.tmax_c, tmax) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    by_date.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 7, day).unwrap()
    }

    #[test]
    fn dn_conversion() {
        // 45000 * 0.00341802 + 149 - 273.15 = 29.6609
        let c = dn_to_celsius(45_000.0).unwrap();
        assert!((c - 29.6609).abs() < 1e-4, "got {}", c);
        assert_eq!(dn_to_celsius(0.0), None);
    }

    #[test]
    fn scenes_on_same_date_are_combined() {
        let scenes = [
            SceneExtremes {
                date: date(4),
                raw_min: Some(42_000.0),
                raw_max: Some(46_000.0),
            },
            SceneExtremes {
                date: date(4),
                raw_min: Some(41_000.0),
                raw_max: Some(45_000.0),
            },
            SceneExtremes {
                date: date(20),
                raw_min: Some(43_000.0),
                raw_max: None,
            },
        ];
        let samples = combine_by_date(&scenes);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].tmin_c, dn_to_celsius(41_000.0));
        assert_eq!(samples[0].tmax_c, dn_to_celsius(46_000.0));
        assert_eq!(samples[1].date, date(20));
        assert_eq!(samples[1].tmax_c, None);
    }

    #[test]
    fn nodata_scenes_are_dropped() {
        let scenes = [SceneExtremes {
            date: date(1),
            raw_min: Some(0.0),
            raw_max: None,
        }];
        assert!(combine_by_date(&scenes).is_empty());
    }

    #[test]
    fn band_statistics_match_suffixed_keys() {
        let mut stats = HashMap::new();
        stats.insert(
            "lwir11_b1".to_string(),
            BandStatistics {
                min: Some(1.0),
                max: Some(2.0),
            },
        );
        let band = band_statistics(&stats, "lwir11").unwrap();
        assert_eq!(band.max, Some(2.0));
        assert!(band_statistics(&stats, "lwir").is_none());
    }

    #[test]
    fn statistics_request_masks_nodata() {
        let client = PlanetaryClient::new(PlanetaryConfig::default()).unwrap();
        let url = client.statistics_url("LC09_L2SP_193027_20230714_02_T1");
        assert!(url.starts_with("https://planetarycomputer.microsoft.com/api/data/v1/item/statistics?"));
        assert!(url.contains("item=LC09_L2SP_193027_20230714_02_T1"));
        assert!(url.contains("assets=lwir11"));
        assert!(url.ends_with("&nodata=0"));
    }

    #[test]
    fn item_date_from_rfc3339() {
        let item: StacItem = serde_json::from_value(json!({
            "id": "LC09_L2SP_193027_20230714_02_T1",
            "properties": {"datetime": "2023-07-14T10:01:12.345678Z"}
        }))
        .unwrap();
        assert_eq!(item_date(&item), Some(date(14)));
    }

    #[test]
    fn search_body_filters_cloud_cover() {
        let client = PlanetaryClient::new(PlanetaryConfig::default()).unwrap();
        let polygon = Polygon::new(vec![(48.0, 11.0), (48.0, 11.1), (48.1, 11.1)]);
        let body = client.search_body(&polygon, date(1), date(31));
        assert_eq!(body["collections"][0], "landsat-c2-l2");
        assert_eq!(body["query"]["eo:cloud_cover"]["lte"], 10);
        assert_eq!(body["datetime"], "2023-07-01/2023-07-31");
        assert_eq!(body["intersects"]["type"], "Polygon");
    }
}
