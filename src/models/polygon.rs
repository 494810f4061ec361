use crate::error::{HomeGrownError, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Sunshine factor applied when the polygon carries no per-vertex factors
pub const DEFAULT_SUNSHINE_FACTOR: f64 = 0.7;

/// A user-drawn land parcel as (latitude, longitude) pairs.
///
/// The ring is implicitly closed: the last vertex connects back to the first.
/// Optional per-vertex sunshine factors describe local shading (0 = fully
/// shaded, 1 = open sky).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub coordinates: Vec<(f64, f64)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunshine_factors: Option<Vec<f64>>,
}

impl Polygon {
    pub fn new(coordinates: Vec<(f64, f64)>) -> Self {
        Self {
            coordinates,
            sunshine_factors: None,
        }
    }

    pub fn with_sunshine_factors(mut self, factors: Vec<f64>) -> Self {
        self.sunshine_factors = Some(factors);
        self
    }

    /// Parse the compact `lat,lon;lat,lon;...` form used on the command line
    pub fn parse_coords(input: &str) -> Result<Self> {
        let mut coordinates = Vec::new();
        for pair in input.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (lat, lon) = pair.split_once(',').ok_or_else(|| {
                HomeGrownError::InvalidPolygon(format!("expected 'lat,lon', got '{}'", pair))
            })?;
            let lat: f64 = lat.trim().parse().map_err(|_| {
                HomeGrownError::InvalidPolygon(format!("invalid latitude '{}'", lat.trim()))
            })?;
            let lon: f64 = lon.trim().parse().map_err(|_| {
                HomeGrownError::InvalidPolygon(format!("invalid longitude '{}'", lon.trim()))
            })?;
            coordinates.push((lat, lon));
        }
        Ok(Self::new(coordinates))
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn validate(&self) -> Result<()> {
        if self.coordinates.len() < 3 {
            return Err(HomeGrownError::InvalidPolygon(format!(
                "at least 3 points are required, got {}",
                self.coordinates.len()
            )));
        }

        for (i, (lat, lon)) in self.coordinates.iter().enumerate() {
            if !lat.is_finite() || !(-90.0..=90.0).contains(lat) {
                return Err(HomeGrownError::InvalidPolygon(format!(
                    "point {} has latitude {} outside [-90, 90]",
                    i, lat
                )));
            }
            if !lon.is_finite() || !(-180.0..=180.0).contains(lon) {
                return Err(HomeGrownError::InvalidPolygon(format!(
                    "point {} has longitude {} outside [-180, 180]",
                    i, lon
                )));
            }
        }

        if let Some(factors) = &self.sunshine_factors {
            if factors.len() != self.coordinates.len() {
                return Err(HomeGrownError::InvalidPolygon(format!(
                    "{} sunshine factors given for {} points",
                    factors.len(),
                    self.coordinates.len()
                )));
            }
            if let Some(bad) = factors
                .iter()
                .find(|f| !f.is_finite() || !(0.0..=1.0).contains(*f))
            {
                return Err(HomeGrownError::InvalidPolygon(format!(
                    "sunshine factor {} outside [0, 1]",
                    bad
                )));
            }
        }

        Ok(())
    }

    /// Scalar sunshine reduction for the whole parcel: the mean of the
    /// per-vertex factors, or `default` when none were supplied.
    pub fn sunshine_factor(&self, default: f64) -> f64 {
        match &self.sunshine_factors {
            Some(factors) if !factors.is_empty() => {
                factors.iter().sum::<f64>() / factors.len() as f64
            }
            _ => default,
        }
    }

    /// GeoJSON polygon geometry. GeoJSON wants `[lon, lat]` order and an
    /// explicitly closed ring.
    pub fn to_geojson(&self) -> serde_json::Value {
        let mut ring: Vec<[f64; 2]> = self
            .coordinates
            .iter()
            .map(|(lat, lon)| [*lon, *lat])
            .collect();
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
            if first != last {
                ring.push(first);
            }
        }
        json!({
            "type": "Polygon",
            "coordinates": [ring],
        })
    }
}
