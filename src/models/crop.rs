use crate::error::{HomeGrownError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

const EMBEDDED_CATALOG: &str = include_str!("../../data/crops.yaml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DroughtResistance {
    Sensitive,
    ModerateSensitive,
    Moderate,
    ModerateTolerant,
    Tolerant,
}

impl DroughtResistance {
    pub fn as_str(&self) -> &'static str {
        match self {
            DroughtResistance::Sensitive => "sensitive",
            DroughtResistance::ModerateSensitive => "moderate_sensitive",
            DroughtResistance::Moderate => "moderate",
            DroughtResistance::ModerateTolerant => "moderate_tolerant",
            DroughtResistance::Tolerant => "tolerant",
        }
    }

    /// Crops that cope with a rainfall deficit get a water-score bonus
    pub fn tolerates_deficit(&self) -> bool {
        matches!(
            self,
            DroughtResistance::Tolerant | DroughtResistance::ModerateTolerant
        )
    }

    pub fn is_sensitive(&self) -> bool {
        matches!(self, DroughtResistance::Sensitive)
    }
}

impl std::fmt::Display for DroughtResistance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrostTolerance {
    VeryHardy,
    Hardy,
    HalfHardy,
    Tender,
}

impl FrostTolerance {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrostTolerance::VeryHardy => "very_hardy",
            FrostTolerance::Hardy => "hardy",
            FrostTolerance::HalfHardy => "half_hardy",
            FrostTolerance::Tender => "tender",
        }
    }
}

impl std::fmt::Display for FrostTolerance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Cool,
    Warm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterNeeds {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GerminationRange {
    pub min: f64,
    pub optimal: f64,
    pub max: f64,
}

/// Yield per square metre under poor, typical and optimal conditions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldBounds {
    pub lower: f64,
    pub average: f64,
    pub upper: f64,
}

/// Static agronomic parameters of one crop. Temperatures in °C.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropProfile {
    pub id: String,
    pub name: String,
    pub base_temp: f64,
    pub upper_temp: f64,
    pub gdd_required: f64,
    pub min_sun_hours: f64,
    pub optimal_sun_hours: f64,
    pub optimal_temp_min: f64,
    pub optimal_temp_max: f64,
    pub seasonal_water_mm: f64,
    pub drought_resistance: DroughtResistance,
    pub frost_tolerance: FrostTolerance,
    pub season: Season,
    pub water_needs: WaterNeeds,
    pub germination_temp: GerminationRange,
    pub yield_kg_m2: YieldBounds,
}

impl CropProfile {
    pub fn optimal_temp_mid(&self) -> f64 {
        (self.optimal_temp_min + self.optimal_temp_max) / 2.0
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| HomeGrownError::InvalidCrop {
            crop_id: self.id.clone(),
            reason,
        };

        if self.id.trim().is_empty() {
            return Err(invalid("id must not be empty".into()));
        }
        if self.base_temp >= self.upper_temp {
            return Err(invalid(format!(
                "base_temp {} must be below upper_temp {}",
                self.base_temp, self.upper_temp
            )));
        }
        if self.optimal_temp_min >= self.optimal_temp_max {
            return Err(invalid(format!(
                "optimal_temp_min {} must be below optimal_temp_max {}",
                self.optimal_temp_min, self.optimal_temp_max
            )));
        }
        if self.gdd_required <= 0.0 {
            return Err(invalid("gdd_required must be positive".into()));
        }
        if self.min_sun_hours <= 0.0 || self.optimal_sun_hours < self.min_sun_hours {
            return Err(invalid(format!(
                "sun hours must satisfy 0 < min ({}) <= optimal ({})",
                self.min_sun_hours, self.optimal_sun_hours
            )));
        }
        if self.seasonal_water_mm < 0.0 {
            return Err(invalid("seasonal_water_mm must not be negative".into()));
        }

        let y = &self.yield_kg_m2;
        if y.lower < 0.0 || y.lower > y.average || y.average > y.upper {
            return Err(invalid(format!(
                "yield bounds must satisfy 0 <= lower ({}) <= average ({}) <= upper ({})",
                y.lower, y.average, y.upper
            )));
        }

        Ok(())
    }
}

/// Immutable, validated collection of crop profiles in file order
#[derive(Debug, Clone)]
pub struct CropCatalog {
    crops: Vec<CropProfile>,
}

impl CropCatalog {
    /// Load from `path`, or the catalog compiled into the binary
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p).map_err(|e| {
                    HomeGrownError::Config(format!("Failed to read crop catalog {:?}: {}", p, e))
                })?;
                Self::from_yaml(&content)
            }
            None => Self::from_yaml(EMBEDDED_CATALOG),
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let crops: Vec<CropProfile> = serde_yaml::from_str(content)?;
        Self::new(crops)
    }

    pub fn new(crops: Vec<CropProfile>) -> Result<Self> {
        let mut seen = HashSet::new();
        for crop in &crops {
            crop.validate()?;
            if !seen.insert(crop.id.as_str()) {
                return Err(HomeGrownError::InvalidCrop {
                    crop_id: crop.id.clone(),
                    reason: "duplicate id".into(),
                });
            }
        }
        Ok(Self { crops })
    }

    pub fn get(&self, id: &str) -> Option<&CropProfile> {
        self.crops.iter().find(|c| c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CropProfile> {
        self.crops.iter()
    }

    pub fn crops(&self) -> &[CropProfile] {
        &self.crops
    }

    pub fn len(&self) -> usize {
        self.crops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn test_crop(id: &str) -> CropProfile {
    CropProfile {
        id: id.to_string(),
        name: id.to_string(),
        base_temp: 10.0,
        upper_temp: 35.0,
        gdd_required: 1500.0,
        min_sun_hours: 6.0,
        optimal_sun_hours: 8.0,
        optimal_temp_min: 21.0,
        optimal_temp_max: 27.0,
        seasonal_water_mm: 500.0,
        drought_resistance: DroughtResistance::Moderate,
        frost_tolerance: FrostTolerance::Tender,
        season: Season::Warm,
        water_needs: WaterNeeds::Moderate,
        germination_temp: GerminationRange {
            min: 10.0,
            optimal: 25.0,
            max: 35.0,
        },
        yield_kg_m2: YieldBounds {
            lower: 2.0,
            average: 4.0,
            upper: 6.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_is_valid() {
        let catalog = CropCatalog::load(None).unwrap();
        assert!(catalog.len() >= 30);
        assert!(!catalog.is_empty());
        let tomatoes = catalog.get("tomatoes").unwrap();
        assert_eq!(tomatoes.base_temp, 8.5);
        assert_eq!(tomatoes.drought_resistance, DroughtResistance::Sensitive);
        assert_eq!(catalog.crops()[0].id, "tomatoes");
    }

    #[test]
    fn rejects_inverted_temperatures() {
        let mut crop = test_crop("bad");
        crop.base_temp = 36.0;
        let err = CropCatalog::new(vec![crop]).unwrap_err();
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn rejects_non_monotonic_yield() {
        let mut crop = test_crop("bad");
        crop.yield_kg_m2.average = 10.0;
        assert!(crop.validate().is_err());
    }

    #[test]
    fn rejects_optimal_sun_below_minimum() {
        let mut crop = test_crop("bad");
        crop.optimal_sun_hours = 4.0;
        assert!(crop.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = CropCatalog::new(vec![test_crop("kale"), test_crop("kale")]).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn empty_catalog_file_loads() {
        let catalog = CropCatalog::from_yaml("[]").unwrap();
        assert!(catalog.is_empty());
        assert_eq!(catalog.iter().count(), 0);
    }

    #[test]
    fn drought_resistance_groups() {
        assert!(DroughtResistance::Tolerant.tolerates_deficit());
        assert!(DroughtResistance::ModerateTolerant.tolerates_deficit());
        assert!(!DroughtResistance::Moderate.tolerates_deficit());
        assert!(DroughtResistance::Sensitive.is_sensitive());
        assert!(!DroughtResistance::ModerateSensitive.is_sensitive());
    }

    #[test]
    fn parses_snake_case_enums() {
        let yaml = r#"
- id: wheat
  name: Wheat
  base_temp: 0
  upper_temp: 33
  gdd_required: 2000
  min_sun_hours: 5
  optimal_sun_hours: 7
  optimal_temp_min: 15
  optimal_temp_max: 24
  seasonal_water_mm: 550
  drought_resistance: moderate_tolerant
  frost_tolerance: very_hardy
  season: cool
  water_needs: moderate
  germination_temp: { min: 4, optimal: 20, max: 32 }
  yield_kg_m2: { lower: 0.3, average: 0.6, upper: 0.9 }
"#;
        let catalog = CropCatalog::from_yaml(yaml).unwrap();
        let wheat = catalog.get("wheat").unwrap();
        assert_eq!(wheat.drought_resistance, DroughtResistance::ModerateTolerant);
        assert_eq!(wheat.frost_tolerance, FrostTolerance::VeryHardy);
    }
}
