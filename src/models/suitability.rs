use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SuitabilityCategory {
    Poor,
    Moderate,
    Good,
    Excellent,
}

impl SuitabilityCategory {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            SuitabilityCategory::Excellent
        } else if score >= 65.0 {
            SuitabilityCategory::Good
        } else if score >= 50.0 {
            SuitabilityCategory::Moderate
        } else {
            SuitabilityCategory::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SuitabilityCategory::Excellent => "Excellent",
            SuitabilityCategory::Good => "Good",
            SuitabilityCategory::Moderate => "Moderate",
            SuitabilityCategory::Poor => "Poor",
        }
    }
}

impl std::fmt::Display for SuitabilityCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub const GDD_WEIGHT: f64 = 0.35;
pub const SUNLIGHT_WEIGHT: f64 = 0.25;
pub const TEMPERATURE_WEIGHT: f64 = 0.25;
pub const WATER_WEIGHT: f64 = 0.15;

/// The four sub-scores, each in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub gdd: f64,
    pub sunlight: f64,
    pub temperature: f64,
    pub water: f64,
}

impl ComponentScores {
    pub fn overall(&self) -> f64 {
        self.gdd * GDD_WEIGHT
            + self.sunlight * SUNLIGHT_WEIGHT
            + self.temperature * TEMPERATURE_WEIGHT
            + self.water * WATER_WEIGHT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuitabilityMetrics {
    pub total_gdd: f64,
    pub required_gdd: f64,
    pub growing_days: usize,
    pub total_days: usize,
    pub estimated_sun_hours: f64,
    pub adjusted_sun_hours: f64,
    pub min_sun_hours: f64,
    pub optimal_sun_hours: f64,
    pub annual_precipitation_mm: f64,
    pub required_water_mm: f64,
    pub irrigation_needed_mm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YieldCategory {
    Upper,
    AverageToUpper,
    LowerToAverage,
    BelowLower,
    Minimal,
}

impl YieldCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            YieldCategory::Upper => "Upper (Optimal conditions)",
            YieldCategory::AverageToUpper => "Average to Upper",
            YieldCategory::LowerToAverage => "Lower to Average",
            YieldCategory::BelowLower => "Below Lower (Challenging conditions)",
            YieldCategory::Minimal => "Minimal (Poor conditions)",
        }
    }
}

impl std::fmt::Display for YieldCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldRange {
    pub lower_kg_m2: f64,
    pub average_kg_m2: f64,
    pub upper_kg_m2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldEstimate {
    pub yield_per_m2_kg: f64,
    pub usable_area_m2: f64,
    pub total_yield_kg: f64,
    pub total_yield_tons: f64,
    pub yield_category: YieldCategory,
    pub yield_category_label: String,
    pub yield_range: YieldRange,
}

/// Per-crop scoring outcome. Scores and metrics are rounded to one decimal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuitabilityResult {
    pub overall_score: f64,
    pub category: SuitabilityCategory,
    pub scores: ComponentScores,
    pub metrics: SuitabilityMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yield_estimate: Option<YieldEstimate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_thresholds() {
        assert_eq!(SuitabilityCategory::from_score(80.0), SuitabilityCategory::Excellent);
        assert_eq!(SuitabilityCategory::from_score(79.9), SuitabilityCategory::Good);
        assert_eq!(SuitabilityCategory::from_score(65.0), SuitabilityCategory::Good);
        assert_eq!(SuitabilityCategory::from_score(64.9), SuitabilityCategory::Moderate);
        assert_eq!(SuitabilityCategory::from_score(50.0), SuitabilityCategory::Moderate);
        assert_eq!(SuitabilityCategory::from_score(49.9), SuitabilityCategory::Poor);
        assert_eq!(SuitabilityCategory::from_score(0.0), SuitabilityCategory::Poor);
    }

    #[test]
    fn weights_sum_to_one() {
        let total = GDD_WEIGHT + SUNLIGHT_WEIGHT + TEMPERATURE_WEIGHT + WATER_WEIGHT;
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn overall_is_weighted_sum() {
        let scores = ComponentScores {
            gdd: 100.0,
            sunlight: 80.0,
            temperature: 60.0,
            water: 40.0,
        };
        assert!((scores.overall() - (35.0 + 20.0 + 15.0 + 6.0)).abs() < 1e-9);
    }
}
