use super::calculations::{round_to, total_gdd, GrowingSeasonSunshine};
use crate::models::{
    ClimateAnalysis, ClimateSeries, ComponentScores, CropProfile, DroughtResistance,
    SuitabilityCategory, SuitabilityMetrics, SuitabilityResult,
};

/// Climate inputs shared by every crop evaluated for one parcel
pub struct ScoringContext<'a> {
    pub series: &'a ClimateSeries,
    pub analysis: &'a ClimateAnalysis,
}

/// GDD sub-score: full marks once the requirement is met, a softened slope
/// between 80% and 100% of it, linear below.
pub fn gdd_score(total_gdd: f64, required_gdd: f64) -> f64 {
    let ratio = total_gdd / required_gdd;
    if ratio >= 1.0 {
        100.0
    } else if ratio >= 0.8 {
        80.0 + (ratio - 0.8) * 100.0
    } else {
        (ratio * 100.0).max(0.0)
    }
}

pub fn sunlight_score(adjusted_sun_hours: f64, optimal_sun_hours: f64) -> f64 {
    (adjusted_sun_hours / optimal_sun_hours * 100.0).clamp(0.0, 100.0)
}

/// Closeness of the annual mean temperature to the middle of the crop's
/// optimal range
pub fn temperature_score(mean_temp: f64, optimal_mid: f64) -> f64 {
    let diff = (mean_temp - optimal_mid).abs();
    if diff <= 3.0 {
        100.0
    } else if diff <= 6.0 {
        80.0
    } else if diff <= 10.0 {
        60.0
    } else {
        (60.0 - (diff - 10.0) * 5.0).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterBalance {
    pub score: f64,
    pub irrigation_needed_mm: f64,
}

/// Water sub-score from annual precipitation versus the seasonal requirement,
/// biased by drought resistance.
pub fn water_score(
    annual_precip_mm: f64,
    required_mm: f64,
    drought: DroughtResistance,
) -> WaterBalance {
    let diff = (annual_precip_mm - required_mm).abs();
    let irrigation_needed_mm = (required_mm - annual_precip_mm).max(0.0);

    let mut score = if diff <= 50.0 {
        100.0
    } else if diff <= 150.0 {
        90.0 - ((diff - 50.0) / 100.0) * 20.0
    } else if diff <= 300.0 {
        70.0 - ((diff - 150.0) / 150.0) * 30.0
    } else {
        (40.0 - ((diff - 300.0) / 100.0) * 5.0).max(20.0)
    };

    if drought.tolerates_deficit() && irrigation_needed_mm > 0.0 {
        score = (score * 1.1).min(100.0);
    } else if drought.is_sensitive() && irrigation_needed_mm > 100.0 {
        score *= 0.9;
    }

    WaterBalance {
        score,
        irrigation_needed_mm,
    }
}

/// Score one crop against the parcel climate.
///
/// `sunshine` must have been computed with this crop's base temperature.
/// The overall score is the weighted sum of the unrounded components; every
/// reported figure is then rounded to one decimal and the category derives
/// from the rounded overall score.
pub fn score_crop(
    crop: &CropProfile,
    ctx: &ScoringContext<'_>,
    sunshine: &GrowingSeasonSunshine,
) -> SuitabilityResult {
    let gdd_total = total_gdd(&ctx.series.records, crop.base_temp, crop.upper_temp);
    let annual_precip = ctx.analysis.precipitation.total_annual;
    let water = water_score(annual_precip, crop.seasonal_water_mm, crop.drought_resistance);

    let raw = ComponentScores {
        gdd: gdd_score(gdd_total, crop.gdd_required),
        sunlight: sunlight_score(sunshine.adjusted_hours, crop.optimal_sun_hours),
        temperature: temperature_score(ctx.analysis.mean_temp_c(), crop.optimal_temp_mid()),
        water: water.score,
    };

    let overall_score = round_to(raw.overall().clamp(0.0, 100.0), 1);

    SuitabilityResult {
        overall_score,
        category: SuitabilityCategory::from_score(overall_score),
        scores: ComponentScores {
            gdd: round_to(raw.gdd, 1),
            sunlight: round_to(raw.sunlight, 1),
            temperature: round_to(raw.temperature, 1),
            water: round_to(raw.water, 1),
        },
        metrics: SuitabilityMetrics {
            total_gdd: round_to(gdd_total, 1),
            required_gdd: crop.gdd_required,
            growing_days: sunshine.growing_days,
            total_days: sunshine.total_days,
            estimated_sun_hours: round_to(sunshine.estimated_hours, 1),
            adjusted_sun_hours: round_to(sunshine.adjusted_hours, 1),
            min_sun_hours: crop.min_sun_hours,
            optimal_sun_hours: crop.optimal_sun_hours,
            annual_precipitation_mm: round_to(annual_precip, 1),
            required_water_mm: crop.seasonal_water_mm,
            irrigation_needed_mm: round_to(water.irrigation_needed_mm, 1),
        },
        yield_estimate: None,
    }
}
