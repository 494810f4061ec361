use super::calculations::{growing_season_sunshine, round_to};
use super::scoring::{score_crop, ScoringContext};
use super::yield_estimate::estimate_yield;
use crate::models::{
    ClimateAnalysis, ClimateSeries, CropCatalog, CropProfile, FilterReason, FilteredCrop,
    Recommendation,
};
use std::sync::Arc;

/// Per-request knobs for ranking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingOptions {
    pub min_score: f64,
    pub limit: usize,
    pub sunshine_factor: f64,
    pub area_m2: f64,
}

/// Ranked crops plus what was filtered out. The totals are counted before
/// `recommendations` is truncated to the requested limit.
#[derive(Debug, Clone)]
pub struct RankedCrops {
    pub recommendations: Vec<Recommendation>,
    pub filtered: Vec<FilteredCrop>,
    pub total_suitable: usize,
    pub total_filtered: usize,
}

/// Outcome of evaluating a single crop
#[derive(Debug, Clone)]
pub enum CropEvaluation {
    Filtered(FilteredCrop),
    Scored(Recommendation),
}

pub struct RecommendationEngine {
    catalog: Arc<CropCatalog>,
}

impl RecommendationEngine {
    pub fn new(catalog: Arc<CropCatalog>) -> Self {
        Self { catalog }
    }

    /// Evaluate every crop in catalog order and rank the survivors
    pub fn rank(
        &self,
        series: &ClimateSeries,
        analysis: &ClimateAnalysis,
        options: &RankingOptions,
    ) -> RankedCrops {
        let ctx = ScoringContext { series, analysis };

        let mut recommendations = Vec::new();
        let mut filtered = Vec::new();

        for crop in self.catalog.iter() {
            match evaluate_crop(crop, &ctx, options) {
                CropEvaluation::Filtered(f) => filtered.push(f),
                CropEvaluation::Scored(rec) => {
                    if rec.suitability.overall_score >= options.min_score {
                        recommendations.push(rec);
                    }
                }
            }
        }

        // sort_by is stable: equal scores keep catalog order
        recommendations.sort_by(|a, b| {
            b.suitability
                .overall_score
                .total_cmp(&a.suitability.overall_score)
        });

        let total_suitable = recommendations.len();
        let total_filtered = filtered.len();
        recommendations.truncate(options.limit);

        tracing::debug!(
            suitable = total_suitable,
            filtered = total_filtered,
            returned = recommendations.len(),
            "Ranked crop catalog"
        );

        RankedCrops {
            recommendations,
            filtered,
            total_suitable,
            total_filtered,
        }
    }
}

/// Sunlight admission, then scoring and yield projection.
///
/// The gate compares unrounded adjusted sunshine; one decimal is only the
/// reported precision.
pub fn evaluate_crop(
    crop: &CropProfile,
    ctx: &ScoringContext<'_>,
    options: &RankingOptions,
) -> CropEvaluation {
    let sunshine = growing_season_sunshine(&ctx.series.records, crop.base_temp, options.sunshine_factor);
    if sunshine.adjusted_hours < crop.min_sun_hours {
        let adjusted = round_to(sunshine.adjusted_hours, 1);
        tracing::trace!(
            crop = %crop.id,
            adjusted_sun_hours = sunshine.adjusted_hours,
            required = crop.min_sun_hours,
            ungrowable = sunshine.is_ungrowable(),
            "Filtered for insufficient sunlight"
        );
        return CropEvaluation::Filtered(FilteredCrop {
            crop_id: crop.id.clone(),
            crop_name: crop.name.clone(),
            reason: FilterReason::InsufficientSunlight,
            adjusted_sun_hours: adjusted,
            required_sun_hours: crop.min_sun_hours,
            growing_days: sunshine.growing_days,
        });
    }

    let mut suitability = score_crop(crop, ctx, &sunshine);
    suitability.yield_estimate = Some(estimate_yield(
        crop,
        suitability.overall_score,
        options.area_m2,
    ));

    CropEvaluation::Scored(Recommendation {
        crop_id: crop.id.clone(),
        crop_name: crop.name.clone(),
        season: crop.season,
        frost_tolerance: crop.frost_tolerance,
        drought_resistance: crop.drought_resistance,
        suitability,
    })
}
