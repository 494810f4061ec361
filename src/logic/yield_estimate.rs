use super::calculations::round_to;
use crate::models::{CropProfile, YieldCategory, YieldEstimate, YieldRange};

/// Share of a parcel that ends up planted once paths and margins are removed
pub const CULTIVABLE_FRACTION: f64 = 0.70;

/// Map a suitability score onto the crop's yield bounds (kg/m²).
///
/// Between 70 and 90 the rate interpolates linearly through lower, average
/// and upper. Below 70 it decays towards zero from the lower bound.
pub fn yield_per_m2(crop: &CropProfile, score: f64) -> (f64, YieldCategory) {
    let y = &crop.yield_kg_m2;

    if score >= 90.0 {
        (y.upper, YieldCategory::Upper)
    } else if score >= 80.0 {
        let ratio = (score - 80.0) / 10.0;
        (y.average + (y.upper - y.average) * ratio, YieldCategory::AverageToUpper)
    } else if score >= 70.0 {
        let ratio = (score - 70.0) / 10.0;
        (y.lower + (y.average - y.lower) * ratio, YieldCategory::LowerToAverage)
    } else if score >= 50.0 {
        let ratio = (score - 50.0) / 20.0;
        (y.lower * (0.5 + 0.5 * ratio), YieldCategory::BelowLower)
    } else {
        (y.lower * 0.5 * (score.max(0.0) / 50.0), YieldCategory::Minimal)
    }
}

/// Projected harvest for the whole parcel at the given suitability score
pub fn estimate_yield(crop: &CropProfile, score: f64, area_m2: f64) -> YieldEstimate {
    let (per_m2, category) = yield_per_m2(crop, score);
    let usable_area_m2 = area_m2 * CULTIVABLE_FRACTION;
    let total_kg = per_m2 * usable_area_m2;

    YieldEstimate {
        yield_per_m2_kg: round_to(per_m2, 2),
        usable_area_m2: round_to(usable_area_m2, 2),
        total_yield_kg: round_to(total_kg, 2),
        total_yield_tons: round_to(total_kg / 1000.0, 3),
        yield_category: category,
        yield_category_label: category.as_str().to_string(),
        yield_range: YieldRange {
            lower_kg_m2: crop.yield_kg_m2.lower,
            average_kg_m2: crop.yield_kg_m2.average,
            upper_kg_m2: crop.yield_kg_m2.upper,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_crop;

    #[test]
    fn score_ninety_is_upper_bound() {
        let crop = test_crop("tomatoes");
        let (rate, cat) = yield_per_m2(&crop, 90.0);
        assert_eq!(rate, 6.0);
        assert_eq!(cat, YieldCategory::Upper);
        assert_eq!(yield_per_m2(&crop, 100.0).0, 6.0);
    }

    #[test]
    fn score_fifty_is_half_lower_bound() {
        let crop = test_crop("tomatoes");
        let (rate, cat) = yield_per_m2(&crop, 50.0);
        assert_eq!(rate, 1.0);
        assert_eq!(cat, YieldCategory::BelowLower);
    }

    #[test]
    fn score_zero_is_nothing() {
        let crop = test_crop("tomatoes");
        let (rate, cat) = yield_per_m2(&crop, 0.0);
        assert_eq!(rate, 0.0);
        assert_eq!(cat, YieldCategory::Minimal);
    }

    #[test]
    fn interpolation_bands() {
        let crop = test_crop("tomatoes");
        // average 4 -> upper 6
        assert!((yield_per_m2(&crop, 85.0).0 - 5.0).abs() < 1e-9);
        assert_eq!(yield_per_m2(&crop, 80.0).0, 4.0);
        // lower 2 -> average 4
        assert!((yield_per_m2(&crop, 75.0).0 - 3.0).abs() < 1e-9);
        assert_eq!(yield_per_m2(&crop, 70.0).0, 2.0);
        // 50% -> 100% of lower
        assert!((yield_per_m2(&crop, 60.0).0 - 1.5).abs() < 1e-9);
        // 0 -> 50% of lower
        assert!((yield_per_m2(&crop, 25.0).0 - 0.5).abs() < 1e-9);
    }

    #[test]
    fn yield_is_monotonic_in_score() {
        let crop = test_crop("tomatoes");
        let mut previous = 0.0;
        for step in 0..=200 {
            let (rate, _) = yield_per_m2(&crop, step as f64 * 0.5);
            assert!(rate >= previous - 1e-12, "dropped at score {}", step as f64 * 0.5);
            previous = rate;
        }
    }

    #[test]
    fn total_applies_cultivable_fraction() {
        let crop = test_crop("tomatoes");
        let est = estimate_yield(&crop, 95.0, 1_000.0);
        assert_eq!(est.yield_per_m2_kg, 6.0);
        assert_eq!(est.usable_area_m2, 700.0);
        assert_eq!(est.total_yield_kg, 4200.0);
        assert_eq!(est.total_yield_tons, 4.2);
        assert_eq!(est.yield_category_label, "Upper (Optimal conditions)");
        assert_eq!(est.yield_range.average_kg_m2, 4.0);
    }
}
