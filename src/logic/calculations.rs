use crate::models::DailyClimateRecord;
use serde::{Deserialize, Serialize};

/// 1 MJ = 0.278 kWh
pub const MJ_TO_KWH: f64 = 0.278;
/// Irradiation (kWh/m²) counted as one hour of usable sun
pub const KWH_PER_SUN_HOUR: f64 = 0.35;
/// Upper bound on plausible daily sunshine
pub const MAX_DAILY_SUN_HOURS: f64 = 16.0;

/// Growing Degree Days for a single day (°C).
///
/// Tmax and Tmin are each clamped into `[base, upper]` before averaging, so a
/// hot afternoon cannot compensate for a night below the base temperature.
/// The result always lies in `[0, upper - base]`.
pub fn daily_gdd(tmax: f64, tmin: f64, base: f64, upper: f64) -> f64 {
    let adj_tmax = tmax.clamp(base, upper);
    let adj_tmin = tmin.clamp(base, upper);
    let avg = (adj_tmax + adj_tmin) / 2.0;
    (avg - base).max(0.0)
}

/// Sum of daily GDD over every record in the series
pub fn total_gdd(records: &[DailyClimateRecord], base: f64, upper: f64) -> f64 {
    records
        .iter()
        .map(|r| daily_gdd(r.tmax_c, r.tmin_c, base, upper))
        .sum()
}

/// Convert daily radiation (MJ/m²) to sunshine hours, clamped to [0, 16]
pub fn sun_hours_from_radiation(radiation_mj: f64) -> f64 {
    let kwh = radiation_mj * MJ_TO_KWH;
    (kwh / KWH_PER_SUN_HOUR).clamp(0.0, MAX_DAILY_SUN_HOURS)
}

/// Sunshine available on the days a particular crop can actually grow
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GrowingSeasonSunshine {
    pub estimated_hours: f64,
    pub adjusted_hours: f64,
    pub growing_days: usize,
    pub total_days: usize,
}

impl GrowingSeasonSunshine {
    pub fn is_ungrowable(&self) -> bool {
        self.growing_days == 0
    }
}

/// Mean sunshine over days whose mean temperature exceeds `base_temp`.
///
/// Must be evaluated per crop since the growing set depends on its base
/// temperature. With no qualifying day every figure except `total_days` is 0.
pub fn growing_season_sunshine(
    records: &[DailyClimateRecord],
    base_temp: f64,
    sunshine_factor: f64,
) -> GrowingSeasonSunshine {
    let growing: Vec<f64> = records
        .iter()
        .filter(|r| r.avg_temp_c() > base_temp)
        .map(|r| sun_hours_from_radiation(r.solar_radiation_mj))
        .collect();

    if growing.is_empty() {
        return GrowingSeasonSunshine {
            total_days: records.len(),
            ..Default::default()
        };
    }

    let estimated_hours = growing.iter().sum::<f64>() / growing.len() as f64;

    GrowingSeasonSunshine {
        estimated_hours,
        adjusted_hours: estimated_hours * sunshine_factor,
        growing_days: growing.len(),
        total_days: records.len(),
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn day(offset: i64, tmax: f64, tmin: f64, radiation: f64) -> DailyClimateRecord {
        DailyClimateRecord {
            date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Duration::days(offset),
            tmax_c: tmax,
            tmin_c: tmin,
            solar_radiation_mj: radiation,
            precipitation_mm: 0.0,
        }
    }

    #[test]
    fn gdd_unclamped() {
        assert_eq!(daily_gdd(30.0, 20.0, 10.0, 35.0), 15.0);
        assert_eq!(daily_gdd(20.0, 30.0, 10.0, 35.0), 15.0);
    }

    #[test]
    fn gdd_clamps_each_bound_before_averaging() {
        // Raw average is 10 (= base) but Tmin is lifted to base first
        assert_eq!(daily_gdd(25.0, -5.0, 10.0, 35.0), 7.5);
        // Tmax above upper is cut back to upper
        assert_eq!(daily_gdd(45.0, 25.0, 10.0, 35.0), 20.0);
    }

    #[test]
    fn gdd_all_below_base_is_zero() {
        assert_eq!(daily_gdd(5.0, -2.0, 10.0, 35.0), 0.0);
    }

    #[test]
    fn gdd_all_above_upper_is_capped() {
        assert_eq!(daily_gdd(50.0, 40.0, 10.0, 35.0), 25.0);
    }

    #[test]
    fn gdd_swap_inside_band() {
        assert_eq!(daily_gdd(22.0, 14.0, 10.0, 35.0), daily_gdd(14.0, 22.0, 10.0, 35.0));
    }

    #[test]
    fn gdd_clamped_regime_differs_from_clamped_average() {
        let gdd = daily_gdd(40.0, -10.0, 10.0, 35.0);
        assert_eq!(gdd, 12.5);
        let naive = ((40.0 + -10.0) / 2.0_f64).clamp(10.0, 35.0) - 10.0;
        assert_eq!(naive, 5.0);
        assert_eq!(daily_gdd(-10.0, 40.0, 10.0, 35.0), gdd);
    }

    #[test]
    fn total_gdd_for_constant_year() {
        let records: Vec<_> = (0..365).map(|i| day(i, 30.0, 20.0, 15.0)).collect();
        // avg(30, 20) - 10 = 15 per day
        assert_eq!(total_gdd(&records, 10.0, 35.0), 5475.0);
    }

    #[test]
    fn sun_hours_conversion() {
        // 20 MJ -> 5.56 kWh -> 15.89 h
        assert!((sun_hours_from_radiation(20.0) - 15.885714).abs() < 1e-5);
        assert_eq!(sun_hours_from_radiation(40.0), MAX_DAILY_SUN_HOURS);
        assert_eq!(sun_hours_from_radiation(-1.0), 0.0);
    }

    #[test]
    fn sunshine_only_counts_growing_days() {
        let records = vec![
            day(0, 5.0, 0.0, 20.0),  // too cold
            day(1, 25.0, 15.0, 7.0), // grows
            day(2, 25.0, 15.0, 14.0),
        ];
        let s = growing_season_sunshine(&records, 10.0, 0.5);
        assert_eq!(s.growing_days, 2);
        assert_eq!(s.total_days, 3);
        let expected = (sun_hours_from_radiation(7.0) + sun_hours_from_radiation(14.0)) / 2.0;
        assert!((s.estimated_hours - expected).abs() < 1e-12);
        assert!((s.adjusted_hours - expected * 0.5).abs() < 1e-12);
    }

    #[test]
    fn sunshine_threshold_is_strict() {
        // Mean exactly at base does not count
        let records = vec![day(0, 15.0, 5.0, 20.0)];
        let s = growing_season_sunshine(&records, 10.0, 1.0);
        assert!(s.is_ungrowable());
    }

    #[test]
    fn sunshine_no_growing_days_is_all_zero() {
        let records: Vec<_> = (0..10).map(|i| day(i, 2.0, -4.0, 12.0)).collect();
        let s = growing_season_sunshine(&records, 4.0, 0.7);
        assert_eq!(s.estimated_hours, 0.0);
        assert_eq!(s.adjusted_hours, 0.0);
        assert_eq!(s.growing_days, 0);
        assert_eq!(s.total_days, 10);
    }

    #[test]
    fn sunshine_differs_per_base_temperature() {
        let records = vec![day(0, 12.0, 4.0, 10.0), day(1, 28.0, 18.0, 20.0)];
        let cool = growing_season_sunshine(&records, 4.0, 1.0);
        let warm = growing_season_sunshine(&records, 10.0, 1.0);
        assert_eq!(cool.growing_days, 2);
        assert_eq!(warm.growing_days, 1);
        assert!(warm.estimated_hours > cool.estimated_hours);
    }

    #[test]
    fn round_to_boundary() {
        assert_eq!(round_to(49.95, 1), 50.0);
        assert_eq!(round_to(12.346, 2), 12.35);
        assert_eq!(round_to(-1.25, 1), -1.3);
    }

    proptest! {
        #[test]
        fn gdd_within_band(
            tmax in -40.0f64..60.0,
            tmin in -40.0f64..60.0,
            base in -5.0f64..15.0,
            span in 0.5f64..30.0,
        ) {
            let upper = base + span;
            let gdd = daily_gdd(tmax, tmin, base, upper);
            prop_assert!(gdd >= 0.0);
            prop_assert!(gdd <= upper - base + 1e-9);
        }

        #[test]
        fn gdd_symmetric_inside_band(
            base in -5.0f64..15.0,
            a in 0.0f64..1.0,
            b in 0.0f64..1.0,
        ) {
            let upper = base + 20.0;
            let t1 = base + a * 20.0;
            let t2 = base + b * 20.0;
            prop_assert!((daily_gdd(t1, t2, base, upper) - daily_gdd(t2, t1, base, upper)).abs() < 1e-12);
        }
    }
}
