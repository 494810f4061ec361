use super::calculations::sun_hours_from_radiation;
use crate::error::{HomeGrownError, Result};
use crate::models::{
    ClimateAnalysis, ClimateSeries, MonthlyTemperature, PrecipitationSummary, StatSummary,
};
use chrono::Datelike;

/// Calculate mean, min, max and median of a non-empty sample
pub fn summarize(values: &[f64]) -> Option<StatSummary> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };

    Some(StatSummary {
        mean: values.iter().sum::<f64>() / n as f64,
        min: sorted[0],
        max: sorted[n - 1],
        median,
    })
}

/// Reduce a daily series to annual summary statistics.
///
/// Statistics are unweighted over whatever days are present; gaps are not
/// interpolated here.
pub fn analyze_climate(series: &ClimateSeries) -> Result<ClimateAnalysis> {
    let radiation: Vec<f64> = series.records.iter().map(|r| r.solar_radiation_mj).collect();
    let tmax: Vec<f64> = series.records.iter().map(|r| r.tmax_c).collect();
    let tmin: Vec<f64> = series.records.iter().map(|r| r.tmin_c).collect();
    let precip: Vec<f64> = series.records.iter().map(|r| r.precipitation_mm).collect();

    let empty = || {
        HomeGrownError::InvalidData(format!(
            "no daily climate records for ({:.4}, {:.4}) in {}",
            series.latitude, series.longitude, series.year
        ))
    };

    let solar_radiation = summarize(&radiation).ok_or_else(empty)?;
    let temperature_max = summarize(&tmax).ok_or_else(empty)?;
    let temperature_min = summarize(&tmin).ok_or_else(empty)?;

    let total_annual: f64 = precip.iter().sum();
    let precipitation = PrecipitationSummary {
        total_annual,
        mean_daily: total_annual / precip.len() as f64,
        max_daily: precip.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    };

    Ok(ClimateAnalysis {
        estimated_sun_hours_daily: sun_hours_from_radiation(solar_radiation.mean),
        solar_radiation,
        temperature_max,
        temperature_min,
        precipitation,
        days: series.len(),
    })
}

/// Pool several years of daily data into per-calendar-month temperature
/// means. Months without any sample are omitted rather than synthesized.
pub fn monthly_means(series: &[ClimateSeries]) -> Vec<MonthlyTemperature> {
    let mut sums = [(0.0f64, 0.0f64, 0usize); 12];

    for record in series.iter().flat_map(|s| s.records.iter()) {
        let slot = &mut sums[record.date.month0() as usize];
        slot.0 += record.tmax_c;
        slot.1 += record.tmin_c;
        slot.2 += 1;
    }

    sums.iter()
        .enumerate()
        .filter(|(_, (_, _, days))| *days > 0)
        .map(|(i, (tmax_sum, tmin_sum, days))| {
            let mean_tmax_c = tmax_sum / *days as f64;
            let mean_tmin_c = tmin_sum / *days as f64;
            MonthlyTemperature {
                month: i as u32 + 1,
                mean_tmax_c,
                mean_tmin_c,
                mean_avg_c: (mean_tmax_c + mean_tmin_c) / 2.0,
                days: *days,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DailyClimateRecord;
    use chrono::NaiveDate;

    fn record(year: i32, month: u32, day: u32, tmax: f64, tmin: f64, precip: f64) -> DailyClimateRecord {
        DailyClimateRecord {
            date: NaiveDate::from_ymd_opt(year, month, day).unwrap(),
            tmax_c: tmax,
            tmin_c: tmin,
            solar_radiation_mj: 10.0,
            precipitation_mm: precip,
        }
    }

    #[test]
    fn summarize_odd_and_even() {
        let odd = summarize(&[3.0, 1.0, 2.0]).unwrap();
        assert_eq!(odd.median, 2.0);
        assert_eq!(odd.min, 1.0);
        assert_eq!(odd.max, 3.0);
        assert_eq!(odd.mean, 2.0);

        let even = summarize(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(even.median, 2.5);
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn analyze_annual_statistics() {
        let series = ClimateSeries::new(
            48.1,
            11.6,
            2023,
            vec![
                record(2023, 1, 1, 2.0, -4.0, 0.0),
                record(2023, 1, 2, 6.0, -2.0, 4.5),
                record(2023, 7, 1, 28.0, 16.0, 12.0),
            ],
        );
        let analysis = analyze_climate(&series).unwrap();
        assert_eq!(analysis.days, 3);
        assert_eq!(analysis.temperature_max.max, 28.0);
        assert_eq!(analysis.temperature_min.min, -4.0);
        assert_eq!(analysis.temperature_max.median, 6.0);
        assert!((analysis.precipitation.total_annual - 16.5).abs() < 1e-12);
        assert!((analysis.precipitation.mean_daily - 5.5).abs() < 1e-12);
        assert_eq!(analysis.precipitation.max_daily, 12.0);
        assert!((analysis.estimated_sun_hours_daily - sun_hours_from_radiation(10.0)).abs() < 1e-12);
    }

    #[test]
    fn analyze_empty_series_is_an_error() {
        let series = ClimateSeries::new(0.0, 0.0, 2023, Vec::new());
        assert!(analyze_climate(&series).is_err());
    }

    #[test]
    fn monthly_means_pool_years_and_skip_empty_months() {
        let y1 = ClimateSeries::new(
            0.0,
            0.0,
            2022,
            vec![record(2022, 1, 1, 4.0, 0.0, 0.0), record(2022, 3, 1, 10.0, 2.0, 0.0)],
        );
        let y2 = ClimateSeries::new(0.0, 0.0, 2023, vec![record(2023, 1, 1, 8.0, 2.0, 0.0)]);

        let months = monthly_means(&[y1, y2]);
        assert_eq!(months.len(), 2);

        let jan = &months[0];
        assert_eq!(jan.month, 1);
        assert_eq!(jan.days, 2);
        assert_eq!(jan.mean_tmax_c, 6.0);
        assert_eq!(jan.mean_tmin_c, 1.0);
        assert_eq!(jan.mean_avg_c, 3.5);

        assert_eq!(months[1].month, 3);
        assert!(months.iter().all(|m| m.month != 2));
    }
}
