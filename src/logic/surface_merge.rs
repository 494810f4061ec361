//! Precedence merge of satellite surface temperatures over the coarse series.
//!
//! The coarse grid has complete daily coverage at low spatial resolution; the
//! satellite passes are local but irregular (cloud cover, revisit cadence).
//! Where a satellite value exists for a date it replaces the coarse value
//! outright. Nothing is blended.

use crate::models::{ClimateSeries, SurfaceTemperatureSample};
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub series: ClimateSeries,
    pub days_replaced: usize,
}

/// Build a continuous daily series from sparse observations.
///
/// Spans the first to the last observed date. A missing date (or a missing
/// value on an observed date) takes the most recent earlier value of the same
/// field. Nothing is back-filled, so dates before the first observation of a
/// field stay empty and dates with neither field are dropped. Several samples
/// on one date are combined as the min of minima and max of maxima.
pub fn forward_fill(samples: &[SurfaceTemperatureSample]) -> Vec<SurfaceTemperatureSample> {
    let mut by_date: BTreeMap<NaiveDate, (Option<f64>, Option<f64>)> = BTreeMap::new();
    for s in samples {
        let entry = by_date.entry(s.date).or_insert((None, None));
        entry.0 = combine(entry.0, s.tmin_c, f64::min);
        entry.1 = combine(entry.1, s.tmax_c, f64::max);
    }

    let (Some(first), Some(last)) = (
        by_date.keys().next().copied(),
        by_date.keys().next_back().copied(),
    ) else {
        return Vec::new();
    };

    let mut filled = Vec::new();
    let mut last_tmin = None;
    let mut last_tmax = None;

    for date in first.iter_days().take_while(|d| *d <= last) {
        if let Some((tmin, tmax)) = by_date.get(&date) {
            if tmin.is_some() {
                last_tmin = *tmin;
            }
            if tmax.is_some() {
                last_tmax = *tmax;
            }
        }
        if last_tmin.is_some() || last_tmax.is_some() {
            filled.push(SurfaceTemperatureSample {
                date,
                tmin_c: last_tmin,
                tmax_c: last_tmax,
            });
        }
    }

    filled
}

fn combine(current: Option<f64>, new: Option<f64>, pick: fn(f64, f64) -> f64) -> Option<f64> {
    match (current, new.filter(|v| v.is_finite())) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (a, b) => a.or(b),
    }
}

/// Overwrite coarse Tmax/Tmin with forward-filled satellite values.
///
/// Dates absent from the filled series keep their coarse values. Annual
/// statistics must be recomputed from the returned series.
pub fn merge_surface_temperature(
    series: &ClimateSeries,
    samples: &[SurfaceTemperatureSample],
) -> MergeOutcome {
    let filled: BTreeMap<NaiveDate, SurfaceTemperatureSample> = forward_fill(samples)
        .into_iter()
        .map(|s| (s.date, s))
        .collect();

    let mut merged = series.clone();
    let mut days_replaced = 0;

    for record in merged.records.iter_mut() {
        let Some(sample) = filled.get(&record.date) else {
            continue;
        };
        let mut replaced = false;
        if let Some(tmax) = sample.tmax_c {
            record.tmax_c = tmax;
            replaced = true;
        }
        if let Some(tmin) = sample.tmin_c {
            record.tmin_c = tmin;
            replaced = true;
        }
        if replaced {
            days_replaced += 1;
        }
    }

    MergeOutcome {
        series: merged,
        days_replaced,
    }
}
