//! Scalar statistics shared across the pipeline.
//!
//! Percentile and median follow numpy's linear-interpolation convention so
//! thresholds match the values the measurement campaign was calibrated with.

use crate::consts::SI_EPSILON;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divides by N).
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Percentile with linear interpolation between closest ranks.
///
/// `q` is in [0, 100]. Returns 0.0 for an empty slice.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = q.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

pub fn median(values: &[f64]) -> f64 {
    percentile(values, 50.0)
}

/// Scintillation index of an intensity time series: var / (mean^2 + eps).
///
/// The epsilon keeps a degenerate all-zero trace finite; a constant trace
/// yields exactly 0.
pub fn scintillation_index(trace: &[f64]) -> f64 {
    let m = mean(trace);
    variance(trace) / (m * m + SI_EPSILON)
}

/// Mean/std/min/max summary of a slice, as exported alongside each trace.
#[derive(Clone, Copy, Debug, Default, serde::Serialize)]
pub struct TraceStats {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl TraceStats {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        Self {
            mean: mean(values),
            std: std_dev(values),
            min: values.iter().cloned().fold(f64::INFINITY, f64::min),
            max: values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}
