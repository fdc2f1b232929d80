//! Z-score spike detection over short count series

use super::profile::MonthlyActivityProfile;
use std::collections::BTreeMap;

/// Indices whose z-score exceeds `threshold`
///
/// Uses the sample standard deviation. Empty, single-value and flat series
/// have no peaks.
pub fn detect_peaks(values: &[f64], threshold: f64) -> Vec<usize> {
    let n = values.len();
    if n < 2 {
        return Vec::new();
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std = variance.sqrt();
    if std == 0.0 || !std.is_finite() {
        return Vec::new();
    }

    values
        .iter()
        .enumerate()
        .filter(|&(_, &v)| (v - mean) / std > threshold)
        .map(|(i, _)| i)
        .collect()
}

/// Peak calendar months (1-based) of a profile
pub fn peak_months(profile: &MonthlyActivityProfile, threshold: f64) -> Vec<u8> {
    detect_peaks(&profile.as_series(), threshold)
        .into_iter()
        .map(|i| (i + 1) as u8)
        .collect()
}

/// Peak labels of a chronological year-month series
///
/// Only months with at least one photo are part of the series.
pub fn peak_year_months(series: &BTreeMap<String, usize>, threshold: f64) -> Vec<String> {
    let values: Vec<f64> = series.values().map(|&c| c as f64).collect();
    let labels: Vec<&String> = series.keys().collect();
    detect_peaks(&values, threshold)
        .into_iter()
        .map(|i| labels[i].clone())
        .collect()
}
