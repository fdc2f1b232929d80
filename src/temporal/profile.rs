//! Monthly activity profiles and the statistics derived from them

use crate::types::PhotoRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Photo counts per calendar month, independent of year
///
/// Index 0 is January. The sum of all bins is the number of photos added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyActivityProfile {
    counts: [usize; 12],
}

impl MonthlyActivityProfile {
    /// Build a profile from 1-based month numbers; out-of-range months are ignored
    pub fn from_months(months: impl IntoIterator<Item = u8>) -> Self {
        let mut profile = Self::default();
        for month in months {
            profile.add(month);
        }
        profile
    }

    pub fn add(&mut self, month: u8) {
        if (1..=12).contains(&month) {
            self.counts[(month - 1) as usize] += 1;
        }
    }

    pub fn counts(&self) -> &[usize; 12] {
        &self.counts
    }

    /// Count for a 1-based month
    pub fn count(&self, month: u8) -> usize {
        match month {
            1..=12 => self.counts[(month - 1) as usize],
            _ => 0,
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        self.total() as f64 / 12.0
    }

    /// Population standard deviation over the 12 bins
    pub fn std(&self) -> f64 {
        let mean = self.mean();
        let variance = self
            .counts
            .iter()
            .map(|&c| (c as f64 - mean).powi(2))
            .sum::<f64>()
            / 12.0;
        variance.sqrt()
    }

    /// Busiest month and its count; the earliest month wins ties
    pub fn peak(&self) -> (u8, usize) {
        let mut best = (1u8, self.counts[0]);
        for (i, &c) in self.counts.iter().enumerate().skip(1) {
            if c > best.1 {
                best = ((i + 1) as u8, c);
            }
        }
        best
    }

    /// Bins as floats, for the peak detector
    pub fn as_series(&self) -> Vec<f64> {
        self.counts.iter().map(|&c| c as f64).collect()
    }
}

/// Everything the classifier needs to know about one cluster
#[derive(Debug, Clone, Default)]
pub struct ClusterActivity {
    pub profile: MonthlyActivityProfile,
    pub years: BTreeSet<i32>,
    /// Photo counts keyed by "YYYY-MM", in chronological order
    pub year_months: BTreeMap<String, usize>,
}

impl ClusterActivity {
    pub fn add(&mut self, record: &PhotoRecord) {
        self.profile.add(record.date_taken_month);
        self.years.insert(record.date_taken_year);
        *self.year_months.entry(record.year_month()).or_insert(0) += 1;
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a PhotoRecord>) -> Self {
        let mut activity = Self::default();
        for record in records {
            activity.add(record);
        }
        activity
    }
}

/// Read-only temporal snapshot of one cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterTemporalStats {
    pub total_photos: usize,
    /// Distinct years with at least one photo
    pub n_years: usize,
    pub year_min: i32,
    pub year_max: i32,
    /// Months with at least one photo
    pub n_months_active: usize,
    /// Months holding at least the active share of the cluster total
    pub months_with_activity: usize,
    pub month_mean: f64,
    pub month_std: f64,
    pub month_cv: f64,
    pub peak_month: u8,
    pub peak_count: usize,
    pub peak_ratio: f64,
    pub december_ratio: f64,
    pub summer_ratio: f64,
}

impl ClusterTemporalStats {
    /// Derive the statistics; `active_month_share` is the fraction of the total
    /// a month needs to count towards `months_with_activity`
    pub fn compute(activity: &ClusterActivity, active_month_share: f64) -> Self {
        let profile = &activity.profile;
        let total = profile.total();
        let ratio = |count: usize| {
            if total > 0 {
                count as f64 / total as f64
            } else {
                0.0
            }
        };

        let month_mean = profile.mean();
        let month_std = profile.std();
        let month_cv = if month_mean > 0.0 {
            month_std / month_mean
        } else {
            0.0
        };
        let (peak_month, peak_count) = profile.peak();

        let months_with_activity = if total > 0 {
            let threshold = total as f64 * active_month_share;
            profile
                .counts()
                .iter()
                .filter(|&&c| c as f64 >= threshold)
                .count()
        } else {
            0
        };

        Self {
            total_photos: total,
            n_years: activity.years.len(),
            year_min: activity.years.first().copied().unwrap_or_default(),
            year_max: activity.years.last().copied().unwrap_or_default(),
            n_months_active: profile.counts().iter().filter(|&&c| c > 0).count(),
            months_with_activity,
            month_mean,
            month_std,
            month_cv,
            peak_month,
            peak_count,
            peak_ratio: ratio(peak_count),
            december_ratio: ratio(profile.count(12)),
            summer_ratio: ratio(profile.count(7) + profile.count(8)),
        }
    }
}
