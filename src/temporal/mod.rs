//! Temporal classification of clusters
//!
//! For every non-noise cluster:
//! 1. build its monthly activity profile and year-month series ([`profile`])
//! 2. derive [`ClusterTemporalStats`]
//! 3. label it with the rule cascade ([`classifier`])
//! 4. detect peak months and year-months ([`peaks`]) and annotate matching
//!    known events ([`events`])

pub mod classifier;
pub mod events;
pub mod peaks;
pub mod profile;

pub use classifier::{classify, TemporalLabel, Verdict, RULES};
pub use events::{default_known_events, match_events, KnownEvent};
pub use peaks::detect_peaks;
pub use profile::{ClusterActivity, ClusterTemporalStats, MonthlyActivityProfile};

use crate::config::AnalysisConfig;
use crate::types::{ClusterLabel, PhotoRecord, NOISE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Peak-detection output for one cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeakInfo {
    /// 1-based calendar months
    pub peak_months: Vec<u8>,
    /// "YYYY-MM" labels
    pub peak_year_months: Vec<String>,
    /// Photo count per calendar month, keyed 1..=12
    pub monthly_counts: BTreeMap<u8, usize>,
}

/// Terminal per-cluster artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    #[serde(rename = "type")]
    pub label: TemporalLabel,
    pub matched_events: Vec<String>,
    pub stats: ClusterTemporalStats,
    pub peaks: PeakInfo,
    /// Name of the cascade rule that decided the label
    pub rule: String,
}

/// Counts per label, for the run summary and report
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassificationSummary {
    pub clusters: BTreeMap<TemporalLabel, usize>,
    pub photos: BTreeMap<TemporalLabel, usize>,
}

impl ClassificationSummary {
    pub fn from_results(results: &BTreeMap<ClusterLabel, ClassificationResult>) -> Self {
        let mut summary = Self::default();
        for label in TemporalLabel::ALL {
            summary.clusters.insert(label, 0);
            summary.photos.insert(label, 0);
        }
        for result in results.values() {
            *summary.clusters.entry(result.label).or_insert(0) += 1;
            *summary.photos.entry(result.label).or_insert(0) += result.stats.total_photos;
        }
        summary
    }

    pub fn cluster_count(&self, label: TemporalLabel) -> usize {
        self.clusters.get(&label).copied().unwrap_or(0)
    }

    pub fn photo_count(&self, label: TemporalLabel) -> usize {
        self.photos.get(&label).copied().unwrap_or(0)
    }

    pub fn total_photos(&self) -> usize {
        self.photos.values().sum()
    }
}

/// Group records by cluster label, skipping noise
pub fn group_by_cluster(
    records: &[PhotoRecord],
    labels: &[ClusterLabel],
) -> BTreeMap<ClusterLabel, ClusterActivity> {
    let mut groups: BTreeMap<ClusterLabel, ClusterActivity> = BTreeMap::new();
    for (record, &label) in records.iter().zip(labels) {
        if label == NOISE {
            continue;
        }
        groups.entry(label).or_default().add(record);
    }
    groups
}

/// Classify one cluster's activity
pub fn classify_cluster(
    activity: &ClusterActivity,
    config: &AnalysisConfig,
) -> ClassificationResult {
    let stats = ClusterTemporalStats::compute(activity, config.classification.active_month_share);
    let verdict = classify(&stats, &config.classification);

    let peak_months = peaks::peak_months(&activity.profile, config.peaks.monthly);
    let peak_year_months = peaks::peak_year_months(&activity.year_months, config.peaks.year_month);
    let matched_events = match_events(&config.known_events, &peak_months);

    let monthly_counts = (1..=12u8)
        .map(|m| (m, activity.profile.count(m)))
        .collect();

    ClassificationResult {
        label: verdict.label,
        matched_events,
        stats,
        peaks: PeakInfo {
            peak_months,
            peak_year_months,
            monthly_counts,
        },
        rule: verdict.rule.to_string(),
    }
}

/// Classify every non-noise cluster of a labelled record set
pub fn classify_all(
    records: &[PhotoRecord],
    labels: &[ClusterLabel],
    config: &AnalysisConfig,
) -> BTreeMap<ClusterLabel, ClassificationResult> {
    let groups = group_by_cluster(records, labels);
    info!("Computing temporal statistics for {} clusters", groups.len());

    let results: BTreeMap<ClusterLabel, ClassificationResult> = groups
        .iter()
        .map(|(&label, activity)| {
            let result = classify_cluster(activity, config);
            debug!(
                "Cluster {}: {} via {} ({} photos, peak {}, events {:?})",
                label,
                result.label,
                result.rule,
                result.stats.total_photos,
                result.stats.peak_month,
                result.matched_events
            );
            (label, result)
        })
        .collect();

    let summary = ClassificationSummary::from_results(&results);
    info!(
        "Classification complete: {} permanent, {} recurring, {} one-time",
        summary.cluster_count(TemporalLabel::Permanent),
        summary.cluster_count(TemporalLabel::Recurring),
        summary.cluster_count(TemporalLabel::OneTime)
    );

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records_at(lat: f64, months: impl IntoIterator<Item = (i32, u8)>) -> Vec<PhotoRecord> {
        months
            .into_iter()
            .enumerate()
            .map(|(i, (year, month))| {
                PhotoRecord::new(format!("{}-{}", lat, i), lat, 4.83, year, month)
            })
            .collect()
    }

    #[test]
    fn test_noise_is_not_classified() {
        let records = records_at(45.76, (0..30).map(|i| (2015, (i % 12 + 1) as u8)));
        let labels: Vec<ClusterLabel> = (0..30).map(|i| if i < 20 { 0 } else { NOISE }).collect();
        let results = classify_all(&records, &labels, &AnalysisConfig::default());
        assert_eq!(results.len(), 1);
        assert_eq!(results[&0].stats.total_photos, 20);
    }

    #[test]
    fn test_december_cluster_matches_light_festival() {
        let mut records = records_at(45.76, (0..600).map(|i| (2010 + i % 6, (i % 12 + 1) as u8)));
        records.extend(records_at(45.77, (0..300).map(|i| (2010 + i % 6, 12))));
        let labels: Vec<ClusterLabel> = (0..900).map(|i| if i < 600 { 0 } else { 1 }).collect();

        let results = classify_all(&records, &labels, &AnalysisConfig::default());

        let steady = &results[&0];
        assert_eq!(steady.label, TemporalLabel::Permanent);
        assert!(steady.peaks.peak_months.is_empty());
        assert!(steady.matched_events.is_empty());

        let festival = &results[&1];
        assert_eq!(festival.label, TemporalLabel::Recurring);
        assert_eq!(festival.rule, "december");
        assert_eq!(festival.peaks.peak_months, vec![12]);
        assert!(festival.matched_events.contains(&"Fête des Lumières".to_string()));
    }

    #[test]
    fn test_profile_sum_and_ratio_bounds() {
        let records = records_at(
            45.76,
            (0..500).map(|i| (2012 + (i * 7) % 5, ((i * i) % 12 + 1) as u8)),
        );
        let labels: Vec<ClusterLabel> = (0..500).map(|i| (i % 4) as ClusterLabel).collect();
        let results = classify_all(&records, &labels, &AnalysisConfig::default());

        for result in results.values() {
            let sum: usize = result.peaks.monthly_counts.values().sum();
            assert_eq!(sum, result.stats.total_photos);
            for ratio in [
                result.stats.december_ratio,
                result.stats.summer_ratio,
                result.stats.peak_ratio,
            ] {
                assert!((0.0..=1.0).contains(&ratio));
            }
        }
    }

    #[test]
    fn test_summary_counts_photos() {
        let months = (0..60).map(|i| (2015, if i < 50 { 3 } else { (i % 12 + 1) as u8 }));
        let records = records_at(45.76, months);
        let labels = vec![0; 60];
        let results = classify_all(&records, &labels, &AnalysisConfig::default());
        let summary = ClassificationSummary::from_results(&results);
        assert_eq!(summary.total_photos(), 60);
        let clusters: usize = TemporalLabel::ALL
            .iter()
            .map(|&label| summary.cluster_count(label))
            .sum();
        assert_eq!(clusters, 1);
    }

    #[test]
    fn test_result_serializes_type_field() {
        let records = records_at(45.76, (0..50).map(|_| (2019, 5)));
        let results = classify_all(&records, &vec![0; 50], &AnalysisConfig::default());
        let json = serde_json::to_value(&results[&0]).unwrap();
        assert_eq!(json["type"], "one_time");
        assert_eq!(json["stats"]["peak_month"], 5);
        assert_eq!(json["peaks"]["monthly_counts"]["5"], 50);
    }
}
