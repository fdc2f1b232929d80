//! Cluster quality evaluation
//!
//! Combines label arithmetic ([`stats`]) with sampled internal validity scores
//! ([`metrics`]) into one report per clustering configuration.

pub mod metrics;
pub mod stats;

pub use metrics::{quality_metrics, QualityMetrics};
pub use stats::{basic_stats, BasicStats};

use crate::config::analysis::QualityConfig;
use crate::types::{ClusterLabel, Point};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Everything known about the quality of one clustering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusteringQualityReport {
    #[serde(flatten)]
    pub stats: BasicStats,
    #[serde(flatten)]
    pub metrics: QualityMetrics,
}

impl ClusteringQualityReport {
    /// Share of all points held by the largest cluster
    pub fn largest_fraction(&self) -> f64 {
        self.stats.largest_fraction()
    }
}

/// Evaluate a clustering of `points`
pub fn evaluate(
    points: &[Point],
    labels: &[ClusterLabel],
    config: &QualityConfig,
) -> ClusteringQualityReport {
    let stats = basic_stats(labels);
    let metrics = quality_metrics(points, labels, config);

    if stats.n_clusters == 0 {
        warn!("Clustering produced no clusters, all {} points are noise", stats.total_points);
    } else if let Some(note) = &metrics.note {
        warn!("Quality metrics undefined: {}", note);
    }

    ClusteringQualityReport { stats, metrics }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NOISE;

    #[test]
    fn test_report_flattens_to_one_record() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(9.0, 0.0),
            Point::new(9.0, 1.0),
            Point::new(4.0, 9.0),
        ];
        let report = evaluate(&points, &[0, 0, 1, 1, NOISE], &QualityConfig::default());
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["n_clusters"], 2);
        assert_eq!(json["n_noise"], 1);
        assert!(json["silhouette"].is_number());
        assert!(json.get("note").is_none());
        assert!((report.largest_fraction() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_single_cluster_report_has_null_scores() {
        let points = vec![Point::new(0.0, 0.0), Point::new(0.0, 1.0)];
        let report = evaluate(&points, &[0, 0], &QualityConfig::default());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["silhouette"].is_null());
        assert!(json["note"].is_string());
    }
}
