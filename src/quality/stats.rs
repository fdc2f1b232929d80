//! Cluster-size statistics from labels alone

use crate::types::{ClusterLabel, NOISE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of largest cluster sizes kept for reporting
pub const TOP_SIZES: usize = 10;

/// Label arithmetic summary of one clustering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicStats {
    pub n_clusters: usize,
    pub n_noise: usize,
    pub noise_percentage: f64,
    pub total_points: usize,
    pub clustered_points: usize,
    pub largest_cluster: usize,
    pub smallest_cluster: usize,
    /// Median size, truncated to an integer
    pub median_cluster_size: usize,
    pub mean_cluster_size: f64,
    /// Population standard deviation of cluster sizes
    pub std_cluster_size: f64,
    /// Largest sizes, descending
    pub cluster_sizes_top10: Vec<usize>,
}

impl BasicStats {
    /// Share of all points (noise included) held by the largest cluster
    pub fn largest_fraction(&self) -> f64 {
        if self.total_points == 0 {
            0.0
        } else {
            self.largest_cluster as f64 / self.total_points as f64
        }
    }
}

/// Compute cluster count, noise share and the size distribution
pub fn basic_stats(labels: &[ClusterLabel]) -> BasicStats {
    let mut counts: HashMap<ClusterLabel, usize> = HashMap::new();
    let mut n_noise = 0;
    for &label in labels {
        if label == NOISE {
            n_noise += 1;
        } else {
            *counts.entry(label).or_insert(0) += 1;
        }
    }

    let mut sizes: Vec<usize> = counts.into_values().collect();
    sizes.sort_unstable_by(|a, b| b.cmp(a));

    let total = labels.len();
    let mut stats = BasicStats {
        n_clusters: sizes.len(),
        n_noise,
        noise_percentage: if total > 0 {
            n_noise as f64 / total as f64 * 100.0
        } else {
            0.0
        },
        total_points: total,
        clustered_points: total - n_noise,
        cluster_sizes_top10: sizes.iter().take(TOP_SIZES).copied().collect(),
        ..BasicStats::default()
    };

    if let (Some(&largest), Some(&smallest)) = (sizes.first(), sizes.last()) {
        let k = sizes.len() as f64;
        let mean = sizes.iter().sum::<usize>() as f64 / k;
        let variance = sizes.iter().map(|&s| (s as f64 - mean).powi(2)).sum::<f64>() / k;
        let mid = sizes.len() / 2;
        let median = if sizes.len() % 2 == 1 {
            sizes[mid] as f64
        } else {
            (sizes[mid - 1] + sizes[mid]) as f64 / 2.0
        };

        stats.largest_cluster = largest;
        stats.smallest_cluster = smallest;
        stats.median_cluster_size = median as usize;
        stats.mean_cluster_size = mean;
        stats.std_cluster_size = variance.sqrt();
    }

    stats
}
