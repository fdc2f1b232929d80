//! Internal validity scores
//!
//! All three scores are computed on non-noise points only, on the same seeded
//! subsample when there are more clustered points than the sample size.
//!
//! - silhouette: cohesion vs separation in [-1, 1], higher is better
//! - Davies-Bouldin: average worst within/between dispersion ratio, lower is better
//! - Calinski-Harabasz: between/within variance ratio, higher is better

use crate::config::analysis::QualityConfig;
use crate::spatial::coords::sample_indices;
use crate::types::{ClusterLabel, Point, NOISE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Scores of one clustering; `None` when undefined for the input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub silhouette: Option<f64>,
    pub davies_bouldin: Option<f64>,
    pub calinski_harabasz: Option<f64>,
    /// Number of points the scores were computed on
    pub scored_points: usize,
    /// Why the scores are undefined
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl QualityMetrics {
    fn undefined(note: &str) -> Self {
        Self {
            note: Some(note.to_string()),
            ..Self::default()
        }
    }

    pub fn is_defined(&self) -> bool {
        self.silhouette.is_some()
    }
}

/// Score a clustering; degenerate input yields undefined scores, never an error
pub fn quality_metrics(
    points: &[Point],
    labels: &[ClusterLabel],
    config: &QualityConfig,
) -> QualityMetrics {
    let clustered: Vec<usize> = (0..labels.len().min(points.len()))
        .filter(|&i| labels[i] != NOISE)
        .collect();

    if clustered.len() < 2 || distinct(clustered.iter().map(|&i| labels[i])) < 2 {
        return QualityMetrics::undefined("Not enough clusters or points for metrics");
    }

    let picked: Vec<usize> = if clustered.len() > config.sample_size {
        debug!(
            "Scoring a sample of {} out of {} clustered points",
            config.sample_size,
            clustered.len()
        );
        sample_indices(clustered.len(), config.sample_size, config.seed)
            .into_iter()
            .map(|i| clustered[i])
            .collect()
    } else {
        clustered
    };

    // Dense cluster indices 0..k for the scored points
    let mut index_of: HashMap<ClusterLabel, usize> = HashMap::new();
    let mut members: Vec<usize> = Vec::with_capacity(picked.len());
    for &i in &picked {
        let next = index_of.len();
        members.push(*index_of.entry(labels[i]).or_insert(next));
    }
    let k = index_of.len();
    let sample: Vec<Point> = picked.iter().map(|&i| points[i]).collect();

    if k < 2 {
        return QualityMetrics::undefined("Sample holds a single cluster");
    }
    if k >= sample.len() {
        return QualityMetrics::undefined("Every scored point is its own cluster");
    }

    QualityMetrics {
        silhouette: Some(silhouette(&sample, &members, k)),
        davies_bouldin: Some(davies_bouldin(&sample, &members, k)),
        calinski_harabasz: Some(calinski_harabasz(&sample, &members, k)),
        scored_points: sample.len(),
        note: None,
    }
}

fn distinct(labels: impl Iterator<Item = ClusterLabel>) -> usize {
    let mut seen: Vec<ClusterLabel> = labels.collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}

fn cluster_sizes(members: &[usize], k: usize) -> Vec<usize> {
    let mut sizes = vec![0usize; k];
    for &c in members {
        sizes[c] += 1;
    }
    sizes
}

fn centroids(points: &[Point], members: &[usize], k: usize) -> Vec<Point> {
    let sizes = cluster_sizes(members, k);
    let mut sums = vec![(0.0, 0.0); k];
    for (p, &c) in points.iter().zip(members) {
        sums[c].0 += p.x;
        sums[c].1 += p.y;
    }
    sums.iter()
        .zip(&sizes)
        .map(|(&(sx, sy), &n)| Point::new(sx / n as f64, sy / n as f64))
        .collect()
}

/// Mean silhouette coefficient; singleton clusters score 0
pub fn silhouette(points: &[Point], members: &[usize], k: usize) -> f64 {
    let sizes = cluster_sizes(members, k);
    let mut sums = vec![0.0; k];
    let mut total = 0.0;

    for (i, p) in points.iter().enumerate() {
        sums.iter_mut().for_each(|s| *s = 0.0);
        for (q, &c) in points.iter().zip(members) {
            sums[c] += p.distance(q);
        }

        let own = members[i];
        if sizes[own] <= 1 {
            continue;
        }
        let a = sums[own] / (sizes[own] - 1) as f64;
        let b = (0..k)
            .filter(|&c| c != own && sizes[c] > 0)
            .map(|c| sums[c] / sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);

        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }

    total / points.len() as f64
}

/// Davies-Bouldin index; coincident centroids do not contribute
pub fn davies_bouldin(points: &[Point], members: &[usize], k: usize) -> f64 {
    let centres = centroids(points, members, k);
    let sizes = cluster_sizes(members, k);

    let mut scatter = vec![0.0; k];
    for (p, &c) in points.iter().zip(members) {
        scatter[c] += p.distance(&centres[c]);
    }
    for c in 0..k {
        scatter[c] /= sizes[c] as f64;
    }

    let worst_sum: f64 = (0..k)
        .map(|i| {
            (0..k)
                .filter(|&j| j != i)
                .map(|j| {
                    let separation = centres[i].distance(&centres[j]);
                    if separation > 0.0 {
                        (scatter[i] + scatter[j]) / separation
                    } else {
                        0.0
                    }
                })
                .fold(0.0, f64::max)
        })
        .sum();

    worst_sum / k as f64
}

/// Calinski-Harabasz index; 1.0 when clusters have no internal dispersion
pub fn calinski_harabasz(points: &[Point], members: &[usize], k: usize) -> f64 {
    let n = points.len();
    let centres = centroids(points, members, k);
    let sizes = cluster_sizes(members, k);
    let overall = Point::new(
        points.iter().map(|p| p.x).sum::<f64>() / n as f64,
        points.iter().map(|p| p.y).sum::<f64>() / n as f64,
    );

    let between: f64 = centres
        .iter()
        .zip(&sizes)
        .map(|(c, &s)| s as f64 * c.distance_sq(&overall))
        .sum();
    let within: f64 = points
        .iter()
        .zip(members)
        .map(|(p, &c)| p.distance_sq(&centres[c]))
        .sum();

    if within == 0.0 {
        1.0
    } else {
        between * (n - k) as f64 / (within * (k - 1) as f64)
    }
}
