//! Algorithm selection
//!
//! One variant per clustering backend, each carrying its own parameters.
//! Serialized with an `algorithm` tag so a chosen configuration can be written
//! to `best_params.json` and read back unchanged.

use crate::error::Result;
use crate::spatial::agglomerative::Agglomerative;
use crate::spatial::dbscan::Dbscan;
use crate::spatial::hdbscan::Hdbscan;
use crate::spatial::kmeans::KMeans;
use crate::spatial::traits::Clusterer;
use crate::types::{ClusterLabel, Point};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Clustering backend selector used on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmKind {
    /// Hierarchical density clustering (variable radius, noise-aware)
    Hdbscan,
    /// Fixed-radius density clustering (noise-aware)
    Dbscan,
    /// Centroid partitioning (every point assigned)
    Kmeans,
    /// Agglomerative hierarchical clustering (every point assigned)
    Hierarchical,
}

impl AlgorithmKind {
    pub const ALL: [AlgorithmKind; 4] = [
        AlgorithmKind::Hdbscan,
        AlgorithmKind::Dbscan,
        AlgorithmKind::Kmeans,
        AlgorithmKind::Hierarchical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorithmKind::Hdbscan => "hdbscan",
            AlgorithmKind::Dbscan => "dbscan",
            AlgorithmKind::Kmeans => "kmeans",
            AlgorithmKind::Hierarchical => "hierarchical",
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HDBSCAN flat-cluster extraction strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMethod {
    /// Excess of mass: fewer, larger clusters
    #[default]
    Eom,
    /// Leaves of the condensed tree: more, smaller clusters
    Leaf,
}

impl fmt::Display for SelectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionMethod::Eom => f.write_str("eom"),
            SelectionMethod::Leaf => f.write_str("leaf"),
        }
    }
}

/// Merge criterion for agglomerative clustering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    /// Minimise the increase of within-cluster variance
    #[default]
    Ward,
    /// Maximum pairwise distance
    Complete,
    /// Mean pairwise distance
    Average,
    /// Minimum pairwise distance
    Single,
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Linkage::Ward => "ward",
            Linkage::Complete => "complete",
            Linkage::Average => "average",
            Linkage::Single => "single",
        };
        f.write_str(name)
    }
}

/// Labels of one run, with the k-means inertia when the backend has one
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterFit {
    pub labels: Vec<ClusterLabel>,
    pub inertia: Option<f64>,
}

/// A fully parameterised clustering configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "lowercase")]
pub enum ClusteringAlgorithm {
    Hdbscan(Hdbscan),
    Dbscan(Dbscan),
    #[serde(rename = "kmeans")]
    KMeans(KMeans),
    Hierarchical(Agglomerative),
}

impl Default for ClusteringAlgorithm {
    fn default() -> Self {
        ClusteringAlgorithm::Hdbscan(Hdbscan::default())
    }
}

impl ClusteringAlgorithm {
    pub fn kind(&self) -> AlgorithmKind {
        match self {
            ClusteringAlgorithm::Hdbscan(_) => AlgorithmKind::Hdbscan,
            ClusteringAlgorithm::Dbscan(_) => AlgorithmKind::Dbscan,
            ClusteringAlgorithm::KMeans(_) => AlgorithmKind::Kmeans,
            ClusteringAlgorithm::Hierarchical(_) => AlgorithmKind::Hierarchical,
        }
    }

    /// Fail fast on parameters no input could make meaningful
    pub fn validate(&self) -> Result<()> {
        match self {
            ClusteringAlgorithm::Hdbscan(a) => a.validate(),
            ClusteringAlgorithm::Dbscan(a) => a.validate(),
            ClusteringAlgorithm::KMeans(a) => a.validate(),
            ClusteringAlgorithm::Hierarchical(a) => a.validate(),
        }
    }

    /// Centroid and variance based algorithms need standardized axes
    pub fn requires_scaling(&self) -> bool {
        matches!(
            self,
            ClusteringAlgorithm::KMeans(_) | ClusteringAlgorithm::Hierarchical(_)
        )
    }

    /// Smallest size a non-noise cluster is guaranteed to have, if any
    pub fn min_cluster_members(&self) -> Option<usize> {
        match self {
            ClusteringAlgorithm::Hdbscan(a) => Some(a.min_cluster_size),
            ClusteringAlgorithm::Dbscan(a) => Some(a.min_samples),
            _ => None,
        }
    }

    /// Short human-readable parameter summary, e.g. `hdbscan(min_cluster_size=120, ...)`
    pub fn describe(&self) -> String {
        match self {
            ClusteringAlgorithm::Hdbscan(a) => format!(
                "hdbscan(min_cluster_size={}, min_samples={}, epsilon={}, selection={})",
                a.min_cluster_size,
                a.min_samples
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "auto".to_string()),
                a.cluster_selection_epsilon,
                a.selection
            ),
            ClusteringAlgorithm::Dbscan(a) => {
                format!("dbscan(eps={}, min_samples={})", a.eps, a.min_samples)
            }
            ClusteringAlgorithm::KMeans(a) => {
                format!("kmeans(n_clusters={}, seed={})", a.n_clusters, a.seed)
            }
            ClusteringAlgorithm::Hierarchical(a) => format!(
                "hierarchical(n_clusters={}, linkage={})",
                a.n_clusters, a.linkage
            ),
        }
    }

    /// Cluster and keep the backend's own objective value
    pub fn fit(&self, points: &[Point]) -> Result<ClusterFit> {
        match self {
            ClusteringAlgorithm::KMeans(a) => a.fit(points).map(|fit| ClusterFit {
                labels: fit.labels,
                inertia: Some(fit.inertia),
            }),
            other => other.clusterer().fit_predict(points).map(|labels| ClusterFit {
                labels,
                inertia: None,
            }),
        }
    }

    fn clusterer(&self) -> &dyn Clusterer {
        match self {
            ClusteringAlgorithm::Hdbscan(a) => a,
            ClusteringAlgorithm::Dbscan(a) => a,
            ClusteringAlgorithm::KMeans(a) => a,
            ClusteringAlgorithm::Hierarchical(a) => a,
        }
    }
}

impl Clusterer for ClusteringAlgorithm {
    fn fit_predict(&self, points: &[Point]) -> Result<Vec<ClusterLabel>> {
        self.clusterer().fit_predict(points)
    }

    fn name(&self) -> &'static str {
        self.clusterer().name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_serialization() {
        let algo = ClusteringAlgorithm::Dbscan(Dbscan::new(0.003, 10));
        let json = serde_json::to_value(&algo).unwrap();
        assert_eq!(json["algorithm"], "dbscan");
        assert_eq!(json["eps"], 0.003);
        assert_eq!(json["min_samples"], 10);

        let back: ClusteringAlgorithm = serde_json::from_value(json).unwrap();
        assert_eq!(back, algo);
    }

    #[test]
    fn test_kmeans_tag_is_lowercase() {
        let algo = ClusteringAlgorithm::KMeans(KMeans::new(5));
        let json = serde_json::to_value(&algo).unwrap();
        assert_eq!(json["algorithm"], "kmeans");
    }

    #[test]
    fn test_scaling_requirement() {
        assert!(!ClusteringAlgorithm::default().requires_scaling());
        assert!(ClusteringAlgorithm::KMeans(KMeans::new(3)).requires_scaling());
        assert!(
            ClusteringAlgorithm::Hierarchical(Agglomerative::new(3, Linkage::Ward))
                .requires_scaling()
        );
    }

    #[test]
    fn test_invalid_kmeans_fails_before_clustering() {
        let algo = ClusteringAlgorithm::KMeans(KMeans::new(0));
        assert!(algo.validate().is_err());
        assert!(algo.fit_predict(&[Point::new(0.0, 0.0)]).is_err());
    }

    #[test]
    fn test_only_kmeans_reports_inertia() {
        let points: Vec<Point> = (0..12)
            .map(|i| Point::new((i % 4) as f64, (i / 4) as f64))
            .collect();

        let kmeans = ClusteringAlgorithm::KMeans(KMeans::new(2)).fit(&points).unwrap();
        assert!(kmeans.inertia.is_some_and(|v| v > 0.0));

        let dbscan = ClusteringAlgorithm::Dbscan(Dbscan::new(1.5, 3)).fit(&points).unwrap();
        assert_eq!(dbscan.inertia, None);
        assert_eq!(dbscan.labels.len(), points.len());
    }

    #[test]
    fn test_describe_mentions_parameters() {
        let text = ClusteringAlgorithm::default().describe();
        assert!(text.starts_with("hdbscan("));
        assert!(text.contains("min_cluster_size=120"));
        assert!(text.contains("min_samples=auto"));
    }
}
