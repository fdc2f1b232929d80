//! Parameter grids: the cross product of per-algorithm axes

use crate::error::{PhotospotsError, Result};
use crate::spatial::{
    Agglomerative, AlgorithmKind, ClusteringAlgorithm, Dbscan, Hdbscan, KMeans, Linkage,
    SelectionMethod,
};
use serde::{Deserialize, Serialize};

/// Axes swept for one algorithm
///
/// Only the axes relevant to `kind` are used:
///
/// | kind           | axes                                   |
/// |----------------|----------------------------------------|
/// | `hdbscan`      | `min_cluster_sizes` × `min_samples`    |
/// | `dbscan`       | `eps_values` × `min_samples`           |
/// | `kmeans`       | `n_clusters`                           |
/// | `hierarchical` | `n_clusters`                           |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterGrid {
    pub kind: AlgorithmKind,
    pub min_cluster_sizes: Vec<usize>,
    /// For HDBSCAN an empty axis means "same as min_cluster_size"
    pub min_samples: Vec<usize>,
    pub eps_values: Vec<f64>,
    pub n_clusters: Vec<usize>,
    pub selection: SelectionMethod,
    pub cluster_selection_epsilon: f64,
    pub linkage: Linkage,
    pub seed: u64,
}

impl ParameterGrid {
    /// Default sweep for an algorithm
    pub fn for_kind(kind: AlgorithmKind) -> Self {
        let min_samples = match kind {
            AlgorithmKind::Dbscan => vec![5, 10, 15, 20, 30],
            _ => Vec::new(),
        };
        Self {
            kind,
            min_cluster_sizes: vec![10, 15, 20, 30, 50, 75, 100],
            min_samples,
            eps_values: vec![0.002, 0.003, 0.004, 0.005, 0.006],
            n_clusters: (1..=10).map(|k| k * 10).collect(),
            selection: SelectionMethod::Eom,
            cluster_selection_epsilon: 0.0,
            linkage: Linkage::Ward,
            seed: 42,
        }
    }

    /// Every configuration of the grid, in axis order
    pub fn configurations(&self) -> Vec<ClusteringAlgorithm> {
        match self.kind {
            AlgorithmKind::Hdbscan => {
                let samples: Vec<Option<usize>> = if self.min_samples.is_empty() {
                    vec![None]
                } else {
                    self.min_samples.iter().copied().map(Some).collect()
                };
                self.min_cluster_sizes
                    .iter()
                    .flat_map(|&mcs| {
                        samples.iter().map(move |&ms| {
                            ClusteringAlgorithm::Hdbscan(
                                Hdbscan::new(mcs)
                                    .with_min_samples(ms)
                                    .with_epsilon(self.cluster_selection_epsilon)
                                    .with_selection(self.selection),
                            )
                        })
                    })
                    .collect()
            }
            AlgorithmKind::Dbscan => self
                .eps_values
                .iter()
                .flat_map(|&eps| {
                    self.min_samples
                        .iter()
                        .map(move |&ms| ClusteringAlgorithm::Dbscan(Dbscan::new(eps, ms)))
                })
                .collect(),
            AlgorithmKind::Kmeans => self
                .n_clusters
                .iter()
                .map(|&k| ClusteringAlgorithm::KMeans(KMeans::new(k).with_seed(self.seed)))
                .collect(),
            AlgorithmKind::Hierarchical => self
                .n_clusters
                .iter()
                .map(|&k| ClusteringAlgorithm::Hierarchical(Agglomerative::new(k, self.linkage)))
                .collect(),
        }
    }

    /// Reject empty grids and invalid configurations before any clustering runs
    pub fn validate(&self) -> Result<Vec<ClusteringAlgorithm>> {
        let configurations = self.configurations();
        if configurations.is_empty() {
            return Err(PhotospotsError::invalid_parameter(
                "grid",
                format!("the {} parameter grid has no configurations", self.kind),
            ));
        }
        for config in &configurations {
            config.validate()?;
        }
        Ok(configurations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dbscan_grid_is_cross_product() {
        let mut grid = ParameterGrid::for_kind(AlgorithmKind::Dbscan);
        grid.eps_values = vec![0.002, 0.004];
        grid.min_samples = vec![5, 10, 20];

        let configs = grid.configurations();
        assert_eq!(configs.len(), 6);
        assert_eq!(configs[0], ClusteringAlgorithm::Dbscan(Dbscan::new(0.002, 5)));
        assert_eq!(configs[5], ClusteringAlgorithm::Dbscan(Dbscan::new(0.004, 20)));
    }

    #[test]
    fn test_hdbscan_without_min_samples_axis() {
        let mut grid = ParameterGrid::for_kind(AlgorithmKind::Hdbscan);
        grid.min_cluster_sizes = vec![10, 20];
        let configs = grid.configurations();
        assert_eq!(configs.len(), 2);
        match &configs[1] {
            ClusteringAlgorithm::Hdbscan(h) => {
                assert_eq!(h.min_cluster_size, 20);
                assert_eq!(h.min_samples, None);
            }
            other => panic!("unexpected configuration {:?}", other),
        }
    }

    #[test]
    fn test_default_kmeans_grid() {
        let configs = ParameterGrid::for_kind(AlgorithmKind::Kmeans).configurations();
        assert_eq!(configs.len(), 10);
        assert!(configs.iter().all(|c| c.kind() == AlgorithmKind::Kmeans));
    }

    #[test]
    fn test_invalid_value_fails_validation() {
        let mut grid = ParameterGrid::for_kind(AlgorithmKind::Kmeans);
        grid.n_clusters = vec![10, 0];
        assert!(grid.validate().is_err());

        grid.n_clusters.clear();
        assert!(grid.validate().is_err());
    }
}
