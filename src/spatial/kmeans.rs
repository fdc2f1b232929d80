//! Centroid partitioning (k-means)
//!
//! Backed by `linfa-clustering`: k-means++ seeds, restarted `n_init` times,
//! keeping the run with the lowest inertia. Every point is assigned, there is
//! no noise. Distances are plain Euclidean, so callers standardize
//! coordinates first.

use crate::error::{PhotospotsError, Result};
use crate::spatial::traits::{relabel_by_first_appearance, Clusterer};
use crate::types::{ClusterLabel, Point};
use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_clustering::KMeans as LinfaKMeans;
use ndarray::Array2;
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Parameters for k-means clustering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KMeans {
    /// Number of clusters
    pub n_clusters: usize,
    /// Independent restarts; the best inertia wins (default: 10)
    #[serde(default = "default_n_init")]
    pub n_init: usize,
    /// Maximum iterations per restart (default: 300)
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    /// Convergence threshold on centroid movement (default: 1e-4)
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Seed of the centroid initialisation
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_n_init() -> usize {
    10
}

fn default_max_iter() -> usize {
    300
}

fn default_tolerance() -> f64 {
    1e-4
}

fn default_seed() -> u64 {
    42
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            n_clusters: 50,
            n_init: default_n_init(),
            max_iter: default_max_iter(),
            tolerance: default_tolerance(),
            seed: default_seed(),
        }
    }
}

impl KMeans {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_clusters == 0 {
            return Err(PhotospotsError::invalid_parameter(
                "n_clusters",
                "k-means needs at least one cluster",
            ));
        }
        if self.n_init == 0 || self.max_iter == 0 {
            return Err(PhotospotsError::invalid_parameter(
                "n_init",
                format!(
                    "n_init and max_iter must be positive, got {} and {}",
                    self.n_init, self.max_iter
                ),
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(PhotospotsError::invalid_parameter(
                "tolerance",
                format!("must be a positive number, got {}", self.tolerance),
            ));
        }
        Ok(())
    }
}

/// Labels of a k-means run with its within-cluster sum of squares
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    pub labels: Vec<ClusterLabel>,
    pub inertia: f64,
}

impl KMeans {
    /// Fit and keep the inertia alongside the labels
    pub fn fit(&self, points: &[Point]) -> Result<KMeansFit> {
        self.validate()?;

        let n = points.len();
        if n <= self.n_clusters {
            debug!(
                "k-means: {} points <= n_clusters={}, one cluster per point",
                n, self.n_clusters
            );
            return Ok(KMeansFit {
                labels: (0..n as ClusterLabel).collect(),
                inertia: 0.0,
            });
        }

        let observations = Array2::from_shape_fn((n, 2), |(i, j)| match j {
            0 => points[i].x,
            _ => points[i].y,
        });
        let rng = Xoshiro256Plus::seed_from_u64(self.seed);
        let model = LinfaKMeans::params_with_rng(self.n_clusters, rng)
            .n_runs(self.n_init)
            .max_n_iterations(self.max_iter as u64)
            .tolerance(self.tolerance)
            .fit(&DatasetBase::from(observations.clone()))
            .map_err(|e| PhotospotsError::ClusteringFailed {
                algorithm: "kmeans",
                reason: e.to_string(),
            })?;

        let assignment = model.predict(&observations);
        let centroids = model.centroids();
        let inertia: f64 = points
            .iter()
            .zip(assignment.iter())
            .map(|(p, &c)| {
                let centroid = Point::new(centroids[[c, 0]], centroids[[c, 1]]);
                p.distance_sq(&centroid)
            })
            .sum();
        debug!(
            "k-means (n_clusters={}): inertia {:.6}",
            self.n_clusters, inertia
        );

        let mut labels: Vec<ClusterLabel> =
            assignment.iter().map(|&c| c as ClusterLabel).collect();
        relabel_by_first_appearance(&mut labels);
        Ok(KMeansFit { labels, inertia })
    }
}

impl Clusterer for KMeans {
    fn fit_predict(&self, points: &[Point]) -> Result<Vec<ClusterLabel>> {
        self.fit(points).map(|fit| fit.labels)
    }

    fn name(&self) -> &'static str {
        "kmeans"
    }
}
