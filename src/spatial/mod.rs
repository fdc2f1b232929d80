//! Spatial clustering of photo locations
//!
//! Four interchangeable backends behind the [`Clusterer`] trait, selected at
//! run time through [`ClusteringAlgorithm`]:
//!
//! - `hdbscan`: variable-radius density clustering with noise
//! - `dbscan`: fixed-radius density clustering with noise
//! - `kmeans`: centroid partitioning, needs standardized coordinates
//! - `agglomerative`: hierarchical merging, needs standardized coordinates

pub mod agglomerative;
pub mod algorithm;
pub mod coords;
pub mod dbscan;
pub mod extent;
pub mod hdbscan;
pub mod index;
pub mod kmeans;
pub mod traits;

pub use agglomerative::Agglomerative;
pub use algorithm::{AlgorithmKind, ClusterFit, ClusteringAlgorithm, Linkage, SelectionMethod};
pub use coords::{dense_point_mask, prepare_coordinates, sample_indices, StandardScaler};
pub use dbscan::Dbscan;
pub use extent::{cluster_extents, ClusterExtent};
pub use hdbscan::Hdbscan;
pub use kmeans::{KMeans, KMeansFit};
pub use traits::Clusterer;
