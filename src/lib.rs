//! photospots - Spatial and temporal analysis of geotagged photo collections
//!
//! Groups photo locations into spatial hotspots and labels every hotspot as a
//! permanent place, a recurring event or a one-time happening from the shape
//! of its monthly activity.
//!
//! # Architecture
//!
//! The library is organized into several key modules:
//!
//! - `config`: CLI argument parsing, runtime settings and TOML overrides
//! - `dataset`: Photo table loading, bounding-box filtering and pre-sampling
//! - `spatial`: HDBSCAN, DBSCAN, k-means and agglomerative clustering
//! - `quality`: Cluster statistics and internal validity scores
//! - `search`: Parameter grid sweep and best-configuration selection
//! - `temporal`: Monthly profiles, peak detection and rule-based classification
//! - `pipeline`: Orchestration of the `classify`, `sweep` and `compare` runs
//! - `export`: JSON, CSV and Markdown artifacts
//!
//! # Example
//!
//! ```no_run
//! use photospots::{config::Settings, pipeline};
//!
//! let settings = Settings::default();
//! let result = pipeline::run_classify(&settings).expect("Classification failed");
//! println!("Found {} clusters", result.n_clusters);
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod quality;
pub mod search;
pub mod spatial;
pub mod temporal;
pub mod types;

// Re-export key types at crate root
pub use error::{PhotospotsError, Result};
pub use temporal::{ClassificationResult, ClusterTemporalStats, TemporalLabel};
pub use types::{ClusterLabel, PhotoRecord, Point, NOISE};
