//! Clustering trait abstraction
//!
//! Every spatial algorithm exposes the same `points -> labels` interface so the
//! pipeline and the parameter search can swap them freely.

use crate::error::Result;
use crate::types::{ClusterLabel, Point};

/// Spatial clustering backend
pub trait Clusterer {
    /// Assign one label per input point, in input order.
    ///
    /// Labels are non-negative cluster ids or [`crate::types::NOISE`].
    /// Invalid parameters fail before any computation; degenerate input
    /// (too few points, all points identical) yields sentinel labels instead
    /// of an error.
    fn fit_predict(&self, points: &[Point]) -> Result<Vec<ClusterLabel>>;

    /// Get the name of this algorithm (for logging)
    fn name(&self) -> &'static str;
}

/// True if every point sits on the same coordinates
pub(crate) fn all_identical(points: &[Point]) -> bool {
    match points.first() {
        Some(first) => points.iter().all(|p| p == first),
        None => true,
    }
}

/// Renumber labels to 0..k in order of first appearance, keeping noise
pub(crate) fn relabel_by_first_appearance(labels: &mut [ClusterLabel]) {
    let mut mapping: std::collections::HashMap<ClusterLabel, ClusterLabel> =
        std::collections::HashMap::new();
    for label in labels.iter_mut() {
        if *label < 0 {
            continue;
        }
        let next = mapping.len() as ClusterLabel;
        *label = *mapping.entry(*label).or_insert(next);
    }
}
