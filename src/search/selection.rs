//! Best-configuration selection under the largest-cluster cap

use crate::quality::ClusteringQualityReport;
use crate::spatial::ClusteringAlgorithm;
use serde::Serialize;

/// One tested configuration and its evaluation
#[derive(Debug, Clone, Serialize)]
pub struct SweepRow {
    pub algorithm: ClusteringAlgorithm,
    pub report: ClusteringQualityReport,
    /// Within-cluster sum of squares, k-means only
    pub inertia: Option<f64>,
    pub elapsed_secs: f64,
}

/// Outcome of the selection rule
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Index of the recommended row
    Best(usize),
    /// No row passed the constraints; the reason is meant for the operator
    NoRecommendation(String),
}

impl Selection {
    pub fn index(&self) -> Option<usize> {
        match self {
            Selection::Best(i) => Some(*i),
            Selection::NoRecommendation(_) => None,
        }
    }
}

/// Pick the highest silhouette among rows whose largest cluster holds at most
/// `max_largest_fraction` of all points. Ties keep the earliest row.
///
/// There is no fallback to the unconstrained best: a single giant cluster can
/// win on silhouette while being useless as a map of places.
pub fn select_best(rows: &[SweepRow], max_largest_fraction: f64) -> Selection {
    let mut best: Option<(usize, f64)> = None;
    let mut scored = 0;

    for (i, row) in rows.iter().enumerate() {
        let Some(score) = row.report.metrics.silhouette else {
            continue;
        };
        scored += 1;
        if row.report.largest_fraction() > max_largest_fraction {
            continue;
        }
        if best.map_or(true, |(_, b)| score > b) {
            best = Some((i, score));
        }
    }

    match best {
        Some((i, _)) => Selection::Best(i),
        None if scored == 0 => Selection::NoRecommendation(format!(
            "none of the {} configurations produced a defined silhouette score",
            rows.len()
        )),
        None => Selection::NoRecommendation(format!(
            "all {} scored configurations put more than {:.0}% of the points in a single cluster",
            scored,
            max_largest_fraction * 100.0
        )),
    }
}
