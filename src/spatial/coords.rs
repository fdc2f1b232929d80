//! Coordinate preparation
//!
//! Turns photo records into clustering points, optionally standardized per
//! axis, and provides the seeded subsampling and density pre-filter used
//! before clustering.

use crate::config::analysis::OutlierFilterConfig;
use crate::spatial::index::PointIndex;
use crate::types::{PhotoRecord, Point};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Per-axis standardization to zero mean and unit variance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Point,
    pub scale: Point,
}

impl StandardScaler {
    /// Fit on a point set. Axes with zero variance keep a scale of 1.
    pub fn fit(points: &[Point]) -> Self {
        if points.is_empty() {
            return Self {
                mean: Point::new(0.0, 0.0),
                scale: Point::new(1.0, 1.0),
            };
        }
        let n = points.len() as f64;
        let mean = Point::new(
            points.iter().map(|p| p.x).sum::<f64>() / n,
            points.iter().map(|p| p.y).sum::<f64>() / n,
        );
        let var_x = points.iter().map(|p| (p.x - mean.x).powi(2)).sum::<f64>() / n;
        let var_y = points.iter().map(|p| (p.y - mean.y).powi(2)).sum::<f64>() / n;
        let axis_scale = |var: f64| if var > 0.0 { var.sqrt() } else { 1.0 };

        Self {
            mean,
            scale: Point::new(axis_scale(var_x), axis_scale(var_y)),
        }
    }

    pub fn transform(&self, points: &[Point]) -> Vec<Point> {
        points
            .iter()
            .map(|p| {
                Point::new(
                    (p.x - self.mean.x) / self.scale.x,
                    (p.y - self.mean.y) / self.scale.y,
                )
            })
            .collect()
    }
}

/// Extract (lat, long) points, standardized when `scale` is set
pub fn prepare_coordinates(records: &[PhotoRecord], scale: bool) -> Vec<Point> {
    let points: Vec<Point> = records.iter().map(PhotoRecord::point).collect();
    if scale {
        let scaler = StandardScaler::fit(&points);
        debug!(
            "Standardizing coordinates: mean=({:.5}, {:.5}) std=({:.5}, {:.5})",
            scaler.mean.x, scaler.mean.y, scaler.scale.x, scaler.scale.y
        );
        scaler.transform(&points)
    } else {
        points
    }
}

/// Uniform sample of `size` distinct indices out of `n`, sorted ascending.
///
/// Returns every index when `size >= n`. The same seed always yields the same
/// sample.
pub fn sample_indices(n: usize, size: usize, seed: u64) -> Vec<usize> {
    if size >= n {
        return (0..n).collect();
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut indices = rand::seq::index::sample(&mut rng, n, size).into_vec();
    indices.sort_unstable();
    indices
}

/// Mask of points with at least `min_neighbors` other points within `radius`
pub fn dense_point_mask(points: &[Point], config: &OutlierFilterConfig) -> Vec<bool> {
    if points.is_empty() || config.radius <= 0.0 {
        return vec![true; points.len()];
    }
    let index = PointIndex::new(points);
    (0..points.len())
        .map(|i| index.count_within(i, config.radius).saturating_sub(1) >= config.min_neighbors)
        .collect()
}
