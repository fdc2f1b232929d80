//! R-tree index over clustering points
//!
//! Answers the two neighbourhood queries the density algorithms need:
//! fixed-radius neighbours (DBSCAN, the outlier filter) and the distance to
//! the k-th nearest neighbour (HDBSCAN core distances).

use crate::types::Point;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

// =============================================================================
// R-tree Indexed Point
// =============================================================================

/// A point with its position in the input slice
#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    idx: usize,
    x: f64,
    y: f64,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

// =============================================================================
// Neighbour queries
// =============================================================================

/// Bulk-loaded R-tree over a slice of points
pub struct PointIndex<'a> {
    points: &'a [Point],
    tree: RTree<IndexedPoint>,
}

impl<'a> PointIndex<'a> {
    pub fn new(points: &'a [Point]) -> Self {
        let indexed: Vec<IndexedPoint> = points
            .iter()
            .enumerate()
            .map(|(idx, p)| IndexedPoint { idx, x: p.x, y: p.y })
            .collect();
        Self {
            points,
            tree: RTree::bulk_load(indexed),
        }
    }

    fn query(&self, idx: usize) -> [f64; 2] {
        let p = &self.points[idx];
        [p.x, p.y]
    }

    /// Indices of all points within `radius` of `points[idx]`, itself included, ascending
    pub fn within(&self, idx: usize, radius: f64) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .tree
            .locate_within_distance(self.query(idx), radius * radius)
            .map(|p| p.idx)
            .collect();
        out.sort_unstable();
        out
    }

    /// Number of points within `radius` of `points[idx]`, itself included
    pub fn count_within(&self, idx: usize, radius: f64) -> usize {
        self.tree
            .locate_within_distance(self.query(idx), radius * radius)
            .count()
    }

    /// Distance from `points[idx]` to its k-th nearest point, counting the point
    /// itself as k = 0. `None` when the index holds k or fewer points.
    pub fn kth_neighbor_distance(&self, idx: usize, k: usize) -> Option<f64> {
        self.tree
            .nearest_neighbor_iter_with_distance_2(&self.query(idx))
            .nth(k)
            .map(|(_, d2)| d2.sqrt())
    }
}
