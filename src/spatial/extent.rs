//! Spatial extent of clusters: size, centroid, bounds and convex hull
//!
//! Hulls are optional. Clusters with fewer than three distinct positions or
//! with collinear members have none, and renderers skip drawing them.

use crate::config::analysis::BoundingBox;
use crate::types::{ClusterLabel, PhotoRecord, Point, NOISE};
use geo::{Area, ConvexHull, MultiPoint, Point as GeoPoint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Geometry of one cluster in degrees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterExtent {
    pub size: usize,
    pub centroid_lat: f64,
    pub centroid_lon: f64,
    pub bounds: BoundingBox,
    /// Counter-clockwise hull vertices as `[lat, lon]`
    pub hull: Option<Vec<[f64; 2]>>,
}

/// Extent of every non-noise cluster, keyed by cluster id
pub fn cluster_extents(
    records: &[PhotoRecord],
    labels: &[ClusterLabel],
) -> BTreeMap<ClusterLabel, ClusterExtent> {
    let mut members: BTreeMap<ClusterLabel, Vec<Point>> = BTreeMap::new();
    for (record, &label) in records.iter().zip(labels) {
        if label != NOISE {
            members.entry(label).or_default().push(record.point());
        }
    }

    members
        .into_iter()
        .map(|(label, points)| (label, extent_of(&points)))
        .collect()
}

fn extent_of(points: &[Point]) -> ClusterExtent {
    let n = points.len() as f64;
    let mut bounds = BoundingBox {
        lat_min: f64::INFINITY,
        lat_max: f64::NEG_INFINITY,
        lon_min: f64::INFINITY,
        lon_max: f64::NEG_INFINITY,
    };
    let (mut sum_lat, mut sum_lon) = (0.0, 0.0);
    for p in points {
        sum_lat += p.x;
        sum_lon += p.y;
        bounds.lat_min = bounds.lat_min.min(p.x);
        bounds.lat_max = bounds.lat_max.max(p.x);
        bounds.lon_min = bounds.lon_min.min(p.y);
        bounds.lon_max = bounds.lon_max.max(p.y);
    }

    ClusterExtent {
        size: points.len(),
        centroid_lat: sum_lat / n,
        centroid_lon: sum_lon / n,
        bounds,
        hull: convex_hull(points).map(|hull| hull.iter().map(|p| [p.x, p.y]).collect()),
    }
}

/// Convex hull vertices, counter-clockwise without repeating the first one.
/// `None` when fewer than three distinct points or the hull has no area.
pub fn convex_hull(points: &[Point]) -> Option<Vec<Point>> {
    let mut distinct: Vec<Point> = points.to_vec();
    distinct.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    distinct.dedup();
    if distinct.len() < 3 {
        return None;
    }

    let multi_point = MultiPoint::new(distinct.iter().map(|p| GeoPoint::new(p.x, p.y)).collect());
    let hull = multi_point.convex_hull();
    if !(hull.unsigned_area() > 0.0) {
        return None;
    }

    let mut vertices: Vec<Point> = hull
        .exterior()
        .points()
        .map(|p| Point::new(p.x(), p.y()))
        .collect();
    // The exterior ring is closed
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    (vertices.len() >= 3).then_some(vertices)
}
