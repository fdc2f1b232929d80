//! Fixed-radius density clustering (DBSCAN)
//!
//! A point is *core* when at least `min_samples` points (itself included) lie
//! within `eps`. Clusters grow from core points through their neighbourhoods;
//! non-core points reached this way become border members, everything else is
//! noise. A single global `eps` means one density scale for the whole map.
//! Neighbourhoods come from an R-tree over the input points.

use crate::error::{PhotospotsError, Result};
use crate::spatial::index::PointIndex;
use crate::spatial::traits::Clusterer;
use crate::types::{ClusterLabel, Point, NOISE};
use serde::{Deserialize, Serialize};
use tracing::debug;

const UNCLASSIFIED: ClusterLabel = -2;

/// DBSCAN parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dbscan {
    /// Neighbourhood radius in coordinate units (0.005 degrees is roughly 500 m in Lyon)
    pub eps: f64,
    /// Neighbours (self included) required for a core point
    pub min_samples: usize,
}

impl Default for Dbscan {
    fn default() -> Self {
        Self {
            eps: 0.005,
            min_samples: 10,
        }
    }
}

impl Dbscan {
    pub fn new(eps: f64, min_samples: usize) -> Self {
        Self { eps, min_samples }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.eps.is_finite() || self.eps <= 0.0 {
            return Err(PhotospotsError::invalid_parameter(
                "eps",
                format!("must be a positive distance, got {}", self.eps),
            ));
        }
        if self.min_samples == 0 {
            return Err(PhotospotsError::invalid_parameter(
                "min_samples",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

impl Clusterer for Dbscan {
    fn fit_predict(&self, points: &[Point]) -> Result<Vec<ClusterLabel>> {
        self.validate()?;

        let n = points.len();
        if n < self.min_samples {
            debug!(
                "DBSCAN: {} points < min_samples={}, everything is noise",
                n, self.min_samples
            );
            return Ok(vec![NOISE; n]);
        }

        let index = PointIndex::new(points);
        let mut labels = vec![UNCLASSIFIED; n];
        let mut cluster_id: ClusterLabel = 0;

        for start in 0..n {
            if labels[start] != UNCLASSIFIED {
                continue;
            }

            let neighbors = index.within(start, self.eps);
            if neighbors.len() < self.min_samples {
                // May still be claimed as a border point later
                labels[start] = NOISE;
                continue;
            }

            labels[start] = cluster_id;
            let mut seeds: Vec<usize> = neighbors
                .into_iter()
                .filter(|&j| labels[j] == UNCLASSIFIED || labels[j] == NOISE)
                .collect();

            while let Some(j) = seeds.pop() {
                if labels[j] == NOISE {
                    labels[j] = cluster_id;
                    continue;
                }
                if labels[j] != UNCLASSIFIED {
                    continue;
                }
                labels[j] = cluster_id;

                let reachable = index.within(j, self.eps);
                if reachable.len() >= self.min_samples {
                    seeds.extend(
                        reachable
                            .into_iter()
                            .filter(|&k| labels[k] == UNCLASSIFIED || labels[k] == NOISE),
                    );
                }
            }

            cluster_id += 1;
        }

        debug!(
            "DBSCAN (eps={}, min_samples={}): {} clusters",
            self.eps, self.min_samples, cluster_id
        );

        Ok(labels)
    }

    fn name(&self) -> &'static str {
        "dbscan"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::count_clusters;

    fn blob(cx: f64, cy: f64, n: usize, step: f64) -> Vec<Point> {
        (0..n)
            .map(|i| Point::new(cx + (i % 5) as f64 * step, cy + (i / 5) as f64 * step))
            .collect()
    }

    #[test]
    fn test_two_blobs_and_an_outlier() {
        let mut points = blob(0.0, 0.0, 20, 0.001);
        points.extend(blob(1.0, 1.0, 20, 0.001));
        points.push(Point::new(0.5, 0.5));

        let labels = Dbscan::new(0.003, 5).fit_predict(&points).unwrap();

        assert_eq!(labels.len(), points.len());
        assert_eq!(count_clusters(&labels), 2);
        assert_eq!(labels[40], NOISE);
        assert!(labels[..20].iter().all(|&l| l == labels[0]));
        assert!(labels[20..40].iter().all(|&l| l == labels[20]));
        assert_ne!(labels[0], labels[20]);
    }

    #[test]
    fn test_cluster_sizes_reach_min_samples() {
        let mut points = blob(0.0, 0.0, 12, 0.001);
        points.extend(blob(0.3, 0.0, 3, 0.001));
        let labels = Dbscan::new(0.0025, 6).fit_predict(&points).unwrap();

        for id in 0..count_clusters(&labels) as ClusterLabel {
            let size = labels.iter().filter(|&&l| l == id).count();
            assert!(size >= 6, "cluster {} has only {} members", id, size);
        }
        assert!(labels[12..].iter().all(|&l| l == NOISE));
    }

    #[test]
    fn test_too_few_points_is_all_noise() {
        let points = blob(0.0, 0.0, 3, 0.001);
        let labels = Dbscan::new(0.01, 10).fit_predict(&points).unwrap();
        assert_eq!(labels, vec![NOISE; 3]);
    }

    #[test]
    fn test_identical_points_form_one_cluster() {
        let points = vec![Point::new(45.7, 4.8); 15];
        let labels = Dbscan::new(0.001, 5).fit_predict(&points).unwrap();
        assert!(labels.iter().all(|&l| l == 0));
    }

    #[test]
    fn test_invalid_eps_fails_fast() {
        let err = Dbscan::new(0.0, 5).fit_predict(&[Point::new(0.0, 0.0)]).unwrap_err();
        assert!(err.to_string().contains("eps"));
    }
}
