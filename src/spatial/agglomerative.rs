//! Agglomerative hierarchical clustering
//!
//! The dendrogram is built with the nearest-neighbour chain algorithm, then cut
//! by replaying its merges in height order until `n_clusters` groups remain.
//!
//! | linkage    | cluster distances                        | memory |
//! |------------|------------------------------------------|--------|
//! | `ward`     | centroids and sizes                      | O(n)   |
//! | `single`   | Euclidean minimum spanning tree          | O(n)   |
//! | `complete` | Lance-Williams update of a full matrix   | O(n²)  |
//! | `average`  | Lance-Williams update of a full matrix   | O(n²)  |

use crate::error::{PhotospotsError, Result};
use crate::spatial::algorithm::Linkage;
use crate::spatial::hdbscan::mutual_reachability_mst;
use crate::spatial::traits::{relabel_by_first_appearance, Clusterer};
use crate::types::{ClusterLabel, Point};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Parameters for agglomerative clustering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Agglomerative {
    pub n_clusters: usize,
    #[serde(default)]
    pub linkage: Linkage,
}

impl Default for Agglomerative {
    fn default() -> Self {
        Self {
            n_clusters: 50,
            linkage: Linkage::Ward,
        }
    }
}

impl Agglomerative {
    pub fn new(n_clusters: usize, linkage: Linkage) -> Self {
        Self {
            n_clusters,
            linkage,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_clusters == 0 {
            return Err(PhotospotsError::invalid_parameter(
                "n_clusters",
                "hierarchical clustering needs at least one cluster",
            ));
        }
        Ok(())
    }
}

impl Clusterer for Agglomerative {
    fn fit_predict(&self, points: &[Point]) -> Result<Vec<ClusterLabel>> {
        self.validate()?;

        let n = points.len();
        if n <= self.n_clusters {
            debug!(
                "hierarchical: {} points <= n_clusters={}, one cluster per point",
                n, self.n_clusters
            );
            return Ok((0..n as ClusterLabel).collect());
        }

        let mut merges = match self.linkage {
            Linkage::Ward => nn_chain(&mut WardDistances::new(points)),
            Linkage::Single => mutual_reachability_mst(points, &vec![0.0; n]),
            Linkage::Complete | Linkage::Average => {
                nn_chain(&mut MatrixDistances::new(points, self.linkage))
            }
        };
        merges.sort_by(|a, b| a.2.total_cmp(&b.2));

        let labels = cut(&merges, n, self.n_clusters);
        debug!(
            "hierarchical ({} linkage): cut at height {:.6}",
            self.linkage,
            merges
                .get(n - self.n_clusters - 1)
                .map(|m| m.2)
                .unwrap_or_default()
        );
        Ok(labels)
    }

    fn name(&self) -> &'static str {
        "hierarchical"
    }
}

/// Apply the `n - k` lowest merges and label the resulting components
fn cut(sorted_merges: &[(usize, usize, f64)], n: usize, k: usize) -> Vec<ClusterLabel> {
    let mut parent: Vec<usize> = (0..n).collect();
    for &(a, b, _) in sorted_merges.iter().take(n - k) {
        let ra = find(&mut parent, a);
        let rb = find(&mut parent, b);
        if ra != rb {
            parent[rb] = ra;
        }
    }
    let mut labels: Vec<ClusterLabel> = (0..n)
        .map(|i| find(&mut parent, i) as ClusterLabel)
        .collect();
    relabel_by_first_appearance(&mut labels);
    labels
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

// =============================================================================
// Nearest-neighbour chain
// =============================================================================

/// Distances between active clusters. Slot ids start as point indices; a merge
/// keeps the first slot and retires the second.
trait ClusterDistances {
    fn len(&self) -> usize;
    fn distance(&self, a: usize, b: usize) -> f64;
    fn merge(&mut self, keep: usize, retire: usize, active: &[bool]);
}

/// Returns the n-1 merges (slot, slot, height) of the dendrogram, unsorted
fn nn_chain(state: &mut impl ClusterDistances) -> Vec<(usize, usize, f64)> {
    let n = state.len();
    let mut active = vec![true; n];
    let mut merges = Vec::with_capacity(n.saturating_sub(1));
    let mut chain: Vec<usize> = Vec::new();

    for _ in 1..n {
        if chain.is_empty() {
            if let Some(first) = active.iter().position(|&a| a) {
                chain.push(first);
            }
        }

        let (a, b, height) = loop {
            let Some(&a) = chain.last() else { break (0, 0, 0.0) };
            let prev = chain.len().checked_sub(2).map(|i| chain[i]);

            let mut best = prev;
            let mut best_dist = prev.map_or(f64::INFINITY, |p| state.distance(a, p));
            for c in (0..n).filter(|&c| active[c] && c != a) {
                let d = state.distance(a, c);
                if d < best_dist {
                    best = Some(c);
                    best_dist = d;
                }
            }

            match best {
                Some(b) if Some(b) == prev => break (a, b, best_dist),
                Some(b) => chain.push(b),
                None => break (a, a, 0.0),
            }
        };

        chain.truncate(chain.len().saturating_sub(2));
        let (keep, retire) = (a.min(b), a.max(b));
        if keep == retire {
            break;
        }
        state.merge(keep, retire, &active);
        active[retire] = false;
        merges.push((keep, retire, height));
    }

    merges
}

/// Ward distances from cluster centroids: sqrt(2·|A|·|B| / (|A|+|B|)) · ‖cA − cB‖
struct WardDistances {
    centroids: Vec<Point>,
    sizes: Vec<usize>,
}

impl WardDistances {
    fn new(points: &[Point]) -> Self {
        Self {
            centroids: points.to_vec(),
            sizes: vec![1; points.len()],
        }
    }
}

impl ClusterDistances for WardDistances {
    fn len(&self) -> usize {
        self.centroids.len()
    }

    fn distance(&self, a: usize, b: usize) -> f64 {
        let (sa, sb) = (self.sizes[a] as f64, self.sizes[b] as f64);
        (2.0 * sa * sb / (sa + sb) * self.centroids[a].distance_sq(&self.centroids[b])).sqrt()
    }

    fn merge(&mut self, keep: usize, retire: usize, _active: &[bool]) {
        let (sa, sb) = (self.sizes[keep] as f64, self.sizes[retire] as f64);
        let (ca, cb) = (self.centroids[keep], self.centroids[retire]);
        self.centroids[keep] = Point::new(
            (ca.x * sa + cb.x * sb) / (sa + sb),
            (ca.y * sa + cb.y * sb) / (sa + sb),
        );
        self.sizes[keep] += self.sizes[retire];
    }
}

/// Condensed pairwise matrix updated in place with the Lance-Williams formula
struct MatrixDistances {
    n: usize,
    condensed: Vec<f64>,
    sizes: Vec<usize>,
    linkage: Linkage,
}

impl MatrixDistances {
    fn new(points: &[Point], linkage: Linkage) -> Self {
        let n = points.len();
        let mut condensed = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                condensed.push(points[i].distance(&points[j]));
            }
        }
        Self {
            n,
            condensed,
            sizes: vec![1; n],
            linkage,
        }
    }

    fn index(&self, a: usize, b: usize) -> usize {
        let (i, j) = if a < b { (a, b) } else { (b, a) };
        i * self.n - i * (i + 1) / 2 + (j - i - 1)
    }
}

impl ClusterDistances for MatrixDistances {
    fn len(&self) -> usize {
        self.n
    }

    fn distance(&self, a: usize, b: usize) -> f64 {
        self.condensed[self.index(a, b)]
    }

    fn merge(&mut self, keep: usize, retire: usize, active: &[bool]) {
        let (sa, sb) = (self.sizes[keep] as f64, self.sizes[retire] as f64);
        for c in 0..self.n {
            if !active[c] || c == keep || c == retire {
                continue;
            }
            let dk = self.distance(keep, c);
            let dr = self.distance(retire, c);
            let updated = match self.linkage {
                Linkage::Complete => dk.max(dr),
                Linkage::Single => dk.min(dr),
                // Ward runs on centroids and never builds a matrix
                Linkage::Average | Linkage::Ward => (sa * dk + sb * dr) / (sa + sb),
            };
            let idx = self.index(keep, c);
            self.condensed[idx] = updated;
        }
        self.sizes[keep] += self.sizes[retire];
    }
}
