//! Hierarchical density clustering (HDBSCAN)
//!
//! Pipeline:
//! 1. Core distance of every point (distance to its `min_samples`-th neighbour, self
//!    included), answered by an R-tree
//! 2. Minimum spanning tree over mutual reachability distances (Prim, O(n²))
//! 3. Single-linkage hierarchy from the sorted MST edges
//! 4. Condensed tree: splits smaller than `min_cluster_size` become points falling out
//! 5. Flat clusters selected by excess of mass or leaves, optionally merged by epsilon
//!
//! The density scale is inferred from the data; there is no radius parameter.
//! Memory stays linear in the number of points, time is quadratic, so callers
//! pre-sample very large inputs.

use crate::error::{PhotospotsError, Result};
use crate::spatial::algorithm::SelectionMethod;
use crate::spatial::index::PointIndex;
use crate::spatial::traits::{all_identical, relabel_by_first_appearance, Clusterer};
use crate::types::{ClusterLabel, Point, NOISE};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Distances below this are clamped so lambda = 1/distance stays finite
const MIN_DISTANCE: f64 = 1e-12;

/// HDBSCAN parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hdbscan {
    /// Minimum points to form a cluster (the dominant parameter)
    pub min_cluster_size: usize,
    /// Neighbourhood size for core distances; `None` uses `min_cluster_size`
    #[serde(default)]
    pub min_samples: Option<usize>,
    /// Clusters born below this distance are merged into their parent (0 disables)
    #[serde(default)]
    pub cluster_selection_epsilon: f64,
    #[serde(default)]
    pub selection: SelectionMethod,
}

impl Default for Hdbscan {
    fn default() -> Self {
        Self {
            min_cluster_size: 120,
            min_samples: None,
            cluster_selection_epsilon: 0.0,
            selection: SelectionMethod::Eom,
        }
    }
}

impl Hdbscan {
    pub fn new(min_cluster_size: usize) -> Self {
        Self {
            min_cluster_size,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_min_samples(mut self, min_samples: Option<usize>) -> Self {
        self.min_samples = min_samples;
        self
    }

    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.cluster_selection_epsilon = epsilon;
        self
    }

    #[must_use]
    pub fn with_selection(mut self, selection: SelectionMethod) -> Self {
        self.selection = selection;
        self
    }

    /// Effective neighbourhood size for core distances
    pub fn effective_min_samples(&self) -> usize {
        self.min_samples.unwrap_or(self.min_cluster_size)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_cluster_size < 2 {
            return Err(PhotospotsError::invalid_parameter(
                "min_cluster_size",
                format!(
                    "must be >= 2, got {}. A cluster needs at least 2 points.",
                    self.min_cluster_size
                ),
            ));
        }
        if self.min_samples == Some(0) {
            return Err(PhotospotsError::invalid_parameter(
                "min_samples",
                "must be at least 1 when set",
            ));
        }
        if !self.cluster_selection_epsilon.is_finite() || self.cluster_selection_epsilon < 0.0 {
            return Err(PhotospotsError::invalid_parameter(
                "cluster_selection_epsilon",
                format!(
                    "must be a non-negative distance, got {}",
                    self.cluster_selection_epsilon
                ),
            ));
        }
        Ok(())
    }
}

impl Clusterer for Hdbscan {
    fn fit_predict(&self, points: &[Point]) -> Result<Vec<ClusterLabel>> {
        self.validate()?;

        let n = points.len();
        let min_samples = self.effective_min_samples();
        if n < self.min_cluster_size || n < min_samples || n < 2 {
            debug!(
                "HDBSCAN: {} points below min_cluster_size={} / min_samples={}, everything is noise",
                n, self.min_cluster_size, min_samples
            );
            return Ok(vec![NOISE; n]);
        }
        if all_identical(points) {
            debug!("HDBSCAN: all {} points identical, no density structure", n);
            return Ok(vec![NOISE; n]);
        }

        let core = core_distances(points, min_samples);
        let mut edges = mutual_reachability_mst(points, &core);
        edges.sort_by(|a, b| a.2.total_cmp(&b.2));
        let merges = single_linkage(&edges, n);

        let tree = CondensedTree::build(&merges, n, self.min_cluster_size);
        let selected = tree.select(self.selection, self.cluster_selection_epsilon);
        let mut labels = tree.labels(&selected);
        relabel_by_first_appearance(&mut labels);

        debug!(
            "HDBSCAN (min_cluster_size={}, min_samples={}): {} condensed clusters, {} selected",
            self.min_cluster_size,
            min_samples,
            tree.n_clusters,
            selected.iter().filter(|&&s| s).count()
        );

        Ok(labels)
    }

    fn name(&self) -> &'static str {
        "hdbscan"
    }
}

// =============================================================================
// Mutual reachability graph
// =============================================================================

fn core_distances(points: &[Point], min_samples: usize) -> Vec<f64> {
    // Callers guarantee points.len() >= min_samples, so the k-th neighbour exists
    let index = PointIndex::new(points);
    (0..points.len())
        .map(|i| {
            index
                .kth_neighbor_distance(i, min_samples - 1)
                .unwrap_or(f64::INFINITY)
        })
        .collect()
}

/// Prim's algorithm on the implicit complete graph; returns n-1 edges (a, b, weight).
/// With all core distances at zero this is the plain Euclidean MST.
pub(crate) fn mutual_reachability_mst(points: &[Point], core: &[f64]) -> Vec<(usize, usize, f64)> {
    let n = points.len();
    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut from = vec![0usize; n];
    let mut edges = Vec::with_capacity(n.saturating_sub(1));
    if n < 2 {
        return edges;
    }

    let mut current = 0;
    in_tree[0] = true;
    for _ in 1..n {
        let mut next = usize::MAX;
        let mut next_dist = f64::INFINITY;
        for other in 0..n {
            if in_tree[other] {
                continue;
            }
            let reach = points[current]
                .distance(&points[other])
                .max(core[current])
                .max(core[other]);
            if reach < best[other] {
                best[other] = reach;
                from[other] = current;
            }
            if best[other] < next_dist || next == usize::MAX {
                next_dist = best[other];
                next = other;
            }
        }
        in_tree[next] = true;
        edges.push((from[next], next, next_dist));
        current = next;
    }

    edges
}

/// One merge of the single-linkage hierarchy. Nodes < n are points, node n + i is merge i.
#[derive(Debug, Clone, Copy)]
struct Merge {
    left: usize,
    right: usize,
    distance: f64,
    size: usize,
}

fn single_linkage(sorted_edges: &[(usize, usize, f64)], n: usize) -> Vec<Merge> {
    let mut parent: Vec<usize> = (0..2 * n - 1).collect();
    let mut sizes = vec![1usize; 2 * n - 1];
    let mut merges = Vec::with_capacity(n - 1);

    for (i, &(a, b, distance)) in sorted_edges.iter().enumerate() {
        let ra = find_root(&mut parent, a);
        let rb = find_root(&mut parent, b);
        let node = n + i;
        parent[ra] = node;
        parent[rb] = node;
        sizes[node] = sizes[ra] + sizes[rb];
        merges.push(Merge {
            left: ra,
            right: rb,
            distance,
            size: sizes[node],
        });
    }

    merges
}

fn find_root(parent: &mut [usize], mut x: usize) -> usize {
    let mut root = x;
    while parent[root] != root {
        root = parent[root];
    }
    while parent[x] != root {
        let next = parent[x];
        parent[x] = root;
        x = next;
    }
    root
}

// =============================================================================
// Condensed tree
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Child {
    Point(usize),
    Cluster(usize),
}

#[derive(Debug, Clone, Copy)]
struct CondensedEdge {
    parent: usize,
    child: Child,
    lambda: f64,
    size: usize,
}

/// Hierarchy of clusters of at least `min_cluster_size` points. Cluster 0 is the root.
#[derive(Debug)]
struct CondensedTree {
    edges: Vec<CondensedEdge>,
    n_clusters: usize,
    n_points: usize,
}

impl CondensedTree {
    fn build(merges: &[Merge], n: usize, min_cluster_size: usize) -> Self {
        let size_of = |node: usize| if node < n { 1 } else { merges[node - n].size };

        let mut edges = Vec::with_capacity(2 * n);
        let mut next_cluster = 1;
        let mut stack = vec![(2 * n - 2, 0usize)];

        while let Some((node, cluster)) = stack.pop() {
            let merge = merges[node - n];
            let lambda = 1.0 / merge.distance.max(MIN_DISTANCE);
            let left_big = size_of(merge.left) >= min_cluster_size;
            let right_big = size_of(merge.right) >= min_cluster_size;

            match (left_big, right_big) {
                (true, true) => {
                    for side in [merge.left, merge.right] {
                        let child = next_cluster;
                        next_cluster += 1;
                        edges.push(CondensedEdge {
                            parent: cluster,
                            child: Child::Cluster(child),
                            lambda,
                            size: size_of(side),
                        });
                        stack.push((side, child));
                    }
                }
                (true, false) | (false, true) => {
                    let (keep, drop) = if left_big {
                        (merge.left, merge.right)
                    } else {
                        (merge.right, merge.left)
                    };
                    fall_out(merges, n, drop, cluster, lambda, &mut edges);
                    stack.push((keep, cluster));
                }
                (false, false) => {
                    fall_out(merges, n, merge.left, cluster, lambda, &mut edges);
                    fall_out(merges, n, merge.right, cluster, lambda, &mut edges);
                }
            }
        }

        Self {
            edges,
            n_clusters: next_cluster,
            n_points: n,
        }
    }

    fn cluster_parents(&self) -> Vec<Option<usize>> {
        let mut parents = vec![None; self.n_clusters];
        for e in &self.edges {
            if let Child::Cluster(c) = e.child {
                parents[c] = Some(e.parent);
            }
        }
        parents
    }

    fn cluster_children(&self) -> Vec<Vec<usize>> {
        let mut children = vec![Vec::new(); self.n_clusters];
        for e in &self.edges {
            if let Child::Cluster(c) = e.child {
                children[e.parent].push(c);
            }
        }
        children
    }

    fn birth_lambdas(&self) -> Vec<f64> {
        let mut birth = vec![0.0; self.n_clusters];
        for e in &self.edges {
            if let Child::Cluster(c) = e.child {
                birth[c] = e.lambda;
            }
        }
        birth
    }

    /// Excess of mass per cluster: sum of (lambda_leave - lambda_birth) * size
    fn stabilities(&self) -> Vec<f64> {
        let birth = self.birth_lambdas();
        let mut stability = vec![0.0; self.n_clusters];
        for e in &self.edges {
            stability[e.parent] += (e.lambda - birth[e.parent]) * e.size as f64;
        }
        stability
    }

    /// Flags of the selected clusters; the root is never selected
    fn select(&self, method: SelectionMethod, epsilon: f64) -> Vec<bool> {
        let children = self.cluster_children();
        let mut selected = vec![false; self.n_clusters];

        match method {
            SelectionMethod::Eom => {
                let stability = self.stabilities();
                let mut subtree = stability.clone();
                // Children always carry larger ids than their parent
                for c in (1..self.n_clusters).rev() {
                    let child_sum: f64 = children[c].iter().map(|&ch| subtree[ch]).sum();
                    if children[c].is_empty() || child_sum <= stability[c] {
                        selected[c] = true;
                        for d in descendants(&children, c) {
                            selected[d] = false;
                        }
                    } else {
                        subtree[c] = child_sum;
                    }
                }
            }
            SelectionMethod::Leaf => {
                for c in 1..self.n_clusters {
                    selected[c] = children[c].is_empty();
                }
            }
        }

        if epsilon > 0.0 {
            selected = self.merge_below_epsilon(&selected, &children, epsilon);
        }
        selected
    }

    /// Replace selected clusters born closer than `epsilon` by their first
    /// ancestor born farther apart, stopping below the root
    fn merge_below_epsilon(
        &self,
        selected: &[bool],
        children: &[Vec<usize>],
        epsilon: f64,
    ) -> Vec<bool> {
        let parents = self.cluster_parents();
        let birth = self.birth_lambdas();
        let birth_distance = |c: usize| 1.0 / birth[c];

        let mut merged = vec![false; self.n_clusters];
        let mut covered = vec![false; self.n_clusters];
        for c in (1..self.n_clusters).filter(|&c| selected[c]) {
            if covered[c] {
                continue;
            }
            let mut chosen = c;
            if birth_distance(c) < epsilon {
                while let Some(parent) = parents[chosen] {
                    if parent == 0 {
                        break;
                    }
                    chosen = parent;
                    if birth_distance(parent) > epsilon {
                        break;
                    }
                }
            }
            merged[chosen] = true;
            for d in descendants(children, chosen) {
                covered[d] = true;
                merged[d] = false;
            }
        }

        // An ancestor chosen later also absorbs clusters chosen earlier
        for c in 1..self.n_clusters {
            if merged[c] {
                let mut up = parents[c];
                while let Some(p) = up {
                    if merged[p] {
                        merged[c] = false;
                        break;
                    }
                    up = parents[p];
                }
            }
        }
        merged
    }

    /// Each point takes the id of its nearest selected ancestor, or noise
    fn labels(&self, selected: &[bool]) -> Vec<ClusterLabel> {
        let parents = self.cluster_parents();
        let mut labels = vec![NOISE; self.n_points];
        for e in &self.edges {
            if let Child::Point(p) = e.child {
                let mut cluster = Some(e.parent);
                while let Some(c) = cluster {
                    if selected[c] {
                        labels[p] = c as ClusterLabel;
                        break;
                    }
                    cluster = parents[c];
                }
            }
        }
        labels
    }
}

/// Emit every point under `node` as falling out of `cluster` at `lambda`
fn fall_out(
    merges: &[Merge],
    n: usize,
    node: usize,
    cluster: usize,
    lambda: f64,
    edges: &mut Vec<CondensedEdge>,
) {
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if current < n {
            edges.push(CondensedEdge {
                parent: cluster,
                child: Child::Point(current),
                lambda,
                size: 1,
            });
        } else {
            let m = merges[current - n];
            stack.push(m.left);
            stack.push(m.right);
        }
    }
}

fn descendants(children: &[Vec<usize>], cluster: usize) -> Vec<usize> {
    let mut out = Vec::new();
    let mut stack: Vec<usize> = children[cluster].clone();
    while let Some(c) = stack.pop() {
        out.push(c);
        stack.extend(children[c].iter().copied());
    }
    out
}
