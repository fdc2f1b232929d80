//! Parameter search
//!
//! Runs one clustering per grid configuration, scores each with the quality
//! evaluator and recommends the best one under the largest-cluster cap
//! (see [`selection::select_best`]).

pub mod grid;
pub mod selection;

pub use grid::ParameterGrid;
pub use selection::{select_best, Selection, SweepRow};

use crate::config::analysis::{QualityConfig, SearchConfig};
use crate::error::Result;
use crate::quality;
use crate::spatial::ClusteringAlgorithm;
use crate::types::Point;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;
use tracing::{debug, info, warn};

/// All tested configurations plus the recommendation
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub rows: Vec<SweepRow>,
    pub selection: Selection,
}

impl SearchOutcome {
    /// The recommended row, if any configuration passed the constraints
    pub fn best(&self) -> Option<&SweepRow> {
        self.selection.index().and_then(|i| self.rows.get(i))
    }

    pub fn best_algorithm(&self) -> Option<&ClusteringAlgorithm> {
        self.best().map(|row| &row.algorithm)
    }
}

/// Sweep `grid` over `points`
///
/// Every configuration is validated before the first clustering runs, so an
/// invalid axis value fails the whole search immediately.
pub fn run_search(
    points: &[Point],
    grid: &ParameterGrid,
    quality_config: &QualityConfig,
    search_config: &SearchConfig,
    show_progress: bool,
) -> Result<SearchOutcome> {
    let configurations = grid.validate()?;
    info!(
        "Testing {} {} configurations on {} points",
        configurations.len(),
        grid.kind,
        points.len()
    );

    let progress_bar = if show_progress {
        let pb = ProgressBar::new(configurations.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let sweep_start = Instant::now();
    let mut rows = Vec::with_capacity(configurations.len());

    for algorithm in configurations {
        if let Some(ref pb) = progress_bar {
            pb.set_message(algorithm.describe());
        }

        let start = Instant::now();
        let fit = algorithm.fit(points)?;
        let report = quality::evaluate(points, &fit.labels, quality_config);
        let elapsed_secs = start.elapsed().as_secs_f64();

        debug!(
            "{}: {} clusters, {:.1}% noise, largest {:.1}%, silhouette {}",
            algorithm.describe(),
            report.stats.n_clusters,
            report.stats.noise_percentage,
            report.largest_fraction() * 100.0,
            report
                .metrics
                .silhouette
                .map(|s| format!("{:.3}", s))
                .unwrap_or_else(|| "n/a".to_string())
        );

        if let Some(inertia) = fit.inertia {
            debug!("{}: inertia {:.6}", algorithm.describe(), inertia);
        }

        rows.push(SweepRow {
            algorithm,
            report,
            inertia: fit.inertia,
            elapsed_secs,
        });

        if let Some(ref pb) = progress_bar {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress_bar {
        pb.finish_with_message("Search complete");
    }

    info!(
        "Parameter search completed in {:.2}s",
        sweep_start.elapsed().as_secs_f64()
    );

    let selection = select_best(&rows, search_config.max_largest_fraction);
    match &selection {
        Selection::Best(i) => {
            let row = &rows[*i];
            info!(
                "Best configuration: {} (silhouette {:.3}, {} clusters)",
                row.algorithm.describe(),
                row.report.metrics.silhouette.unwrap_or_default(),
                row.report.stats.n_clusters
            );
        }
        Selection::NoRecommendation(reason) => {
            warn!("No recommended configuration: {}", reason);
        }
    }

    Ok(SearchOutcome { rows, selection })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::AlgorithmKind;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn blobs() -> Vec<Point> {
        let mut points = Vec::new();
        for &(cx, cy) in &[(0.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            for i in 0..30 {
                let dx = (i % 6) as f64 * 0.001;
                let dy = (i / 6) as f64 * 0.001;
                points.push(Point::new(cx + dx, cy + dy));
            }
        }
        points
    }

    #[test]
    fn test_search_reports_every_configuration() {
        let mut grid = ParameterGrid::for_kind(AlgorithmKind::Dbscan);
        grid.eps_values = vec![0.003, 0.01];
        grid.min_samples = vec![5, 10];

        let outcome = run_search(
            &blobs(),
            &grid,
            &QualityConfig::default(),
            &SearchConfig::default(),
            false,
        )
        .unwrap();

        assert_eq!(outcome.rows.len(), 4);
        let best = outcome.best().expect("three separated blobs should yield a recommendation");
        assert_eq!(best.report.stats.n_clusters, 3);
        assert!(best.report.largest_fraction() <= 0.5);
    }

    #[test]
    fn test_kmeans_inertia_decreases_with_k() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let points: Vec<Point> = (0..300)
            .map(|_| Point::new(rng.random_range(-2.0..2.0), rng.random_range(-2.0..2.0)))
            .collect();
        let mut grid = ParameterGrid::for_kind(AlgorithmKind::Kmeans);
        grid.n_clusters = vec![2, 4, 8, 16];

        let outcome = run_search(
            &points,
            &grid,
            &QualityConfig::default(),
            &SearchConfig::default(),
            false,
        )
        .unwrap();

        let inertia: Vec<f64> = outcome
            .rows
            .iter()
            .map(|row| row.inertia.expect("k-means rows carry inertia"))
            .collect();
        assert_eq!(inertia.len(), 4);
        for pair in inertia.windows(2) {
            assert!(pair[1] < pair[0], "inertia did not decrease: {:?}", inertia);
        }
    }

    #[test]
    fn test_density_rows_have_no_inertia() {
        let mut grid = ParameterGrid::for_kind(AlgorithmKind::Dbscan);
        grid.eps_values = vec![0.003];
        grid.min_samples = vec![5];

        let outcome = run_search(
            &blobs(),
            &grid,
            &QualityConfig::default(),
            &SearchConfig::default(),
            false,
        )
        .unwrap();
        assert!(outcome.rows.iter().all(|row| row.inertia.is_none()));
    }

    #[test]
    fn test_invalid_grid_fails_before_clustering() {
        let mut grid = ParameterGrid::for_kind(AlgorithmKind::Dbscan);
        grid.eps_values = vec![0.003, -1.0];
        let result = run_search(
            &blobs(),
            &grid,
            &QualityConfig::default(),
            &SearchConfig::default(),
            false,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_single_blob_has_no_recommendation() {
        let points: Vec<Point> = (0..40)
            .map(|i| Point::new((i % 8) as f64 * 0.001, (i / 8) as f64 * 0.001))
            .collect();
        let mut grid = ParameterGrid::for_kind(AlgorithmKind::Dbscan);
        grid.eps_values = vec![0.005];
        grid.min_samples = vec![5];

        let outcome = run_search(
            &points,
            &grid,
            &QualityConfig::default(),
            &SearchConfig::default(),
            false,
        )
        .unwrap();
        assert!(outcome.best().is_none());
        assert!(matches!(outcome.selection, Selection::NoRecommendation(_)));
    }
}
