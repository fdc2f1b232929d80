//! CSV tables: one row per tested configuration

use super::write_atomic;
use crate::error::{PhotospotsError, Result};
use crate::quality::ClusteringQualityReport;
use crate::search::{SearchOutcome, SweepRow};
use crate::spatial::ClusteringAlgorithm;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Parameter columns; only those of the row's algorithm are filled
#[derive(Debug, Default, Serialize)]
struct ParameterColumns {
    min_cluster_size: Option<usize>,
    min_samples: Option<usize>,
    cluster_selection_epsilon: Option<f64>,
    selection: Option<String>,
    eps: Option<f64>,
    k: Option<usize>,
    linkage: Option<String>,
}

impl ParameterColumns {
    fn of(algorithm: &ClusteringAlgorithm) -> Self {
        match algorithm {
            ClusteringAlgorithm::Hdbscan(a) => Self {
                min_cluster_size: Some(a.min_cluster_size),
                min_samples: Some(a.effective_min_samples()),
                cluster_selection_epsilon: Some(a.cluster_selection_epsilon),
                selection: Some(a.selection.to_string()),
                ..Self::default()
            },
            ClusteringAlgorithm::Dbscan(a) => Self {
                eps: Some(a.eps),
                min_samples: Some(a.min_samples),
                ..Self::default()
            },
            ClusteringAlgorithm::KMeans(a) => Self {
                k: Some(a.n_clusters),
                ..Self::default()
            },
            ClusteringAlgorithm::Hierarchical(a) => Self {
                k: Some(a.n_clusters),
                linkage: Some(a.linkage.to_string()),
                ..Self::default()
            },
        }
    }
}

// csv does not support `#[serde(flatten)]`, so parameter columns are spelled out
#[derive(Debug, Serialize)]
struct SearchTableRow {
    algorithm: &'static str,
    min_cluster_size: Option<usize>,
    min_samples: Option<usize>,
    cluster_selection_epsilon: Option<f64>,
    selection: Option<String>,
    eps: Option<f64>,
    k: Option<usize>,
    linkage: Option<String>,
    n_clusters: usize,
    n_noise: usize,
    noise_percentage: f64,
    largest_cluster: usize,
    largest_fraction: f64,
    median_cluster_size: usize,
    silhouette: Option<f64>,
    davies_bouldin: Option<f64>,
    calinski_harabasz: Option<f64>,
    inertia: Option<f64>,
    elapsed_secs: f64,
    recommended: bool,
}

impl SearchTableRow {
    fn new(row: &SweepRow, recommended: bool) -> Self {
        let p = ParameterColumns::of(&row.algorithm);
        let r = &row.report;
        Self {
            algorithm: row.algorithm.kind().as_str(),
            min_cluster_size: p.min_cluster_size,
            min_samples: p.min_samples,
            cluster_selection_epsilon: p.cluster_selection_epsilon,
            selection: p.selection,
            eps: p.eps,
            k: p.k,
            linkage: p.linkage,
            n_clusters: r.stats.n_clusters,
            n_noise: r.stats.n_noise,
            noise_percentage: r.stats.noise_percentage,
            largest_cluster: r.stats.largest_cluster,
            largest_fraction: r.largest_fraction(),
            median_cluster_size: r.stats.median_cluster_size,
            silhouette: r.metrics.silhouette,
            davies_bouldin: r.metrics.davies_bouldin,
            calinski_harabasz: r.metrics.calinski_harabasz,
            inertia: row.inertia,
            elapsed_secs: row.elapsed_secs,
            recommended,
        }
    }
}

/// One line of the algorithm comparison
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRow {
    pub algorithm: String,
    pub parameters: String,
    pub n_clusters: usize,
    pub noise_pct: f64,
    pub largest_cluster: usize,
    pub largest_pct: f64,
    pub median_size: usize,
    pub silhouette: Option<f64>,
    pub davies_bouldin: Option<f64>,
    /// Points the algorithm actually ran on
    pub points: usize,
    pub elapsed_secs: f64,
}

impl ComparisonRow {
    pub fn new(
        algorithm: &ClusteringAlgorithm,
        report: &ClusteringQualityReport,
        elapsed_secs: f64,
    ) -> Self {
        Self {
            algorithm: algorithm.kind().to_string(),
            parameters: algorithm.describe(),
            n_clusters: report.stats.n_clusters,
            noise_pct: report.stats.noise_percentage,
            largest_cluster: report.stats.largest_cluster,
            largest_pct: report.largest_fraction() * 100.0,
            median_size: report.stats.median_cluster_size,
            silhouette: report.metrics.silhouette,
            davies_bouldin: report.metrics.davies_bouldin,
            points: report.stats.total_points,
            elapsed_secs,
        }
    }
}

fn write_rows<T: Serialize>(rows: impl IntoIterator<Item = T>, output_path: &Path) -> Result<()> {
    let to_output_error = |e: csv::Error| PhotospotsError::OutputError {
        path: output_path.to_path_buf(),
        reason: e.to_string(),
    };
    write_atomic(output_path, |out| {
        let mut writer = csv::Writer::from_writer(out);
        for row in rows {
            writer.serialize(row).map_err(to_output_error)?;
        }
        writer
            .flush()
            .map_err(|e| PhotospotsError::output_error(output_path, e))
    })
}

/// Write `parameter_search.csv`, marking the recommended row
pub fn write_search_table(outcome: &SearchOutcome, output_path: &Path) -> Result<()> {
    let best = outcome.selection.index();
    write_rows(
        outcome
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| SearchTableRow::new(row, Some(i) == best)),
        output_path,
    )?;
    info!(
        "Wrote {} search results to {}",
        outcome.rows.len(),
        output_path.display()
    );
    Ok(())
}

/// Write `algorithm_comparison.csv`
pub fn write_comparison_table(rows: &[ComparisonRow], output_path: &Path) -> Result<()> {
    write_rows(rows, output_path)?;
    info!("Wrote algorithm comparison to {}", output_path.display());
    Ok(())
}
