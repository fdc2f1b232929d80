//! JSON artifacts for the map renderer and for parameter selection

use super::write_atomic;
use crate::error::{PhotospotsError, Result};
use crate::quality::ClusteringQualityReport;
use crate::search::SearchOutcome;
use crate::spatial::{ClusterExtent, ClusteringAlgorithm};
use crate::temporal::ClassificationResult;
use crate::types::ClusterLabel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Schema version of the wrapped documents
const SCHEMA_VERSION: &str = "1.0";

/// Classification artifact: cluster id → result.
///
/// Integer keys serialize as JSON strings ("0", "1", ...) and keep numeric order.
pub type ClassificationsJson = BTreeMap<ClusterLabel, ClassificationResult>;

/// Provenance block shared by the wrapped documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// photospots version that generated this file
    pub generator_version: String,
    /// RFC 3339 timestamp of export
    pub exported_at: String,
}

impl ExportMetadata {
    pub fn now() -> Self {
        Self {
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClustersJson {
    pub version: String,
    pub metadata: ExportMetadata,
    pub cluster_count: usize,
    pub clusters: BTreeMap<ClusterLabel, ClusterExtent>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClusteringStatsJson {
    pub version: String,
    pub metadata: ExportMetadata,
    pub parameters: ClusteringAlgorithm,
    /// Whether clustering ran on standardized coordinates
    pub scaled_coordinates: bool,
    #[serde(flatten)]
    pub report: ClusteringQualityReport,
}

/// The recommended configuration and its scores
#[derive(Debug, Serialize, Deserialize)]
pub struct BestConfiguration {
    pub parameters: ClusteringAlgorithm,
    pub silhouette: Option<f64>,
    pub davies_bouldin: Option<f64>,
    pub calinski_harabasz: Option<f64>,
    pub n_clusters: usize,
    pub noise_percentage: f64,
    pub largest_cluster: usize,
    pub largest_fraction: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BestParamsJson {
    pub version: String,
    pub metadata: ExportMetadata,
    pub configurations_tested: usize,
    pub max_largest_fraction: f64,
    /// `null` when no configuration satisfied the largest-cluster cap
    pub best: Option<BestConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

fn write_document<T: Serialize>(value: &T, output_path: &Path) -> Result<()> {
    write_atomic(output_path, |writer| {
        serde_json::to_writer_pretty(&mut *writer, value).map_err(|e| PhotospotsError::OutputError {
            path: output_path.to_path_buf(),
            reason: e.to_string(),
        })
    })
}

/// Write `temporal_classifications.json`
pub fn write_classifications(results: &ClassificationsJson, output_path: &Path) -> Result<()> {
    write_document(results, output_path)?;
    info!(
        "Wrote {} cluster classifications to {}",
        results.len(),
        output_path.display()
    );
    Ok(())
}

/// Write `clusters.json`
pub fn write_cluster_extents(
    extents: &BTreeMap<ClusterLabel, ClusterExtent>,
    output_path: &Path,
) -> Result<()> {
    let document = ClustersJson {
        version: SCHEMA_VERSION.to_string(),
        metadata: ExportMetadata::now(),
        cluster_count: extents.len(),
        clusters: extents.clone(),
    };
    write_document(&document, output_path)?;
    let without_hull = extents.values().filter(|e| e.hull.is_none()).count();
    info!(
        "Wrote {} cluster extents to {} ({} without hull)",
        extents.len(),
        output_path.display(),
        without_hull
    );
    Ok(())
}

/// Write `clustering_stats.json`
pub fn write_clustering_stats(
    algorithm: &ClusteringAlgorithm,
    scaled_coordinates: bool,
    report: &ClusteringQualityReport,
    output_path: &Path,
) -> Result<()> {
    let document = ClusteringStatsJson {
        version: SCHEMA_VERSION.to_string(),
        metadata: ExportMetadata::now(),
        parameters: algorithm.clone(),
        scaled_coordinates,
        report: report.clone(),
    };
    write_document(&document, output_path)?;
    info!("Wrote clustering statistics to {}", output_path.display());
    Ok(())
}

/// Write `best_params.json`; `best` is `null` when the search has no recommendation
pub fn write_best_params(
    outcome: &SearchOutcome,
    max_largest_fraction: f64,
    output_path: &Path,
) -> Result<()> {
    let best = outcome.best().map(|row| BestConfiguration {
        parameters: row.algorithm.clone(),
        silhouette: row.report.metrics.silhouette,
        davies_bouldin: row.report.metrics.davies_bouldin,
        calinski_harabasz: row.report.metrics.calinski_harabasz,
        n_clusters: row.report.stats.n_clusters,
        noise_percentage: row.report.stats.noise_percentage,
        largest_cluster: row.report.stats.largest_cluster,
        largest_fraction: row.report.largest_fraction(),
    });
    let warning = match &outcome.selection {
        crate::search::Selection::NoRecommendation(reason) => Some(reason.clone()),
        crate::search::Selection::Best(_) => None,
    };

    let document = BestParamsJson {
        version: SCHEMA_VERSION.to_string(),
        metadata: ExportMetadata::now(),
        configurations_tested: outcome.rows.len(),
        max_largest_fraction,
        best,
        warning,
    };
    write_document(&document, output_path)?;

    if document.best.is_none() {
        warn!(
            "Wrote {} without a recommendation",
            output_path.display()
        );
    } else {
        info!("Wrote best parameters to {}", output_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::search::{Selection, SweepRow};
    use crate::spatial::Dbscan;
    use crate::temporal::classify_all;
    use crate::types::PhotoRecord;
    use tempfile::TempDir;

    #[test]
    fn test_classification_contract_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("temporal_classifications.json");
        let records: Vec<PhotoRecord> = (0..40)
            .map(|i| PhotoRecord::new(i.to_string(), 45.76, 4.83, 2015, 12))
            .collect();
        let labels = vec![7; 40];
        let results = classify_all(&records, &labels, &AnalysisConfig::default());

        write_classifications(&results, &path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let cluster = &json["7"];
        assert_eq!(cluster["type"], "recurring");
        assert!(cluster["matched_events"].is_array());
        for field in ["total_photos", "december_ratio", "summer_ratio", "peak_month"] {
            assert!(!cluster["stats"][field].is_null(), "missing stats.{}", field);
        }

        let back: ClassificationsJson =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[&7].label, results[&7].label);
        assert_eq!(back[&7].peaks.peak_months, vec![12]);
    }

    #[test]
    fn test_best_params_null_with_warning() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("best_params.json");
        let outcome = SearchOutcome {
            rows: vec![SweepRow {
                algorithm: ClusteringAlgorithm::Dbscan(Dbscan::new(0.005, 10)),
                report: ClusteringQualityReport::default(),
                inertia: None,
                elapsed_secs: 0.1,
            }],
            selection: Selection::NoRecommendation("all configurations too coarse".to_string()),
        };

        write_best_params(&outcome, 0.5, &path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(json["best"].is_null());
        assert_eq!(json["warning"], "all configurations too coarse");
        assert_eq!(json["configurations_tested"], 1);
        assert!(json["metadata"]["exported_at"].is_string());
    }

    #[test]
    fn test_clustering_stats_has_timestamp_and_parameters() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clustering_stats.json");
        let algorithm = ClusteringAlgorithm::default();
        write_clustering_stats(&algorithm, false, &ClusteringQualityReport::default(), &path)
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["parameters"]["algorithm"], "hdbscan");
        assert_eq!(json["n_clusters"], 0);
        assert!(json["metadata"]["exported_at"].is_string());
    }
}
