//! Artifact writers: JSON documents, CSV tables and the markdown report
//!
//! Every artifact is written to a temporary sibling first and renamed into
//! place, so a reader never sees a half-written file.

pub mod json;
pub mod report;
pub mod table;

pub use json::{
    write_best_params, write_classifications, write_cluster_extents, write_clustering_stats,
    ClassificationsJson, ExportMetadata,
};
pub use report::write_temporal_report;
pub use table::{write_comparison_table, write_search_table, ComparisonRow};

use crate::error::{PhotospotsError, Result};
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Output file names inside the output directory
pub mod files {
    pub const CLASSIFICATIONS: &str = "temporal_classifications.json";
    pub const CLUSTERS: &str = "clusters.json";
    pub const CLUSTERED_RECORDS: &str = "clustered_records.csv";
    pub const CLUSTERING_STATS: &str = "clustering_stats.json";
    pub const TEMPORAL_REPORT: &str = "temporal_report.md";
    pub const PARAMETER_SEARCH: &str = "parameter_search.csv";
    pub const BEST_PARAMS: &str = "best_params.json";
    pub const ALGORITHM_COMPARISON: &str = "algorithm_comparison.csv";
}

fn temp_path(output_path: &Path) -> PathBuf {
    let mut name: OsString = output_path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".tmp");
    output_path.with_file_name(name)
}

/// Write through `fill` into a temp file, then rename it over `output_path`
pub(crate) fn write_atomic<F>(output_path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    // Same directory as the target, so the rename stays on one filesystem
    let temp_path = temp_path(output_path);

    let file = File::create(&temp_path).map_err(|e| PhotospotsError::OutputError {
        path: output_path.to_path_buf(),
        reason: format!("Failed to create temp file: {}", e),
    })?;
    let mut writer = BufWriter::new(file);

    let written = fill(&mut writer).and_then(|_| {
        writer
            .flush()
            .map_err(|e| PhotospotsError::output_error(output_path, e))
    });
    drop(writer);
    if let Err(e) = written {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e);
    }

    std::fs::rename(&temp_path, output_path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        PhotospotsError::OutputError {
            path: output_path.to_path_buf(),
            reason: format!("Failed to finalize file: {}", e),
        }
    })
}
