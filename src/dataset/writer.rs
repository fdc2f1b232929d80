//! Cluster-column join: input records plus their `cluster` label

use crate::error::{PhotospotsError, Result};
use crate::export::write_atomic;
use crate::types::{ClusterLabel, PhotoRecord};
use serde::Serialize;
use std::path::Path;
use tracing::info;

#[derive(Serialize)]
struct ClusteredRow<'a> {
    id: &'a str,
    lat: f64,
    long: f64,
    date_taken_year: i32,
    date_taken_month: u8,
    date_taken_day: Option<u8>,
    date_taken_hour: Option<u8>,
    tags: Option<&'a str>,
    title: Option<&'a str>,
    cluster: ClusterLabel,
}

/// Write `records` with a trailing `cluster` column (-1 for noise)
pub fn write_clustered_records(
    records: &[PhotoRecord],
    labels: &[ClusterLabel],
    output_path: &Path,
) -> Result<()> {
    if records.len() != labels.len() {
        return Err(PhotospotsError::invalid_parameter(
            "labels",
            format!("{} labels for {} records", labels.len(), records.len()),
        ));
    }

    write_atomic(output_path, |out| {
        let mut writer = csv::Writer::from_writer(out);
        for (record, &cluster) in records.iter().zip(labels) {
            writer
                .serialize(ClusteredRow {
                    id: &record.id,
                    lat: record.lat,
                    long: record.long,
                    date_taken_year: record.date_taken_year,
                    date_taken_month: record.date_taken_month,
                    date_taken_day: record.date_taken_day,
                    date_taken_hour: record.date_taken_hour,
                    tags: record.tags.as_deref(),
                    title: record.title.as_deref(),
                    cluster,
                })
                .map_err(|e| PhotospotsError::OutputError {
                    path: output_path.to_path_buf(),
                    reason: e.to_string(),
                })?;
        }
        writer
            .flush()
            .map_err(|e| PhotospotsError::output_error(output_path, e))
    })?;

    info!("Wrote {} clustered records to {}", records.len(), output_path.display());
    Ok(())
}
