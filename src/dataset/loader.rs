//! Photo table loading
//!
//! Reads a CSV (header row required) or a JSON array of objects into
//! [`PhotoRecord`]s. Malformed rows are logged and skipped; records outside the
//! bounding box are dropped and counted.

use crate::config::analysis::BoundingBox;
use crate::error::{PhotospotsError, Result};
use crate::spatial::sample_indices;
use crate::types::{InputFormat, PhotoRecord};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info, warn};

/// Records kept after loading, plus what was dropped on the way
#[derive(Debug, Clone, Default)]
pub struct LoadedRecords {
    pub records: Vec<PhotoRecord>,
    /// Data rows read from the file
    pub total_rows: usize,
    /// Rows that could not be parsed or failed validation
    pub skipped_rows: usize,
    /// Valid rows outside the bounding box
    pub outside_bbox: usize,
}

/// Load and filter a photo table
pub fn load_records(path: &Path, bbox: &BoundingBox) -> Result<LoadedRecords> {
    if !path.exists() {
        return Err(PhotospotsError::input_error(path, "file does not exist"));
    }
    let format = InputFormat::from_path(path).ok_or_else(|| PhotospotsError::UnsupportedFormat {
        path: path.to_path_buf(),
        format: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("unknown")
            .to_string(),
    })?;

    let rows = match format {
        InputFormat::Csv => read_csv(path)?,
        InputFormat::Json => read_json(path)?,
    };

    let mut loaded = LoadedRecords {
        total_rows: rows.len(),
        ..LoadedRecords::default()
    };

    for row in rows {
        match row.and_then(validate) {
            Ok(record) if bbox.contains(record.lat, record.long) => loaded.records.push(record),
            Ok(record) => {
                debug!("Record {} outside bounding box", record.id);
                loaded.outside_bbox += 1;
            }
            Err(e) if e.is_recoverable() => {
                warn!("Skipping row: {}", e);
                loaded.skipped_rows += 1;
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "Loaded {} records from {} ({} malformed, {} outside bounding box)",
        loaded.records.len(),
        path.display(),
        loaded.skipped_rows,
        loaded.outside_bbox
    );

    if loaded.records.is_empty() {
        warn!("No usable records in {}", path.display());
    }

    Ok(loaded)
}

/// Uniform seeded subsample, preserving input order
pub fn presample(records: Vec<PhotoRecord>, size: usize, seed: u64) -> Vec<PhotoRecord> {
    if size >= records.len() {
        return records;
    }
    let keep = sample_indices(records.len(), size, seed);
    info!("Sampling {} of {} records (seed {})", size, records.len(), seed);

    let mut picked = keep.into_iter().peekable();
    records
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| {
            if picked.peek() == Some(&i) {
                picked.next();
                Some(record)
            } else {
                None
            }
        })
        .collect()
}

fn read_csv(path: &Path) -> Result<Vec<Result<PhotoRecord>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| PhotospotsError::input_error(path, e.to_string()))?;

    let headers = reader
        .headers()
        .map_err(|e| PhotospotsError::input_error(path, e.to_string()))?
        .clone();
    for required in ["id", "lat", "long", "date_taken_year", "date_taken_month"] {
        if !headers.iter().any(|h| h == required) {
            return Err(PhotospotsError::input_error(
                path,
                format!("missing required column '{}'", required),
            ));
        }
    }

    Ok(reader
        .deserialize::<PhotoRecord>()
        .enumerate()
        .map(|(i, row)| {
            row.map_err(|e| PhotospotsError::RecordError {
                line: e.position().map(|p| p.line() as usize).unwrap_or(i + 2),
                reason: e.to_string(),
            })
        })
        .collect())
}

fn read_json(path: &Path) -> Result<Vec<Result<PhotoRecord>>> {
    let file = File::open(path).map_err(|e| PhotospotsError::input_error(path, e.to_string()))?;
    let values: Vec<serde_json::Value> = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| {
            PhotospotsError::input_error(path, format!("expected a JSON array of records: {}", e))
        })?;

    Ok(values
        .into_iter()
        .enumerate()
        .map(|(i, mut value)| {
            // Numeric ids become strings so both formats share one schema
            if let Some(id) = value.get_mut("id") {
                if id.is_number() {
                    *id = serde_json::Value::String(id.to_string());
                }
            }
            serde_json::from_value::<PhotoRecord>(value).map_err(|e| {
                PhotospotsError::RecordError {
                    line: i + 1,
                    reason: e.to_string(),
                }
            })
        })
        .collect())
}

fn validate(record: PhotoRecord) -> Result<PhotoRecord> {
    let reason = if !record.lat.is_finite() || !record.long.is_finite() {
        Some(format!("non-finite coordinates ({}, {})", record.lat, record.long))
    } else if !(1..=12).contains(&record.date_taken_month) {
        Some(format!("month {} outside 1..=12", record.date_taken_month))
    } else {
        None
    };

    match reason {
        Some(reason) => Err(PhotospotsError::RecordError {
            line: 0,
            reason: format!("record {}: {}", record.id, reason),
        }),
        None => Ok(record),
    }
}
