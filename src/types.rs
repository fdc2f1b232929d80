//! Core data types for photospots
//!
//! These types represent the domain model and flow through the pipeline.

use serde::{Deserialize, Serialize};

// =============================================================================
// Cluster labels
// =============================================================================

/// Cluster assignment of a single record: a non-negative cluster id or [`NOISE`]
pub type ClusterLabel = i32;

/// Sentinel label for records that belong to no cluster
pub const NOISE: ClusterLabel = -1;

/// Number of distinct cluster ids in a label slice (noise excluded)
pub fn count_clusters(labels: &[ClusterLabel]) -> usize {
    let mut ids: Vec<ClusterLabel> = labels.iter().copied().filter(|&l| l != NOISE).collect();
    ids.sort_unstable();
    ids.dedup();
    ids.len()
}

// =============================================================================
// Photo records
// =============================================================================

/// One geotagged photo as produced by the ingestion stage
///
/// Dates are already validated upstream (month in 1..=12, day in 1..=31).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: String,
    pub lat: f64,
    pub long: f64,
    pub date_taken_year: i32,
    pub date_taken_month: u8,
    #[serde(default)]
    pub date_taken_day: Option<u8>,
    #[serde(default)]
    pub date_taken_hour: Option<u8>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl PhotoRecord {
    /// Minimal record with position and capture month, used heavily in tests
    pub fn new(id: impl Into<String>, lat: f64, long: f64, year: i32, month: u8) -> Self {
        Self {
            id: id.into(),
            lat,
            long,
            date_taken_year: year,
            date_taken_month: month,
            date_taken_day: Some(1),
            date_taken_hour: None,
            tags: None,
            title: None,
        }
    }

    /// Spatial position as a clustering point (x = latitude, y = longitude)
    pub fn point(&self) -> Point {
        Point::new(self.lat, self.long)
    }

    /// Year-month label in chronological sort order, e.g. "2015-12"
    pub fn year_month(&self) -> String {
        format!("{}-{:02}", self.date_taken_year, self.date_taken_month)
    }
}

// =============================================================================
// Geometry
// =============================================================================

/// A 2D point in coordinate units (degrees, or standardized units)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance
    #[inline]
    pub fn distance(&self, other: &Point) -> f64 {
        self.distance_sq(other).sqrt()
    }

    /// Squared Euclidean distance
    #[inline]
    pub fn distance_sq(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

// =============================================================================
// Calendar helpers
// =============================================================================

/// Short month names indexed by month - 1
pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Short name for a 1-based month number
pub fn month_name(month: u8) -> &'static str {
    match month {
        1..=12 => MONTH_NAMES[(month - 1) as usize],
        _ => "?",
    }
}

// =============================================================================
// Supported formats
// =============================================================================

/// Photo table formats supported by the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "csv" => Some(InputFormat::Csv),
            "json" => Some(InputFormat::Json),
            _ => None,
        }
    }

    /// Detect format from a path's extension
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}
