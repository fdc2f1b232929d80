//! Analysis configuration: thresholds, reference tables and cost limits
//!
//! Every constant the analysis depends on lives here so that a run can
//! override any of them from a TOML file. `Default` reproduces the values the
//! Lyon dataset was tuned with.
//!
//! ```toml
//! [classification]
//! december_ratio = 0.3
//!
//! [[known_events]]
//! name = "Fête des Lumières"
//! months = [12]
//! description = "Annual light festival in December"
//! ```

use crate::error::{PhotospotsError, Result};
use crate::temporal::events::{default_known_events, KnownEvent};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// All tunable analysis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Records outside this box are dropped at load time
    pub bounding_box: BoundingBox,
    pub classification: ClassificationThresholds,
    pub peaks: PeakThresholds,
    pub quality: QualityConfig,
    pub search: SearchConfig,
    pub outliers: OutlierFilterConfig,
    /// Named local events used to annotate peak months
    pub known_events: Vec<KnownEvent>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bounding_box: BoundingBox::default(),
            classification: ClassificationThresholds::default(),
            peaks: PeakThresholds::default(),
            quality: QualityConfig::default(),
            search: SearchConfig::default(),
            outliers: OutlierFilterConfig::default(),
            known_events: default_known_events(),
        }
    }
}

impl AnalysisConfig {
    /// Load overrides from a TOML file; missing fields keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PhotospotsError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: AnalysisConfig = toml::from_str(&content).map_err(|e| {
            PhotospotsError::ConfigError(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        debug!("Loaded analysis config from {}", path.display());
        Ok(config)
    }

    /// Reject values that would make the analysis meaningless
    pub fn validate(&self) -> Result<()> {
        let c = &self.classification;
        let ratios = [
            ("classification.december_ratio", c.december_ratio),
            ("classification.summer_ratio", c.summer_ratio),
            ("classification.one_time_peak_ratio", c.one_time_peak_ratio),
            ("classification.variable_peak_ratio", c.variable_peak_ratio),
            ("classification.residual_peak_ratio", c.residual_peak_ratio),
            ("classification.active_month_share", c.active_month_share),
            ("search.max_largest_fraction", self.search.max_largest_fraction),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(PhotospotsError::ConfigError(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        for (name, value) in [
            ("classification.variable_cv", c.variable_cv),
            ("classification.steady_cv", c.steady_cv),
            ("classification.multi_year_max_cv", c.multi_year_max_cv),
            ("peaks.monthly", self.peaks.monthly),
            ("peaks.year_month", self.peaks.year_month),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PhotospotsError::ConfigError(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if self.quality.sample_size < 2 {
            return Err(PhotospotsError::ConfigError(format!(
                "quality.sample_size must be at least 2, got {}",
                self.quality.sample_size
            )));
        }

        let b = &self.bounding_box;
        if b.lat_min >= b.lat_max || b.lon_min >= b.lon_max {
            return Err(PhotospotsError::ConfigError(format!(
                "bounding_box is empty: lat {}..{}, lon {}..{}",
                b.lat_min, b.lat_max, b.lon_min, b.lon_max
            )));
        }

        for event in &self.known_events {
            if event.months.is_empty() || event.months.iter().any(|m| !(1..=12).contains(m)) {
                return Err(PhotospotsError::ConfigError(format!(
                    "known event '{}' needs months within 1..=12, got {:?}",
                    event.name, event.months
                )));
            }
        }

        Ok(())
    }
}

/// Geographic filter applied at load time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl Default for BoundingBox {
    /// Greater Lyon area
    fn default() -> Self {
        Self {
            lat_min: 45.55,
            lat_max: 45.95,
            lon_min: 4.65,
            lon_max: 5.10,
        }
    }
}

impl BoundingBox {
    /// Inclusive containment test
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && lon >= self.lon_min && lon <= self.lon_max
    }
}

/// Thresholds of the temporal rule cascade, in rule order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationThresholds {
    /// Rule 1: December share above which a cluster is recurring
    pub december_ratio: f64,
    /// Rule 2: July+August share above which a cluster is recurring
    pub summer_ratio: f64,
    /// Rule 3: peak share above which a short-lived cluster is one-time
    pub one_time_peak_ratio: f64,
    /// Rule 3: maximum number of active months for one-time
    pub one_time_max_active_months: u32,
    /// Rule 4: CV above which a peaked cluster is recurring
    pub variable_cv: f64,
    /// Rule 4: peak share required together with high CV
    pub variable_peak_ratio: f64,
    /// Rule 5: CV below which a busy cluster is permanent
    pub steady_cv: f64,
    /// Rule 5: minimum active months for a steady cluster
    pub steady_min_active_months: u32,
    /// Rule 6: distinct years for a long-lived cluster
    pub multi_year_min_years: u32,
    /// Rule 6: CV ceiling for a long-lived cluster
    pub multi_year_max_cv: f64,
    /// Rule 7: residual peak share for recurring
    pub residual_peak_ratio: f64,
    /// Share of the cluster total a month needs to count as active
    pub active_month_share: f64,
}

impl Default for ClassificationThresholds {
    fn default() -> Self {
        Self {
            december_ratio: 0.25,
            summer_ratio: 0.35,
            one_time_peak_ratio: 0.5,
            one_time_max_active_months: 3,
            variable_cv: 1.0,
            variable_peak_ratio: 0.35,
            steady_cv: 0.8,
            steady_min_active_months: 6,
            multi_year_min_years: 5,
            multi_year_max_cv: 1.2,
            residual_peak_ratio: 0.3,
            active_month_share: 0.05,
        }
    }
}

/// Z-score thresholds of the peak detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakThresholds {
    /// Threshold over the 12 calendar-month bins
    pub monthly: f64,
    /// Threshold over the chronological year-month series
    pub year_month: f64,
}

impl Default for PeakThresholds {
    fn default() -> Self {
        Self {
            monthly: 1.5,
            year_month: 1.5,
        }
    }
}

/// Cost control for internal validity metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Maximum clustered points scored; larger inputs are subsampled
    pub sample_size: usize,
    /// Seed of the subsample
    pub seed: u64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            sample_size: 10_000,
            seed: 42,
        }
    }
}

/// Parameter search constraints
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Largest admissible share of all points in a single cluster
    pub max_largest_fraction: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_largest_fraction: 0.5,
        }
    }
}

/// Density pre-filter: keep records with enough close neighbours
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierFilterConfig {
    pub min_neighbors: usize,
    /// Neighbourhood radius in degrees (0.002 is roughly 200 m in Lyon)
    pub radius: f64,
}

impl Default for OutlierFilterConfig {
    fn default() -> Self {
        Self {
            min_neighbors: 10,
            radius: 0.002,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.classification.december_ratio, 0.25);
        assert_eq!(config.classification.multi_year_min_years, 5);
        assert_eq!(config.search.max_largest_fraction, 0.5);
        assert_eq!(config.quality.sample_size, 10_000);
        assert!(!config.known_events.is_empty());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[classification]\ndecember_ratio = 0.4\n\n[peaks]\nmonthly = 2.0").unwrap();

        let config = AnalysisConfig::load(file.path()).unwrap();
        assert_eq!(config.classification.december_ratio, 0.4);
        assert_eq!(config.classification.summer_ratio, 0.35);
        assert_eq!(config.peaks.monthly, 2.0);
        assert_eq!(config.peaks.year_month, 1.5);
        assert_eq!(config.known_events, default_known_events());
    }

    #[test]
    fn test_out_of_range_ratio_rejected() {
        let mut config = AnalysisConfig::default();
        config.classification.summer_ratio = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("summer_ratio"));
    }

    #[test]
    fn test_event_with_bad_month_rejected() {
        let mut config = AnalysisConfig::default();
        config.known_events.push(KnownEvent::new("Bogus", &[13], ""));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bounding_box_contains_lyon_centre() {
        let bbox = BoundingBox::default();
        assert!(bbox.contains(45.764, 4.8357));
        assert!(!bbox.contains(48.8566, 2.3522));
    }
}
