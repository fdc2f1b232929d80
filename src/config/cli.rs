//! CLI argument parsing

use crate::spatial::{AlgorithmKind, Linkage, SelectionMethod};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// photospots - find interesting places in geotagged photo collections
///
/// Clusters photo locations and classifies each cluster as a permanent
/// landmark, a recurring event or a one-time happening from its monthly
/// activity.
#[derive(Parser, Debug)]
#[command(name = "photospots")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only, no progress bars)
    #[arg(short, long, default_value = "false", global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Cluster the photos and classify every cluster temporally
    Classify(ClassifyArgs),
    /// Sweep one algorithm's parameters and recommend the best configuration
    Sweep(SweepArgs),
    /// Run every algorithm once and compare cluster statistics
    Compare(CompareArgs),
}

impl Command {
    pub fn common(&self) -> &CommonArgs {
        match self {
            Command::Classify(args) => &args.common,
            Command::Sweep(args) => &args.common,
            Command::Compare(args) => &args.common,
        }
    }
}

/// Flags shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Photo table (CSV with header row, or JSON array)
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Output directory for the generated artifacts
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// TOML file overriding analysis thresholds and reference tables
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Work on a random sample of N records (quick mode)
    #[arg(long, value_name = "N")]
    pub sample: Option<usize>,

    /// Seed for sampling and centroid initialisation
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Drop isolated records before clustering
    #[arg(long, default_value = "false")]
    pub filter_outliers: bool,

    /// Cluster raw degrees even for k-means and hierarchical
    #[arg(long, default_value = "false")]
    pub no_scale: bool,
}

/// Parameters of a single clustering run
#[derive(Args, Debug, Clone)]
pub struct AlgorithmArgs {
    /// Minimum photos per cluster (hdbscan)
    #[arg(long, default_value_t = 120, value_name = "N")]
    pub min_cluster_size: usize,

    /// Core-point neighbour count (hdbscan defaults to min-cluster-size, dbscan to 10)
    #[arg(long, value_name = "N")]
    pub min_samples: Option<usize>,

    /// Merge clusters closer than this distance (hdbscan)
    #[arg(long, default_value_t = 0.0, value_name = "DIST")]
    pub cluster_selection_epsilon: f64,

    /// Flat cluster extraction (hdbscan)
    #[arg(long, value_enum, default_value_t = SelectionMethod::Eom)]
    pub selection: SelectionMethod,

    /// Neighbourhood radius in degrees (dbscan)
    #[arg(long, default_value_t = 0.005, value_name = "DIST")]
    pub eps: f64,

    /// Number of clusters (kmeans, hierarchical)
    #[arg(long, default_value_t = 50, value_name = "K")]
    pub n_clusters: usize,

    /// Merge criterion (hierarchical)
    #[arg(long, value_enum, default_value_t = Linkage::Ward)]
    pub linkage: Linkage,
}

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Clustering algorithm
    #[arg(short, long, value_enum, default_value_t = AlgorithmKind::Hdbscan)]
    pub algorithm: AlgorithmKind,

    #[command(flatten)]
    pub params: AlgorithmArgs,
}

#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Algorithm whose parameters are swept
    #[arg(short, long, value_enum, default_value_t = AlgorithmKind::Hdbscan)]
    pub algorithm: AlgorithmKind,

    /// min_cluster_size values (hdbscan), e.g. 10,20,50
    #[arg(long, value_delimiter = ',', value_name = "LIST")]
    pub min_cluster_sizes: Option<Vec<usize>>,

    /// min_samples values (hdbscan, dbscan)
    #[arg(long, value_delimiter = ',', value_name = "LIST")]
    pub min_samples: Option<Vec<usize>>,

    /// eps values (dbscan)
    #[arg(long, value_delimiter = ',', value_name = "LIST")]
    pub eps: Option<Vec<f64>>,

    /// n_clusters values (kmeans, hierarchical)
    #[arg(long, value_delimiter = ',', value_name = "LIST")]
    pub n_clusters: Option<Vec<usize>>,

    /// Flat cluster extraction for every hdbscan configuration
    #[arg(long, value_enum, default_value_t = SelectionMethod::Eom)]
    pub selection: SelectionMethod,

    /// cluster_selection_epsilon for every hdbscan configuration
    #[arg(long, default_value_t = 0.0, value_name = "DIST")]
    pub cluster_selection_epsilon: f64,

    /// Merge criterion for every hierarchical configuration
    #[arg(long, value_enum, default_value_t = Linkage::Ward)]
    pub linkage: Linkage,
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub params: AlgorithmArgs,

    /// Maximum points for hierarchical clustering (memory bound)
    #[arg(long, default_value_t = 20_000, value_name = "N")]
    pub hierarchical_sample: usize,
}

impl Cli {
    /// Get the log level based on verbosity flags
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            return tracing::Level::ERROR;
        }
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_defaults() {
        let cli = Cli::parse_from(["photospots", "classify", "-i", "photos.csv", "-o", "out"]);
        let Command::Classify(args) = cli.command else {
            panic!("expected classify");
        };
        assert_eq!(args.algorithm, AlgorithmKind::Hdbscan);
        assert_eq!(args.params.min_cluster_size, 120);
        assert_eq!(args.params.eps, 0.005);
        assert_eq!(args.common.seed, 42);
        assert!(!args.common.no_scale);
    }

    #[test]
    fn test_sweep_lists_are_comma_separated() {
        let cli = Cli::parse_from([
            "photospots", "sweep", "-i", "p.csv", "-o", "out", "--algorithm", "dbscan",
            "--eps", "0.002,0.004", "--min-samples", "5,10", "-vv",
        ]);
        assert_eq!(cli.verbose, 2);
        let Command::Sweep(args) = cli.command else {
            panic!("expected sweep");
        };
        assert_eq!(args.eps, Some(vec![0.002, 0.004]));
        assert_eq!(args.min_samples, Some(vec![5, 10]));
        assert_eq!(args.min_cluster_sizes, None);
    }

    #[test]
    fn test_quiet_forces_error_level() {
        let cli = Cli::parse_from([
            "photospots", "compare", "-i", "p.csv", "-o", "out", "-q", "-vvv",
        ]);
        assert_eq!(cli.log_level(), tracing::Level::ERROR);
    }
}
