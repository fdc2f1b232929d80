//! Runtime configuration settings

use super::analysis::AnalysisConfig;
use super::cli::{AlgorithmArgs, Cli, Command};
use crate::error::Result;
use crate::search::ParameterGrid;
use crate::spatial::{
    Agglomerative, AlgorithmKind, ClusteringAlgorithm, Dbscan, Hdbscan, KMeans,
};
use std::path::PathBuf;

/// min_samples for DBSCAN when none is given
const DEFAULT_DBSCAN_MIN_SAMPLES: usize = 10;

/// Runtime settings for the pipeline entry points
#[derive(Debug, Clone)]
pub struct Settings {
    /// Photo table
    pub input: PathBuf,
    /// Output directory
    pub output: PathBuf,
    /// Thresholds, reference tables and cost limits
    pub analysis: AnalysisConfig,
    /// Pre-sample size, if any
    pub sample: Option<usize>,
    /// Seed for pre-sampling, comparison sampling and k-means
    pub seed: u64,
    /// Run the density outlier filter before clustering
    pub filter_outliers: bool,
    /// Standardize coordinates for algorithms that need it
    pub scale_coordinates: bool,
    /// Show progress bars
    pub show_progress: bool,
    /// Configuration used by `classify`
    pub algorithm: ClusteringAlgorithm,
    /// Grid used by `sweep`
    pub grid: ParameterGrid,
    /// One configuration per algorithm, used by `compare`
    pub comparison: Vec<ClusteringAlgorithm>,
    /// Point budget for hierarchical clustering in `compare`
    pub hierarchical_sample: usize,
}

impl Settings {
    /// Create settings from CLI arguments, loading the TOML overrides if given
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let common = cli.command.common();
        let analysis = match &common.config {
            Some(path) => AnalysisConfig::load(path)?,
            None => AnalysisConfig::default(),
        };

        let mut settings = Self {
            input: common.input.clone(),
            output: common.output.clone(),
            analysis,
            sample: common.sample,
            seed: common.seed,
            filter_outliers: common.filter_outliers,
            scale_coordinates: !common.no_scale,
            show_progress: !cli.quiet,
            ..Self::default()
        };

        match &cli.command {
            Command::Classify(args) => {
                settings.algorithm = algorithm_from_args(args.algorithm, &args.params, common.seed);
            }
            Command::Sweep(args) => {
                let mut grid = ParameterGrid::for_kind(args.algorithm);
                if let Some(values) = &args.min_cluster_sizes {
                    grid.min_cluster_sizes = values.clone();
                }
                if let Some(values) = &args.min_samples {
                    grid.min_samples = values.clone();
                }
                if let Some(values) = &args.eps {
                    grid.eps_values = values.clone();
                }
                if let Some(values) = &args.n_clusters {
                    grid.n_clusters = values.clone();
                }
                grid.selection = args.selection;
                grid.cluster_selection_epsilon = args.cluster_selection_epsilon;
                grid.linkage = args.linkage;
                grid.seed = common.seed;
                settings.grid = grid;
            }
            Command::Compare(args) => {
                settings.comparison = AlgorithmKind::ALL
                    .iter()
                    .map(|&kind| algorithm_from_args(kind, &args.params, common.seed))
                    .collect();
                settings.hierarchical_sample = args.hierarchical_sample;
            }
        }

        Ok(settings)
    }

    /// Whether `algorithm` should run on standardized coordinates
    pub fn scales(&self, algorithm: &ClusteringAlgorithm) -> bool {
        self.scale_coordinates && algorithm.requires_scaling()
    }
}

/// Build one configuration from the single-run flags
pub fn algorithm_from_args(
    kind: AlgorithmKind,
    args: &AlgorithmArgs,
    seed: u64,
) -> ClusteringAlgorithm {
    match kind {
        AlgorithmKind::Hdbscan => ClusteringAlgorithm::Hdbscan(
            Hdbscan::new(args.min_cluster_size)
                .with_min_samples(args.min_samples)
                .with_epsilon(args.cluster_selection_epsilon)
                .with_selection(args.selection),
        ),
        AlgorithmKind::Dbscan => ClusteringAlgorithm::Dbscan(Dbscan::new(
            args.eps,
            args.min_samples.unwrap_or(DEFAULT_DBSCAN_MIN_SAMPLES),
        )),
        AlgorithmKind::Kmeans => {
            ClusteringAlgorithm::KMeans(KMeans::new(args.n_clusters).with_seed(seed))
        }
        AlgorithmKind::Hierarchical => {
            ClusteringAlgorithm::Hierarchical(Agglomerative::new(args.n_clusters, args.linkage))
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input: PathBuf::from("photos.csv"),
            output: PathBuf::from("./output"),
            analysis: AnalysisConfig::default(),
            sample: None,
            seed: 42,
            filter_outliers: false,
            scale_coordinates: true,
            show_progress: true,
            algorithm: ClusteringAlgorithm::default(),
            grid: ParameterGrid::for_kind(AlgorithmKind::Hdbscan),
            comparison: vec![
                ClusteringAlgorithm::Hdbscan(Hdbscan::default()),
                ClusteringAlgorithm::Dbscan(Dbscan::default()),
                ClusteringAlgorithm::KMeans(KMeans::new(50)),
                ClusteringAlgorithm::Hierarchical(Agglomerative::default()),
            ],
            hierarchical_sample: 20_000,
        }
    }
}
