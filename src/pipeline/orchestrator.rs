//! Pipeline orchestration
//!
//! Each entry point loads the photo table, prepares coordinates, runs its
//! analysis and writes its artifacts into the output directory. Stages run
//! one after the other on the calling thread.

use crate::config::Settings;
use crate::dataset::{self, write_clustered_records};
use crate::error::{PhotospotsError, Result};
use crate::export::{self, files, ComparisonRow};
use crate::quality;
use crate::search;
use crate::spatial::{
    cluster_extents, dense_point_mask, prepare_coordinates, sample_indices, Clusterer,
    ClusteringAlgorithm,
};
use crate::temporal::{self, ClassificationSummary, TemporalLabel};
use crate::types::{PhotoRecord, NOISE};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of `classify`
#[derive(Debug)]
pub struct ClassifyResult {
    pub total_records: usize,
    pub n_clusters: usize,
    pub n_noise: usize,
    pub summary: ClassificationSummary,
    pub silhouette: Option<f64>,
    pub written: Vec<PathBuf>,
}

/// Outcome of `sweep`
#[derive(Debug)]
pub struct SweepResult {
    pub configurations: usize,
    /// Description of the recommended configuration
    pub best: Option<String>,
    /// Why nothing was recommended
    pub warning: Option<String>,
    pub written: Vec<PathBuf>,
}

/// Outcome of `compare`
#[derive(Debug)]
pub struct CompareResult {
    pub rows: Vec<ComparisonRow>,
    pub written: Vec<PathBuf>,
}

fn ensure_output_dir(settings: &Settings) -> Result<()> {
    std::fs::create_dir_all(&settings.output).map_err(|e| PhotospotsError::OutputError {
        path: settings.output.clone(),
        reason: e.to_string(),
    })
}

/// Load, bounding-box filter, pre-sample and outlier-filter the records
fn load_prepared(settings: &Settings) -> Result<Vec<PhotoRecord>> {
    let load_start = Instant::now();
    let loaded = dataset::load_records(&settings.input, &settings.analysis.bounding_box)?;
    let mut records = loaded.records;

    if let Some(size) = settings.sample {
        records = dataset::presample(records, size, settings.seed);
    }

    if settings.filter_outliers && !records.is_empty() {
        let points = prepare_coordinates(&records, false);
        let mask = dense_point_mask(&points, &settings.analysis.outliers);
        let before = records.len();
        records = records
            .into_iter()
            .zip(mask)
            .filter_map(|(record, keep)| keep.then_some(record))
            .collect();
        info!(
            "Outlier filter removed {} isolated records ({} kept)",
            before - records.len(),
            records.len()
        );
    }

    info!(
        "Prepared {} records in {:.2}s",
        records.len(),
        load_start.elapsed().as_secs_f64()
    );
    Ok(records)
}

/// Cluster, evaluate, classify and export
pub fn run_classify(settings: &Settings) -> Result<ClassifyResult> {
    let pipeline_start = Instant::now();
    settings.algorithm.validate()?;
    ensure_output_dir(settings)?;

    let records = load_prepared(settings)?;

    // Phase 1: Clustering
    let algorithm = &settings.algorithm;
    let scaled = settings.scales(algorithm);
    let points = prepare_coordinates(&records, scaled);
    info!("Clustering {} points with {}", points.len(), algorithm.describe());

    let cluster_start = Instant::now();
    let labels = algorithm.fit_predict(&points)?;
    let report = quality::evaluate(&points, &labels, &settings.analysis.quality);
    info!(
        "Found {} clusters ({:.1}% noise) in {:.2}s",
        report.stats.n_clusters,
        report.stats.noise_percentage,
        cluster_start.elapsed().as_secs_f64()
    );

    // Phase 2: Temporal classification
    let temporal_start = Instant::now();
    let results = temporal::classify_all(&records, &labels, &settings.analysis);
    let summary = ClassificationSummary::from_results(&results);
    info!(
        "Temporal classification completed in {:.2}s",
        temporal_start.elapsed().as_secs_f64()
    );

    // Phase 3: Export
    let export_start = Instant::now();
    let out = |name: &str| settings.output.join(name);
    let written = vec![
        out(files::CLASSIFICATIONS),
        out(files::CLUSTERS),
        out(files::CLUSTERED_RECORDS),
        out(files::CLUSTERING_STATS),
        out(files::TEMPORAL_REPORT),
    ];
    export::write_classifications(&results, &written[0])?;
    export::write_cluster_extents(&cluster_extents(&records, &labels), &written[1])?;
    write_clustered_records(&records, &labels, &written[2])?;
    export::write_clustering_stats(algorithm, scaled, &report, &written[3])?;
    export::write_temporal_report(&results, &settings.analysis, &written[4])?;
    info!(
        "Export completed in {:.2}s",
        export_start.elapsed().as_secs_f64()
    );

    info!(
        "Total pipeline time: {:.2}s",
        pipeline_start.elapsed().as_secs_f64()
    );

    Ok(ClassifyResult {
        total_records: records.len(),
        n_clusters: report.stats.n_clusters,
        n_noise: labels.iter().filter(|&&l| l == NOISE).count(),
        summary,
        silhouette: report.metrics.silhouette,
        written,
    })
}

/// Parameter search over the configured grid
pub fn run_sweep(settings: &Settings) -> Result<SweepResult> {
    let pipeline_start = Instant::now();
    // Fail on bad axes before touching the input
    settings.grid.validate()?;
    ensure_output_dir(settings)?;

    let records = load_prepared(settings)?;
    let scaled = settings.scale_coordinates
        && settings
            .grid
            .configurations()
            .first()
            .is_some_and(ClusteringAlgorithm::requires_scaling);
    let points = prepare_coordinates(&records, scaled);

    let outcome = search::run_search(
        &points,
        &settings.grid,
        &settings.analysis.quality,
        &settings.analysis.search,
        settings.show_progress,
    )?;

    let search_path = settings.output.join(files::PARAMETER_SEARCH);
    let best_path = settings.output.join(files::BEST_PARAMS);
    export::write_search_table(&outcome, &search_path)?;
    export::write_best_params(
        &outcome,
        settings.analysis.search.max_largest_fraction,
        &best_path,
    )?;

    info!(
        "Total pipeline time: {:.2}s",
        pipeline_start.elapsed().as_secs_f64()
    );

    Ok(SweepResult {
        configurations: outcome.rows.len(),
        best: outcome.best_algorithm().map(ClusteringAlgorithm::describe),
        warning: match outcome.selection {
            search::Selection::NoRecommendation(reason) => Some(reason),
            search::Selection::Best(_) => None,
        },
        written: vec![search_path, best_path],
    })
}

/// Run each comparison configuration once and tabulate the results
pub fn run_compare(settings: &Settings) -> Result<CompareResult> {
    let pipeline_start = Instant::now();
    for algorithm in &settings.comparison {
        algorithm.validate()?;
    }
    ensure_output_dir(settings)?;

    let records = load_prepared(settings)?;

    let progress_bar = if settings.show_progress {
        let pb = ProgressBar::new(settings.comparison.len() as u64);
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

    let mut rows = Vec::with_capacity(settings.comparison.len());
    for algorithm in &settings.comparison {
        if let Some(ref pb) = progress_bar {
            pb.set_message(algorithm.kind().to_string());
        }

        let mut points = prepare_coordinates(&records, settings.scales(algorithm));
        if matches!(algorithm, ClusteringAlgorithm::Hierarchical(_))
            && points.len() > settings.hierarchical_sample
        {
            warn!(
                "Hierarchical clustering limited to a sample of {} of {} points",
                settings.hierarchical_sample,
                points.len()
            );
            points = sample_indices(points.len(), settings.hierarchical_sample, settings.seed)
                .into_iter()
                .map(|i| points[i])
                .collect();
        }

        let start = Instant::now();
        let labels = algorithm.fit_predict(&points)?;
        let elapsed = start.elapsed().as_secs_f64();
        let report = quality::evaluate(&points, &labels, &settings.analysis.quality);
        debug!(
            "{}: {} clusters in {:.2}s",
            algorithm.describe(),
            report.stats.n_clusters,
            elapsed
        );
        rows.push(ComparisonRow::new(algorithm, &report, elapsed));

        if let Some(ref pb) = progress_bar {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress_bar {
        pb.finish_with_message("Comparison complete");
    }

    let table_path = settings.output.join(files::ALGORITHM_COMPARISON);
    export::write_comparison_table(&rows, &table_path)?;

    info!(
        "Total pipeline time: {:.2}s",
        pipeline_start.elapsed().as_secs_f64()
    );

    Ok(CompareResult {
        rows,
        written: vec![table_path],
    })
}

/// Print the human-facing summary of a classify run
pub fn print_classify_summary(result: &ClassifyResult) {
    println!();
    println!(
        "Clustered {} records into {} clusters ({} noise)",
        result.total_records, result.n_clusters, result.n_noise
    );
    if let Some(s) = result.silhouette {
        println!("Silhouette score: {:.3}", s);
    }
    for label in TemporalLabel::ALL {
        println!(
            "  {:<10} {:>5} clusters {:>8} photos",
            label.as_str(),
            result.summary.cluster_count(label),
            result.summary.photo_count(label)
        );
    }
    print_written(&result.written);
}

/// Print the human-facing summary of a sweep run
pub fn print_sweep_summary(result: &SweepResult) {
    println!();
    println!("Tested {} configurations", result.configurations);
    match (&result.best, &result.warning) {
        (Some(best), _) => println!("Recommended: {}", best),
        (None, Some(warning)) => println!("No recommendation: {}", warning),
        (None, None) => println!("No recommendation"),
    }
    print_written(&result.written);
}

/// Print the human-facing summary of a compare run
pub fn print_compare_summary(result: &CompareResult) {
    println!();
    println!(
        "{:<13} {:>9} {:>8} {:>10} {:>11}",
        "algorithm", "clusters", "noise%", "largest%", "silhouette"
    );
    for row in &result.rows {
        println!(
            "{:<13} {:>9} {:>8.1} {:>10.1} {:>11}",
            row.algorithm,
            row.n_clusters,
            row.noise_pct,
            row.largest_pct,
            row.silhouette
                .map(|s| format!("{:.3}", s))
                .unwrap_or_else(|| "n/a".to_string())
        );
    }
    print_written(&result.written);
}

fn print_written(paths: &[PathBuf]) {
    println!();
    for path in paths {
        println!("✓ {}", path.display());
    }
}
