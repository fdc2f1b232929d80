//! Integration tests for the photospots pipeline
//!
//! These tests write synthetic photo tables, run the pipeline entry points and
//! inspect the artifacts they produce.

use photospots::config::Settings;
use photospots::export::files;
use photospots::pipeline;
use photospots::spatial::{
    Agglomerative, ClusteringAlgorithm, Dbscan, Hdbscan, KMeans, Linkage,
};
use photospots::PhotoRecord;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const OLD_TOWN: (f64, f64) = (45.762, 4.827);
const PRESQU_ILE: (f64, f64) = (45.757, 4.832);
const CONFLUENCE: (f64, f64) = (45.741, 4.818);

/// `n` photos at one location, months cycling through the whole year
fn uniform_photos(
    rng: &mut ChaCha8Rng,
    prefix: &str,
    at: (f64, f64),
    n: usize,
) -> Vec<PhotoRecord> {
    (0..n)
        .map(|i| {
            let year = rng.random_range(2012..=2021);
            PhotoRecord::new(format!("{}{}", prefix, i), at.0, at.1, year, (i % 12 + 1) as u8)
        })
        .collect()
}

/// `n` photos at one location, all taken in `month`
fn single_month_photos(
    rng: &mut ChaCha8Rng,
    prefix: &str,
    at: (f64, f64),
    n: usize,
    month: u8,
    years: std::ops::RangeInclusive<i32>,
) -> Vec<PhotoRecord> {
    (0..n)
        .map(|i| {
            let year = rng.random_range(years.clone());
            PhotoRecord::new(format!("{}{}", prefix, i), at.0, at.1, year, month)
        })
        .collect()
}

/// Three isolated photos, far from every location above but inside Lyon
fn scattered_photos() -> Vec<PhotoRecord> {
    vec![
        PhotoRecord::new("lone0", 45.60, 4.70, 2016, 3),
        PhotoRecord::new("lone1", 45.90, 5.05, 2017, 5),
        PhotoRecord::new("lone2", 45.60, 5.05, 2018, 9),
    ]
}

fn write_csv(path: &Path, records: &[PhotoRecord]) {
    let mut writer = csv::Writer::from_path(path).expect("Failed to create CSV");
    for record in records {
        writer.serialize(record).expect("Failed to write record");
    }
    writer.flush().expect("Failed to flush CSV");
}

/// Create test settings with progress bars disabled
fn create_test_settings(input: &Path, output: &Path) -> Settings {
    Settings {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        show_progress: false,
        algorithm: ClusteringAlgorithm::Hdbscan(Hdbscan::new(10)),
        ..Settings::default()
    }
}

fn read_json(path: &Path) -> serde_json::Value {
    let content = fs::read_to_string(path).expect("Failed to read JSON");
    serde_json::from_str(&content).expect("Invalid JSON")
}

/// Classification objects of `temporal_classifications.json`, largest cluster first
fn classifications(output_dir: &Path) -> Vec<serde_json::Value> {
    let json = read_json(&output_dir.join(files::CLASSIFICATIONS));
    let mut results: Vec<serde_json::Value> = json
        .as_object()
        .expect("Root should be an object")
        .values()
        .cloned()
        .collect();
    results.sort_by_key(|r| std::cmp::Reverse(r["stats"]["total_photos"].as_u64().unwrap()));
    results
}

fn two_location_records() -> Vec<PhotoRecord> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut records = uniform_photos(&mut rng, "p", OLD_TOWN, 1000);
    records.extend(single_month_photos(&mut rng, "d", PRESQU_ILE, 500, 12, 2012..=2021));
    records.extend(scattered_photos());
    records
}

#[test]
fn test_permanent_and_december_locations() {
    let input_dir = TempDir::new().expect("Failed to create input temp dir");
    let output_dir = TempDir::new().expect("Failed to create output temp dir");
    let input = input_dir.path().join("photos.csv");
    write_csv(&input, &two_location_records());

    let settings = create_test_settings(&input, output_dir.path());
    let result = pipeline::run_classify(&settings).expect("Pipeline failed");

    assert_eq!(result.total_records, 1503);
    assert_eq!(result.n_clusters, 2, "Should find both locations");
    assert_eq!(result.n_noise, 3, "Isolated photos should be noise");

    let results = classifications(output_dir.path());
    assert_eq!(results.len(), 2);

    let permanent = &results[0];
    assert_eq!(permanent["type"], "permanent");
    assert_eq!(permanent["stats"]["total_photos"], 1000);
    assert_eq!(permanent["stats"]["months_with_activity"], 12);
    assert!(permanent["stats"]["month_cv"].as_f64().unwrap() < 0.1);

    let recurring = &results[1];
    assert_eq!(recurring["type"], "recurring");
    assert_eq!(recurring["rule"], "december");
    assert_eq!(recurring["stats"]["total_photos"], 500);
    assert_eq!(recurring["stats"]["december_ratio"].as_f64().unwrap(), 1.0);
    assert_eq!(recurring["peaks"]["peak_months"], serde_json::json!([12]));
    let events: Vec<&str> = recurring["matched_events"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e.as_str())
        .collect();
    assert!(events.contains(&"Fête des Lumières"));
}

#[test]
fn test_classify_writes_every_artifact() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let input = input_dir.path().join("photos.csv");
    write_csv(&input, &two_location_records());

    let settings = create_test_settings(&input, output_dir.path());
    let result = pipeline::run_classify(&settings).expect("Pipeline failed");

    for name in [
        files::CLASSIFICATIONS,
        files::CLUSTERS,
        files::CLUSTERED_RECORDS,
        files::CLUSTERING_STATS,
        files::TEMPORAL_REPORT,
    ] {
        let path = output_dir.path().join(name);
        assert!(path.exists(), "{} should exist", name);
        assert!(result.written.contains(&path));
    }

    // No temp files left behind
    let leftovers: Vec<_> = fs::read_dir(output_dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == "tmp"))
        .collect();
    assert!(leftovers.is_empty());

    let clusters = read_json(&output_dir.path().join(files::CLUSTERS));
    assert_eq!(clusters["cluster_count"], 2);

    let stats = read_json(&output_dir.path().join(files::CLUSTERING_STATS));
    assert_eq!(stats["parameters"]["algorithm"], "hdbscan");
    assert_eq!(stats["n_clusters"], 2);
    assert_eq!(stats["n_noise"], 3);
    assert_eq!(stats["total_points"], 1503);

    let report = fs::read_to_string(output_dir.path().join(files::TEMPORAL_REPORT)).unwrap();
    assert!(report.contains("| Permanent place | 1 | 1000 |"));
    assert!(report.contains("| Recurring event | 1 | 500 |"));
}

#[test]
fn test_clustered_records_join_column() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let input = input_dir.path().join("photos.csv");
    let records = two_location_records();
    write_csv(&input, &records);

    let settings = create_test_settings(&input, output_dir.path());
    pipeline::run_classify(&settings).expect("Pipeline failed");

    let mut reader =
        csv::Reader::from_path(output_dir.path().join(files::CLUSTERED_RECORDS)).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.iter().last(), Some("cluster"));
    let cluster_col = headers.iter().position(|h| h == "cluster").unwrap();

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), records.len(), "One row per input record");
    for (row, record) in rows.iter().zip(&records) {
        assert_eq!(&row[0], record.id.as_str(), "Input order is preserved");
    }

    let labels: Vec<i32> = rows.iter().map(|r| r[cluster_col].parse().unwrap()).collect();
    assert_eq!(labels.iter().filter(|&&l| l == -1).count(), 3);
    assert!(labels[..1000].iter().all(|&l| l == labels[0] && l >= 0));
    assert!(labels[1000..1500].iter().all(|&l| l == labels[1000] && l >= 0));
    assert_ne!(labels[0], labels[1000]);
}

#[test]
fn test_single_month_location_is_one_time() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let input = input_dir.path().join("photos.csv");

    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut records = uniform_photos(&mut rng, "p", OLD_TOWN, 240);
    records.extend(single_month_photos(&mut rng, "e", CONFLUENCE, 50, 6, 2019..=2019));
    write_csv(&input, &records);

    let settings = create_test_settings(&input, output_dir.path());
    let result = pipeline::run_classify(&settings).expect("Pipeline failed");
    assert_eq!(result.n_clusters, 2);

    let results = classifications(output_dir.path());
    let one_time = &results[1];
    assert_eq!(one_time["stats"]["total_photos"], 50);
    assert_eq!(one_time["stats"]["peak_ratio"].as_f64().unwrap(), 1.0);
    assert_eq!(one_time["stats"]["months_with_activity"], 1);
    assert_eq!(one_time["stats"]["n_years"], 1);
    assert_eq!(one_time["type"], "one_time");
    assert_eq!(one_time["rule"], "single_spike");
}

#[test]
fn test_rows_outside_bbox_or_malformed_are_dropped() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let input = input_dir.path().join("photos.csv");

    let mut records = two_location_records();
    // Paris
    for i in 0..20 {
        records.push(PhotoRecord::new(format!("paris{}", i), 48.8566, 2.3522, 2018, 7));
    }
    // Month 13 fails validation
    records.push(PhotoRecord::new("bad", OLD_TOWN.0, OLD_TOWN.1, 2018, 13));
    write_csv(&input, &records);

    let settings = create_test_settings(&input, output_dir.path());
    let result = pipeline::run_classify(&settings).expect("Pipeline failed");
    assert_eq!(result.total_records, 1503);
    assert_eq!(result.n_clusters, 2);
}

#[test]
fn test_json_input_and_presampling() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let input = input_dir.path().join("photos.json");
    let file = fs::File::create(&input).unwrap();
    serde_json::to_writer(file, &two_location_records()).unwrap();

    let mut settings = create_test_settings(&input, output_dir.path());
    settings.sample = Some(600);
    let first = pipeline::run_classify(&settings).expect("Pipeline failed");
    assert_eq!(first.total_records, 600);

    let again = pipeline::run_classify(&settings).expect("Pipeline failed");
    assert_eq!(first.summary, again.summary, "Same seed, same sample");
}

#[test]
fn test_sweep_recommends_balanced_configuration() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let input = input_dir.path().join("photos.csv");

    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut records = uniform_photos(&mut rng, "a", OLD_TOWN, 200);
    records.extend(uniform_photos(&mut rng, "b", PRESQU_ILE, 200));
    records.extend(uniform_photos(&mut rng, "c", CONFLUENCE, 200));
    write_csv(&input, &records);

    let mut settings = create_test_settings(&input, output_dir.path());
    settings.grid =
        photospots::search::ParameterGrid::for_kind(photospots::spatial::AlgorithmKind::Dbscan);
    settings.grid.eps_values = vec![0.002, 0.004];
    settings.grid.min_samples = vec![5];

    let result = pipeline::run_sweep(&settings).expect("Sweep failed");
    assert_eq!(result.configurations, 2);
    assert!(result.warning.is_none());
    assert!(result.best.as_deref().unwrap().starts_with("dbscan(eps=0.002"));

    let mut reader =
        csv::Reader::from_path(output_dir.path().join(files::PARAMETER_SEARCH)).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);

    let best = read_json(&output_dir.path().join(files::BEST_PARAMS));
    assert_eq!(best["configurations_tested"], 2);
    assert_eq!(best["best"]["parameters"]["algorithm"], "dbscan");
    assert_eq!(best["best"]["n_clusters"], 3);
}

#[test]
fn test_sweep_without_recommendation() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let input = input_dir.path().join("photos.csv");
    write_csv(&input, &two_location_records());

    let mut settings = create_test_settings(&input, output_dir.path());
    settings.grid.min_cluster_sizes = vec![10, 20];

    let result = pipeline::run_sweep(&settings).expect("Sweep failed");
    assert!(result.best.is_none(), "Largest cluster holds two thirds of the photos");
    assert!(result.warning.is_some());

    let best = read_json(&output_dir.path().join(files::BEST_PARAMS));
    assert!(best["best"].is_null());
    assert!(best["warning"].is_string());
}

#[test]
fn test_invalid_grid_fails_before_loading() {
    let output_dir = TempDir::new().unwrap();
    let mut settings =
        create_test_settings(Path::new("/nonexistent/photos.csv"), output_dir.path());
    settings.grid.min_cluster_sizes = vec![];

    let err = pipeline::run_sweep(&settings).unwrap_err();
    assert!(matches!(err, photospots::PhotospotsError::InvalidParameter { .. }));
}

#[test]
fn test_compare_runs_every_algorithm() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let input = input_dir.path().join("photos.csv");

    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut records = uniform_photos(&mut rng, "a", OLD_TOWN, 150);
    records.extend(uniform_photos(&mut rng, "b", PRESQU_ILE, 150));
    records.extend(uniform_photos(&mut rng, "c", CONFLUENCE, 150));
    write_csv(&input, &records);

    let mut settings = create_test_settings(&input, output_dir.path());
    settings.comparison = vec![
        ClusteringAlgorithm::Hdbscan(Hdbscan::new(10)),
        ClusteringAlgorithm::Dbscan(Dbscan::new(0.005, 10)),
        ClusteringAlgorithm::KMeans(KMeans::new(3).with_seed(42)),
        ClusteringAlgorithm::Hierarchical(Agglomerative::new(3, Linkage::Ward)),
    ];

    let result = pipeline::run_compare(&settings).expect("Compare failed");
    assert_eq!(result.rows.len(), 4);
    for row in &result.rows {
        assert_eq!(row.n_clusters, 3, "{} should find the three locations", row.algorithm);
        assert_eq!(row.points, 450);
    }

    let mut reader =
        csv::Reader::from_path(output_dir.path().join(files::ALGORITHM_COMPARISON)).unwrap();
    let algorithms: Vec<String> = reader
        .records()
        .map(|r| r.unwrap()[0].to_string())
        .collect();
    assert_eq!(algorithms, vec!["hdbscan", "dbscan", "kmeans", "hierarchical"]);
}

#[test]
fn test_missing_input_is_an_error() {
    let output_dir = TempDir::new().unwrap();
    let settings = create_test_settings(Path::new("/nonexistent/photos.csv"), output_dir.path());
    assert!(pipeline::run_classify(&settings).is_err());
}
