//! Markdown summary of a temporal classification run

use super::write_atomic;
use crate::config::AnalysisConfig;
use crate::error::{PhotospotsError, Result};
use crate::temporal::classifier::{DEFAULT_LABEL, DEFAULT_RULE};
use crate::temporal::{ClassificationResult, ClassificationSummary, TemporalLabel, RULES};
use crate::types::{month_name, ClusterLabel};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;
use tracing::info;

/// December share above which a cluster is listed as a December spike
const NOTABLE_DECEMBER_RATIO: f64 = 0.20;
/// July+August share above which a cluster is listed as a summer peak
const NOTABLE_SUMMER_RATIO: f64 = 0.25;
/// Rows per notable-cluster table
const NOTABLE_LIMIT: usize = 10;

fn label_title(label: TemporalLabel) -> &'static str {
    match label {
        TemporalLabel::Permanent => "Permanent place",
        TemporalLabel::Recurring => "Recurring event",
        TemporalLabel::OneTime => "One-time event",
    }
}

/// Clusters whose `ratio` exceeds `threshold`, highest first, cluster id breaking ties
fn notable<'a>(
    results: &'a BTreeMap<ClusterLabel, ClassificationResult>,
    ratio: impl Fn(&ClassificationResult) -> f64,
    threshold: f64,
) -> Vec<(ClusterLabel, f64, &'a ClassificationResult)> {
    let mut picked: Vec<_> = results
        .iter()
        .map(|(&id, r)| (id, ratio(r), r))
        .filter(|&(_, value, _)| value > threshold)
        .collect();
    picked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    picked.truncate(NOTABLE_LIMIT);
    picked
}

fn months_label(months: &[u8]) -> String {
    months
        .iter()
        .map(|&m| month_name(m))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render the report
pub fn render_temporal_report(
    results: &BTreeMap<ClusterLabel, ClassificationResult>,
    config: &AnalysisConfig,
) -> String {
    let summary = ClassificationSummary::from_results(results);
    let total_photos = summary.total_photos();
    let share = |count: usize| {
        if total_photos > 0 {
            count as f64 / total_photos as f64 * 100.0
        } else {
            0.0
        }
    };

    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = writeln!(out, "# Temporal classification report\n");
    let _ = writeln!(
        out,
        "Generated {} by photospots {}\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        env!("CARGO_PKG_VERSION")
    );
    let _ = writeln!(out, "- Clusters classified: {}", results.len());
    let _ = writeln!(out, "- Clustered photos: {}\n", total_photos);

    let _ = writeln!(out, "## Classification\n");
    let _ = writeln!(out, "| Type | Clusters | Photos | Share of photos |");
    let _ = writeln!(out, "|------|---------:|-------:|----------------:|");
    for label in TemporalLabel::ALL {
        let photos = summary.photo_count(label);
        let _ = writeln!(
            out,
            "| {} | {} | {} | {:.1}% |",
            label_title(label),
            summary.cluster_count(label),
            photos,
            share(photos)
        );
    }

    let sections: [(&str, &str, f64, fn(&ClassificationResult) -> f64); 2] = [
        (
            "December spikes",
            "December share",
            NOTABLE_DECEMBER_RATIO,
            |r| r.stats.december_ratio,
        ),
        (
            "Summer peaks",
            "July-August share",
            NOTABLE_SUMMER_RATIO,
            |r| r.stats.summer_ratio,
        ),
    ];
    for (title, column, threshold, ratio) in sections {
        let rows = notable(results, ratio, threshold);
        let _ = writeln!(out, "\n## {} (share above {:.0}%)\n", title, threshold * 100.0);
        if rows.is_empty() {
            let _ = writeln!(out, "No cluster qualifies.");
            continue;
        }
        let _ = writeln!(out, "| Cluster | {} | Photos | Type | Matched events |", column);
        let _ = writeln!(out, "|--------:|------:|-------:|------|----------------|");
        for (id, value, result) in rows {
            let _ = writeln!(
                out,
                "| {} | {:.1}% | {} | {} | {} |",
                id,
                value * 100.0,
                result.stats.total_photos,
                result.label,
                result.matched_events.join(", ")
            );
        }
    }

    let _ = writeln!(out, "\n## Rules\n");
    let _ = writeln!(out, "Evaluated in order; the first matching rule decides.\n");
    for (i, rule) in RULES.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. `{}`: {} → {}",
            i + 1,
            rule.name,
            rule.condition,
            rule.label
        );
    }
    let _ = writeln!(
        out,
        "{}. `{}`: otherwise → {}",
        RULES.len() + 1,
        DEFAULT_RULE,
        DEFAULT_LABEL
    );
    let _ = writeln!(
        out,
        "\nConditions show the default thresholds. Peak months are bins whose z-score exceeds {}.",
        config.peaks.monthly
    );

    let _ = writeln!(out, "\n## Known events\n");
    let _ = writeln!(out, "| Event | Months | Description |");
    let _ = writeln!(out, "|-------|--------|-------------|");
    for event in &config.known_events {
        let _ = writeln!(
            out,
            "| {} | {} | {} |",
            event.name,
            months_label(&event.months),
            event.description
        );
    }

    out
}

/// Write `temporal_report.md`
pub fn write_temporal_report(
    results: &BTreeMap<ClusterLabel, ClassificationResult>,
    config: &AnalysisConfig,
    output_path: &Path,
) -> Result<()> {
    let report = render_temporal_report(results, config);
    write_atomic(output_path, |writer| {
        writer
            .write_all(report.as_bytes())
            .map_err(|e| PhotospotsError::output_error(output_path, e))
    })?;
    info!("Wrote temporal report to {}", output_path.display());
    Ok(())
}
