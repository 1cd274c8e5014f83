// 📤 Export - Write results back out as CSV / JSON
//
//   matched_ucics.csv            incoming columns + matched_ucic, match_tier, match_score
//   unmatched_ucics.csv          incoming columns
//   person_cluster_001.csv ...   master columns + cluster_id, one file per cluster
//   run_summary.json             BatchReport without the per-record detail

use crate::deduplication::{ClusterReport, DuplicateCluster};
use crate::loader::Table;
use crate::matcher::{MatchResult, Resolution};
use anyhow::{Context, Result};
use csv::Writer;
use log::info;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub const MATCHED_FILE: &str = "matched_ucics.csv";
pub const UNMATCHED_FILE: &str = "unmatched_ucics.csv";
pub const SUMMARY_FILE: &str = "run_summary.json";

/// Write headers + rows to a CSV file
pub fn write_csv(path: &Path, headers: &[String], rows: &[Vec<String>]) -> Result<()> {
    let mut writer = Writer::from_path(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;

    writer
        .write_record(headers)
        .with_context(|| format!("Failed to write header to {}", path.display()))?;

    for row in rows {
        writer
            .write_record(row)
            .with_context(|| format!("Failed to write row to {}", path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(())
}

// ============================================================================
// MATCH EXPORT
// ============================================================================

/// Split the incoming table into matched / unmatched files.
/// Returns (matched path, unmatched path).
pub fn export_matches(out_dir: &Path, incoming: &Table, resolutions: &[Resolution]) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    let mut matched_headers = incoming.headers.clone();
    matched_headers.extend(["matched_ucic", "match_tier", "match_score"].map(String::from));

    let mut matched = Vec::new();
    let mut unmatched = Vec::new();

    for resolution in resolutions {
        let Some(cells) = incoming.rows.get(resolution.row) else {
            continue;
        };

        match &resolution.result {
            MatchResult::Resolved(ucic) => {
                let mut row = cells.clone();
                row.push(ucic.clone());
                row.push(resolution.tier.map(|t| t.as_str().to_string()).unwrap_or_default());
                row.push(resolution.score.map(|s| format!("{:.2}", s)).unwrap_or_default());
                matched.push(row);
            }
            MatchResult::Unresolved => unmatched.push(cells.clone()),
        }
    }

    let matched_path = out_dir.join(MATCHED_FILE);
    let unmatched_path = out_dir.join(UNMATCHED_FILE);

    write_csv(&matched_path, &matched_headers, &matched)?;
    write_csv(&unmatched_path, &incoming.headers, &unmatched)?;

    info!(
        "Wrote {} matched rows to {} and {} unmatched rows to {}",
        matched.len(),
        matched_path.display(),
        unmatched.len(),
        unmatched_path.display()
    );

    Ok((matched_path, unmatched_path))
}

// ============================================================================
// CLUSTER EXPORT
// ============================================================================

/// File name for the n-th (1-based) cluster of a party type
pub fn cluster_file_name(cluster: &DuplicateCluster, number: usize) -> String {
    format!("{}_cluster_{:03}.csv", cluster.party_type.slug(), number)
}

/// One CSV per cluster, numbered per party type in cluster order.
/// Member indices refer to rows of `master`.
pub fn export_clusters(out_dir: &Path, master: &Table, report: &ClusterReport) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    let mut headers = master.headers.clone();
    headers.push("cluster_id".to_string());

    let mut paths = Vec::new();

    for clusters in [&report.person, &report.organization] {
        for (n, cluster) in clusters.iter().enumerate() {
            let number = n + 1;
            let file_name = cluster_file_name(cluster, number);
            let cluster_id = file_name.trim_end_matches(".csv").to_string();

            let rows: Vec<Vec<String>> = cluster
                .members
                .iter()
                .filter_map(|&member| master.rows.get(member))
                .map(|cells| {
                    let mut row = cells.clone();
                    row.push(cluster_id.clone());
                    row
                })
                .collect();

            let path = out_dir.join(&file_name);
            write_csv(&path, &headers, &rows)?;
            paths.push(path);
        }
    }

    info!("Wrote {} cluster files to {}", paths.len(), out_dir.display());
    Ok(paths)
}

// ============================================================================
// SUMMARY
// ============================================================================

pub fn write_summary<T: Serialize>(out_dir: &Path, summary: &T) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    let path = out_dir.join(SUMMARY_FILE);
    let file = File::create(&path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;

    serde_json::to_writer_pretty(file, summary)
        .with_context(|| format!("Failed to write summary JSON to {}", path.display()))?;

    Ok(path)
}

// ============================================================================
// TESTS
// ============================================================================
