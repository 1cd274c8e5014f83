// 🚀 Pipeline - One batch run end to end
//
// load → normalize → validate → match → cluster → export
//
// The core steps (run_matching, run_dedupe) work on records in memory;
// run_files wraps them with the loader and the exporters.

use crate::config::{ClusterConfig, MatchConfig, ResolverConfig};
use crate::deduplication::{ClusterError, ClusterReport, DeduplicationEngine};
use crate::export;
use crate::loader::{load_party_rows, Table};
use crate::matcher::{MatchSummary, Matcher, Resolution};
use crate::normalizer::normalize_all;
use crate::record::{PartyRecord, RawPartyRow};
use crate::registry::Registry;
use crate::validator::QualitySummary;
use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub records: usize,
    pub persons: usize,
    pub organizations: usize,
    /// Master rows without a UCIC, never returned by matching
    pub unassigned: usize,
}

impl RegistryStats {
    fn from_registry(registry: &Registry) -> Self {
        RegistryStats {
            records: registry.len(),
            persons: registry.person_count(),
            organizations: registry.organization_count(),
            unassigned: registry.unassigned_count(),
        }
    }
}

/// Everything one run produced. Serialized (minus resolutions) as run_summary.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub config: ResolverConfig,

    pub master_quality: QualitySummary,
    pub incoming_quality: Option<QualitySummary>,
    pub registry: Option<RegistryStats>,

    pub matching: Option<MatchSummary>,
    pub clustering: Option<ClusterReport>,

    /// Output files written by `run_files`
    pub outputs: Vec<PathBuf>,

    #[serde(skip)]
    pub resolutions: Vec<Resolution>,
}

impl BatchReport {
    fn start(config: &ResolverConfig, master: &[PartyRecord]) -> Self {
        BatchReport {
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            config: config.clone(),
            master_quality: QualitySummary::from_records(master, true),
            incoming_quality: None,
            registry: None,
            matching: None,
            clustering: None,
            outputs: Vec::new(),
            resolutions: Vec::new(),
        }
    }
}

// ============================================================================
// CORE STEPS
// ============================================================================

/// Resolve every incoming record against a registry built from `master`.
pub fn run_matching(
    master: &[PartyRecord],
    incoming: &[PartyRecord],
    config: &MatchConfig,
) -> (Vec<Resolution>, MatchSummary, RegistryStats) {
    let registry = Registry::build(master.to_vec());
    let stats = RegistryStats::from_registry(&registry);

    info!(
        "Matching {} incoming records against {} registry records",
        incoming.len(),
        registry.len()
    );

    let matcher = Matcher::new(&registry, config.clone());
    let resolutions = matcher.resolve_batch(incoming);
    let summary = MatchSummary::from_resolutions(&resolutions);

    info!(
        "Matched {} / {} (PAN {}, Aadhar {}, name {}, org {})",
        summary.resolved,
        summary.total,
        summary.by_primary_id,
        summary.by_secondary_id,
        summary.by_name,
        summary.by_organization
    );

    (resolutions, summary, stats)
}

/// Cluster the master records. Member indices are positions in `master`.
pub fn run_dedupe(master: &[PartyRecord], config: &ClusterConfig) -> Result<ClusterReport, ClusterError> {
    DeduplicationEngine::from_config(config).cluster_registry(master)
}

/// Run one batch over raw rows. `incoming = None` skips matching.
pub fn run_batch(
    master_rows: &[RawPartyRow],
    incoming_rows: Option<&[RawPartyRow]>,
    dedupe: bool,
    config: &ResolverConfig,
) -> Result<BatchReport> {
    let master = normalize_all(master_rows);
    let mut report = BatchReport::start(config, &master);
    log_quality("Master", &report.master_quality);

    if let Some(rows) = incoming_rows {
        let incoming = normalize_all(rows);
        let quality = QualitySummary::from_records(&incoming, false);
        log_quality("Incoming", &quality);

        let (resolutions, summary, stats) = run_matching(&master, &incoming, &config.matching);
        report.incoming_quality = Some(quality);
        report.registry = Some(stats);
        report.matching = Some(summary);
        report.resolutions = resolutions;
    }

    if dedupe {
        report.clustering = Some(run_dedupe(&master, &config.clustering)?);
    }

    report.finished_at = Utc::now();
    Ok(report)
}

fn log_quality(label: &str, quality: &QualitySummary) {
    if quality.malformed_primary_id + quality.placeholder_primary_id > 0 {
        warn!("{}: {}", label, quality.summary());
    } else {
        info!("{}: {}", label, quality.summary());
    }
}

// ============================================================================
// FILE RUN
// ============================================================================

pub struct RunPaths<'a> {
    pub master: &'a Path,
    pub incoming: Option<&'a Path>,
    pub out_dir: &'a Path,
    pub dedupe: bool,
}

/// Load, run, export. Returns the report with `outputs` filled in.
pub fn run_files(paths: &RunPaths<'_>, config: &ResolverConfig) -> Result<BatchReport> {
    let (master_table, master_rows) = load_party_rows(paths.master)?;

    let incoming: Option<(Table, Vec<RawPartyRow>)> = match paths.incoming {
        Some(path) => Some(load_party_rows(path)?),
        None => None,
    };

    let mut report = run_batch(
        &master_rows,
        incoming.as_ref().map(|(_, rows)| rows.as_slice()),
        paths.dedupe,
        config,
    )?;

    if let Some((incoming_table, _)) = &incoming {
        let (matched, unmatched) = export::export_matches(paths.out_dir, incoming_table, &report.resolutions)?;
        report.outputs.push(matched);
        report.outputs.push(unmatched);
    }

    if let Some(clusters) = &report.clustering {
        let cluster_files = export::export_clusters(paths.out_dir, &master_table, clusters)?;
        report.outputs.extend(cluster_files);
    }

    let summary_path = paths.out_dir.join(export::SUMMARY_FILE);
    report.outputs.push(summary_path);
    export::write_summary(paths.out_dir, &report)?;

    Ok(report)
}

// ============================================================================
// TESTS
// ============================================================================
