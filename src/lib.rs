// UCIC Resolver - Core Library
// Exposes all modules for use in the CLI and tests

pub mod record;
pub mod normalizer;
pub mod validator;
pub mod similarity;
pub mod registry;
pub mod matcher;
pub mod deduplication;
pub mod config;         // JSON policy: thresholds, metric, strategy
pub mod loader;         // CSV / spreadsheet input
pub mod export;         // CSV / JSON output
pub mod pipeline;       // One batch run end to end

// Re-export commonly used types
pub use record::{BirthDate, PartyRecord, PartyType, RawPartyRow};
pub use normalizer::{normalize, normalize_all};
pub use validator::{
    assess, is_placeholder_primary_id, is_valid_primary_id,
    QualitySummary, RecordIssue, Severity,
};
pub use similarity::SimilarityMetric;
pub use registry::Registry;
pub use matcher::{resolve, MatchResult, MatchSummary, MatchTier, Matcher, Resolution};
pub use deduplication::{
    CancelToken, ClusterError, ClusterReport, ClusterStrategy,
    DeduplicationEngine, DuplicateCluster,
};
pub use config::{ClusterConfig, MatchConfig, ResolverConfig};
pub use loader::{load_party_rows, load_table, Table};
pub use pipeline::{run_batch, run_dedupe, run_files, run_matching, BatchReport, RunPaths};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
