// ⚙️ Resolver Configuration - Policy as data
//
// Thresholds are policy, not constants. Every field has a default, so an
// empty JSON object (or no file at all) gives the standard behavior:
//
//   {
//     "matching":   { "name_threshold": 90, "organization_threshold": 90, "metric": "indel" },
//     "clustering": { "duplicate_threshold": 85, "metric": "jaro_winkler", "strategy": "transitive" }
//   }

use crate::deduplication::ClusterStrategy;
use crate::similarity::SimilarityMetric;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// MATCHING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Minimum score (0-100) for the fuzzy person-name tier
    pub name_threshold: f64,

    /// Minimum score (0-100) for the fuzzy organization-name tier
    pub organization_threshold: f64,

    pub metric: SimilarityMetric,

    /// Fan out over incoming records on the rayon pool
    pub parallel: bool,

    /// Log a progress line every N resolved records (0 = never)
    pub progress_interval: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            name_threshold: 90.0,
            organization_threshold: 90.0,
            metric: SimilarityMetric::default(),
            parallel: true,
            progress_interval: 5000,
        }
    }
}

// ============================================================================
// CLUSTERING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Minimum score (0-100) for two records to be duplicates
    pub duplicate_threshold: f64,

    pub metric: SimilarityMetric,

    pub strategy: ClusterStrategy,

    /// Give up clustering after this many seconds (None = no limit)
    pub timeout_secs: Option<u64>,
}

impl ClusterConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        ClusterConfig {
            duplicate_threshold: 85.0,
            // Indel puts JOHN SMITH / JON SMYTH at 84.2, under the 85 cut
            metric: SimilarityMetric::JaroWinkler,
            strategy: ClusterStrategy::default(),
            timeout_secs: None,
        }
    }
}

// ============================================================================
// RESOLVER CONFIG
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub matching: MatchConfig,
    pub clustering: ClusterConfig,
}

impl ResolverConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: ResolverConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        config.validate()?;
        Ok(config)
    }

    /// Load from file when given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    /// Thresholds are scores on a 0-100 scale
    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            ("matching.name_threshold", self.matching.name_threshold),
            ("matching.organization_threshold", self.matching.organization_threshold),
            ("clustering.duplicate_threshold", self.clustering.duplicate_threshold),
        ];

        for (name, value) in thresholds {
            if !(0.0..=100.0).contains(&value) {
                bail!("{} must be between 0 and 100, got {}", name, value);
            }
        }

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();

        assert_eq!(config.matching.name_threshold, 90.0);
        assert_eq!(config.matching.organization_threshold, 90.0);
        assert_eq!(config.matching.metric, SimilarityMetric::Indel);
        assert_eq!(config.clustering.duplicate_threshold, 85.0);
        assert_eq!(config.clustering.metric, SimilarityMetric::JaroWinkler);
        assert_eq!(config.clustering.strategy, ClusterStrategy::Transitive);
        assert_eq!(config.clustering.timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: ResolverConfig = serde_json::from_str(
            r#"{ "clustering": { "strategy": "forward_scan", "timeout_secs": 30 } }"#,
        )
        .unwrap();

        assert_eq!(config.clustering.strategy, ClusterStrategy::ForwardScan);
        assert_eq!(config.clustering.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.clustering.duplicate_threshold, 85.0);
        assert_eq!(config.matching, MatchConfig::default());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "matching": {{ "name_threshold": 92.5, "metric": "jaro_winkler", "parallel": false }} }}"#
        )
        .unwrap();

        let config = ResolverConfig::from_file(file.path()).unwrap();

        assert_eq!(config.matching.name_threshold, 92.5);
        assert_eq!(config.matching.metric, SimilarityMetric::JaroWinkler);
        assert!(!config.matching.parallel);
        assert_eq!(config.matching.organization_threshold, 90.0);
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "clustering": {{ "duplicate_threshold": 185 }} }}"#).unwrap();

        let err = ResolverConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("duplicate_threshold"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(ResolverConfig::from_file("/nonexistent/ucic-config.json").is_err());
        assert!(ResolverConfig::load(None).is_ok());
    }
}
