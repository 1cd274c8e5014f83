// 🔍 Deduplication Engine - Group likely-duplicate master records
//
// Candidates: master records of ONE party type that have no valid PAN.
// Two candidates are duplicates when both DOBs are known and equal AND their
// identity names score >= duplicate_threshold.
//
// Two strategies:
//   Transitive   union-find over every qualifying pair (order independent)
//   ForwardScan  single-pass greedy grouping around each seed, j > i only

use crate::config::ClusterConfig;
use crate::record::{PartyRecord, PartyType};
use crate::similarity::SimilarityMetric;
use chrono::NaiveDate;
use log::{debug, info};
use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

// ============================================================================
// CLUSTER STRATEGY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterStrategy {
    /// Connected components of the "is duplicate" graph
    #[default]
    Transitive,

    /// Seed i collects every later unconsumed j that matches the seed itself.
    /// A record similar only to a non-seed member is left out.
    ForwardScan,
}

// ============================================================================
// RESULTS + ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateCluster {
    pub party_type: PartyType,

    /// Indices into the master record list, ascending, at least two
    pub members: Vec<usize>,
}

impl DuplicateCluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Clusters for both partitions of one master registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterReport {
    pub person_candidates: usize,
    pub organization_candidates: usize,
    pub person: Vec<DuplicateCluster>,
    pub organization: Vec<DuplicateCluster>,
}

impl ClusterReport {
    pub fn all(&self) -> impl Iterator<Item = &DuplicateCluster> {
        self.person.iter().chain(self.organization.iter())
    }

    pub fn total_clusters(&self) -> usize {
        self.person.len() + self.organization.len()
    }

    /// Records that landed in some cluster
    pub fn total_members(&self) -> usize {
        self.all().map(DuplicateCluster::len).sum()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClusterError {
    #[error("clustering was cancelled")]
    Cancelled,

    #[error("clustering exceeded its deadline")]
    DeadlineExceeded,

    #[error("candidate {index} is {found} but the set is {expected}")]
    MixedPartyTypes {
        expected: PartyType,
        found: PartyType,
        index: usize,
    },

    #[error("candidate index {index} is out of range for {len} records")]
    CandidateOutOfRange { index: usize, len: usize },
}

// ============================================================================
// CANCELLATION
// ============================================================================

/// Shared cancel flag plus an optional deadline. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        CancelToken {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: timeout.map(|t| Instant::now() + t),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn check(&self) -> Result<(), ClusterError> {
        if self.is_cancelled() {
            return Err(ClusterError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(ClusterError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

// ============================================================================
// DEDUPLICATION ENGINE
// ============================================================================

pub struct DeduplicationEngine {
    /// Minimum name score for a duplicate pair (default: 85)
    pub duplicate_threshold: f64,

    pub metric: SimilarityMetric,

    pub strategy: ClusterStrategy,

    /// Applied by `cluster_registry` (default: none)
    pub timeout: Option<Duration>,
}

impl DeduplicationEngine {
    /// Create engine with default thresholds
    pub fn new() -> Self {
        Self::from_config(&ClusterConfig::default())
    }

    pub fn from_config(config: &ClusterConfig) -> Self {
        DeduplicationEngine {
            duplicate_threshold: config.duplicate_threshold,
            metric: config.metric,
            strategy: config.strategy,
            timeout: config.timeout(),
        }
    }

    /// Indices of records of `party_type` without a valid PAN, ascending
    pub fn cluster_candidates(records: &[PartyRecord], party_type: PartyType) -> Vec<usize> {
        records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.party_type == party_type && r.valid_primary_id().is_none())
            .map(|(i, _)| i)
            .collect()
    }

    /// Score of a qualifying pair, None when the pair is not a duplicate
    pub fn duplicate_score(&self, a: &PartyRecord, b: &PartyRecord) -> Option<f64> {
        let dob = a.date_of_birth.known()?;
        if b.date_of_birth.known() != Some(dob) {
            return None;
        }

        let score = self.metric.score(&a.identity_name(), &b.identity_name());
        if score >= self.duplicate_threshold {
            Some(score)
        } else {
            None
        }
    }

    /// Cluster one homogeneous candidate set.
    /// `candidates` index into `records`; order is the scan order for ForwardScan.
    /// Every index is checked up front: an index past the end gives
    /// `CandidateOutOfRange`, a second party type gives `MixedPartyTypes`.
    pub fn find_clusters(
        &self,
        records: &[PartyRecord],
        candidates: &[usize],
        token: &CancelToken,
    ) -> Result<Vec<DuplicateCluster>, ClusterError> {
        token.check()?;

        let mut party_type = None;
        for &index in candidates {
            let found = records
                .get(index)
                .ok_or(ClusterError::CandidateOutOfRange { index, len: records.len() })?
                .party_type;

            match party_type {
                None => party_type = Some(found),
                Some(expected) if expected != found => {
                    return Err(ClusterError::MixedPartyTypes { expected, found, index });
                }
                Some(_) => {}
            }
        }

        let party_type = match party_type {
            Some(party_type) => party_type,
            None => return Ok(Vec::new()),
        };

        let groups = match self.strategy {
            ClusterStrategy::Transitive => self.transitive(records, candidates, token)?,
            ClusterStrategy::ForwardScan => self.forward_scan(records, candidates, token)?,
        };

        let mut clusters: Vec<DuplicateCluster> = groups
            .into_iter()
            .filter(|members| members.len() > 1)
            .map(|mut members| {
                members.sort_unstable();
                DuplicateCluster { party_type, members }
            })
            .collect();
        clusters.sort_by_key(|c| c.members[0]);

        debug!(
            "{} {} clusters from {} candidates ({:?})",
            clusters.len(),
            party_type.slug(),
            candidates.len(),
            self.strategy
        );

        Ok(clusters)
    }

    /// Cluster both partitions of the master record list
    pub fn cluster_registry(&self, records: &[PartyRecord]) -> Result<ClusterReport, ClusterError> {
        let token = CancelToken::with_timeout(self.timeout);
        self.cluster_registry_with(records, &token)
    }

    pub fn cluster_registry_with(
        &self,
        records: &[PartyRecord],
        token: &CancelToken,
    ) -> Result<ClusterReport, ClusterError> {
        let persons = Self::cluster_candidates(records, PartyType::Person);
        let organizations = Self::cluster_candidates(records, PartyType::Organization);

        let report = ClusterReport {
            person_candidates: persons.len(),
            organization_candidates: organizations.len(),
            person: self.find_clusters(records, &persons, token)?,
            organization: self.find_clusters(records, &organizations, token)?,
        };

        info!(
            "Clustering done: {} person / {} organization clusters ({} records)",
            report.person.len(),
            report.organization.len(),
            report.total_members()
        );

        Ok(report)
    }

    // ========================================================================
    // STRATEGIES
    // ========================================================================

    /// Union every qualifying pair inside each DOB block.
    fn transitive(
        &self,
        records: &[PartyRecord],
        candidates: &[usize],
        token: &CancelToken,
    ) -> Result<Vec<Vec<usize>>, ClusterError> {
        // DOB → local candidate slots, ascending
        let mut blocks: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
        for (slot, &index) in candidates.iter().enumerate() {
            if let Some(dob) = records[index].date_of_birth.known() {
                blocks.entry(dob).or_default().push(slot);
            }
        }

        let mut sets = UnionFind::<usize>::new(candidates.len());

        for block in blocks.values() {
            for (n, &a) in block.iter().enumerate() {
                token.check()?;
                let left = &records[candidates[a]];
                for &b in &block[n + 1..] {
                    if self.duplicate_score(left, &records[candidates[b]]).is_some() {
                        sets.union(a, b);
                    }
                }
            }
        }

        let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (slot, &index) in candidates.iter().enumerate() {
            components.entry(sets.find(slot)).or_default().push(index);
        }

        Ok(components.into_values().collect())
    }

    /// Greedy seed-and-scan; consumed records never seed or join again.
    fn forward_scan(
        &self,
        records: &[PartyRecord],
        candidates: &[usize],
        token: &CancelToken,
    ) -> Result<Vec<Vec<usize>>, ClusterError> {
        let mut consumed: HashSet<usize> = HashSet::new();
        let mut groups = Vec::new();

        for (n, &seed) in candidates.iter().enumerate() {
            token.check()?;
            if consumed.contains(&seed) {
                continue;
            }

            let mut group = vec![seed];
            for &other in &candidates[n + 1..] {
                if consumed.contains(&other) {
                    continue;
                }
                if self.duplicate_score(&records[seed], &records[other]).is_some() {
                    group.push(other);
                    consumed.insert(other);
                }
            }

            if group.len() > 1 {
                consumed.insert(seed);
                groups.push(group);
            }
        }

        Ok(groups)
    }
}

impl Default for DeduplicationEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
