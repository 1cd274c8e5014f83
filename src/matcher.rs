// 🔗 Matcher - Resolve incoming records against the master registry
//
// Tiers, strictly in order; the first tier with a qualifying candidate wins:
//   1. Primary ID   valid PAN, exact, whole registry (any party type)
//   2. Secondary ID PERSON, same known DOB, same Aadhar suffix
//   3. Fuzzy name   PERSON, same known DOB, best "FIRST LAST" score >= threshold
//   4. Fuzzy org    ORGANIZATION, same known DOB, best org-name score >= threshold
//
// Ties always go to the smallest registry position.

use crate::config::MatchConfig;
use crate::record::{PartyRecord, PartyType};
use crate::registry::Registry;
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

// ============================================================================
// RESULT TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    Resolved(String),
    Unresolved,
}

impl MatchResult {
    pub fn is_resolved(&self) -> bool {
        matches!(self, MatchResult::Resolved(_))
    }

    pub fn ucic(&self) -> Option<&str> {
        match self {
            MatchResult::Resolved(ucic) => Some(ucic),
            MatchResult::Unresolved => None,
        }
    }
}

/// Which tier produced a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchTier {
    PrimaryId,
    SecondaryId,
    FuzzyName,
    FuzzyOrganization,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::PrimaryId => "PAN",
            MatchTier::SecondaryId => "AADHAR+DOB",
            MatchTier::FuzzyName => "NAME+DOB",
            MatchTier::FuzzyOrganization => "ORG+DOB",
        }
    }
}

/// Outcome for one incoming record, keyed by its source row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub row: usize,
    pub fingerprint: String,
    pub result: MatchResult,

    /// None when unresolved
    pub tier: Option<MatchTier>,

    /// Similarity score, fuzzy tiers only
    pub score: Option<f64>,
}

struct Hit {
    pos: usize,
    tier: MatchTier,
    score: Option<f64>,
}

// ============================================================================
// MATCHER
// ============================================================================

pub struct Matcher<'a> {
    registry: &'a Registry,
    config: MatchConfig,
}

impl<'a> Matcher<'a> {
    pub fn new(registry: &'a Registry, config: MatchConfig) -> Self {
        Matcher { registry, config }
    }

    pub fn with_defaults(registry: &'a Registry) -> Self {
        Self::new(registry, MatchConfig::default())
    }

    /// Resolve a single record
    pub fn resolve(&self, record: &PartyRecord) -> MatchResult {
        self.resolve_traced(record).result
    }

    /// Resolve a single record, keeping tier and score
    pub fn resolve_traced(&self, record: &PartyRecord) -> Resolution {
        let hit = self.find(record);

        let (result, tier, score) = match hit {
            Some(hit) => {
                let ucic = self.registry.records()[hit.pos].unique_customer_id.clone();
                debug!(
                    "row {} → {} via {}{}",
                    record.row,
                    ucic,
                    hit.tier.as_str(),
                    hit.score.map(|s| format!(" ({:.1})", s)).unwrap_or_default()
                );
                (MatchResult::Resolved(ucic), Some(hit.tier), hit.score)
            }
            None => {
                debug!("row {} unresolved", record.row);
                (MatchResult::Unresolved, None, None)
            }
        };

        Resolution {
            row: record.row,
            fingerprint: record.fingerprint(),
            result,
            tier,
            score,
        }
    }

    /// Resolve a whole batch. Output order = input order.
    ///
    /// The registry is shared read-only, so records fan out over the rayon
    /// pool without locks when `parallel` is on.
    pub fn resolve_batch(&self, batch: &[PartyRecord]) -> Vec<Resolution> {
        let done = AtomicUsize::new(0);
        let total = batch.len();

        let resolve_one = |record: &PartyRecord| {
            let resolution = self.resolve_traced(record);
            self.report_progress(&done, total);
            resolution
        };

        if self.config.parallel {
            batch.par_iter().map(resolve_one).collect()
        } else {
            batch.iter().map(resolve_one).collect()
        }
    }

    fn report_progress(&self, done: &AtomicUsize, total: usize) {
        let count = done.fetch_add(1, Ordering::Relaxed) + 1;
        let interval = self.config.progress_interval;
        if interval > 0 && count % interval == 0 {
            info!("Processed {}/{} records...", count, total);
        }
    }

    // ========================================================================
    // TIERS
    // ========================================================================

    fn find(&self, record: &PartyRecord) -> Option<Hit> {
        if let Some(hit) = self.primary_id_tier(record) {
            return Some(hit);
        }

        match record.party_type {
            PartyType::Person => {
                let candidates = self.registry.dob_block(PartyType::Person, &record.date_of_birth);
                if candidates.is_empty() {
                    return None;
                }

                self.secondary_id_tier(record, candidates).or_else(|| {
                    self.best_fuzzy(
                        &record.full_name(),
                        candidates,
                        |r| r.full_name(),
                        self.config.name_threshold,
                        MatchTier::FuzzyName,
                    )
                })
            }
            PartyType::Organization => {
                if record.organization_name.is_empty() {
                    return None;
                }
                let candidates =
                    self.registry.dob_block(PartyType::Organization, &record.date_of_birth);

                self.best_fuzzy(
                    &record.organization_name,
                    candidates,
                    |r| r.organization_name.clone(),
                    self.config.organization_threshold,
                    MatchTier::FuzzyOrganization,
                )
            }
        }
    }

    fn primary_id_tier(&self, record: &PartyRecord) -> Option<Hit> {
        let pan = record.valid_primary_id()?;
        self.registry.find_by_primary_id(pan).map(|pos| Hit {
            pos,
            tier: MatchTier::PrimaryId,
            score: None,
        })
    }

    fn secondary_id_tier(&self, record: &PartyRecord, candidates: &[usize]) -> Option<Hit> {
        if record.secondary_id_suffix.is_empty() {
            return None;
        }

        let records = self.registry.records();
        candidates
            .iter()
            .copied()
            .find(|&pos| records[pos].secondary_id_suffix == record.secondary_id_suffix)
            .map(|pos| Hit {
                pos,
                tier: MatchTier::SecondaryId,
                score: None,
            })
    }

    /// Highest-scoring candidate; an equal later score never replaces it.
    fn best_fuzzy<F>(
        &self,
        query: &str,
        candidates: &[usize],
        name_of: F,
        threshold: f64,
        tier: MatchTier,
    ) -> Option<Hit>
    where
        F: Fn(&PartyRecord) -> String,
    {
        let records = self.registry.records();
        let mut best: Option<(usize, f64)> = None;

        for &pos in candidates {
            let score = self.config.metric.score(query, &name_of(&records[pos]));
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((pos, score)),
            }
        }

        best.filter(|(_, score)| *score >= threshold).map(|(pos, score)| Hit {
            pos,
            tier,
            score: Some(score),
        })
    }
}

/// Resolve one record with the default thresholds
pub fn resolve(record: &PartyRecord, registry: &Registry) -> MatchResult {
    Matcher::with_defaults(registry).resolve(record)
}

// ============================================================================
// SUMMARY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub total: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub by_primary_id: usize,
    pub by_secondary_id: usize,
    pub by_name: usize,
    pub by_organization: usize,
}

impl MatchSummary {
    pub fn from_resolutions(resolutions: &[Resolution]) -> Self {
        let mut summary = MatchSummary {
            total: resolutions.len(),
            ..Default::default()
        };

        for resolution in resolutions {
            match resolution.tier {
                Some(MatchTier::PrimaryId) => summary.by_primary_id += 1,
                Some(MatchTier::SecondaryId) => summary.by_secondary_id += 1,
                Some(MatchTier::FuzzyName) => summary.by_name += 1,
                Some(MatchTier::FuzzyOrganization) => summary.by_organization += 1,
                None => {}
            }
            if resolution.result.is_resolved() {
                summary.resolved += 1;
            } else {
                summary.unresolved += 1;
            }
        }

        summary
    }
}

// ============================================================================
// TESTS
// ============================================================================
