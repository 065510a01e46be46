use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::catalog::{CatalogEntry, CatalogIndex};
use crate::config::MatchPolicy;
use crate::error::Error;
use crate::matcher::{MatchCandidate, MatchMethod, MatchOutcome, Matcher, Resolution};
use crate::model::LocalItem;
use crate::normalize::Variant;
use crate::progress::ProgressReporter;
use crate::store::{ItemKey, OverrideRecord, ReconciliationStore, StoreState, UnresolvedRecord};

#[derive(Debug, Default, Clone)]
pub struct SessionStats {
    pub total: usize,
    pub overridden: usize,
    pub fingerprint_matched: usize,
    pub auto_accepted: usize,
    pub unresolved: usize,
    pub by_category: BTreeMap<String, CategoryStats>,
}

/// Per-system breakdown of one batch.
#[derive(Debug, Default, Clone, Copy)]
pub struct CategoryStats {
    pub total: usize,
    pub resolved: usize,
    pub variants: usize,
}

#[derive(Debug, Clone)]
pub struct ResolvedItem {
    pub item: LocalItem,
    pub resolution: Resolution,
}

/// Final partition of one matching batch.
#[derive(Debug)]
pub struct SessionOutcome {
    pub resolved: Vec<ResolvedItem>,
    /// Keys of every unresolved entry after the batch, prior failures
    /// included.
    pub unresolved_keys: Vec<String>,
    /// Set when the session ran with no catalog entries at all; every item
    /// was routed to the unresolved set rather than matched against
    /// nothing.
    pub catalog_empty: bool,
    pub stats: SessionStats,
}

/// A human decision on one unresolved item, handed back by whatever
/// front-end drives the review. The core never prompts.
#[derive(Debug, Clone)]
pub enum ReviewDecision {
    /// Accept a ranked candidate or a free-text search result.
    Accept(CatalogEntry),
    Skip,
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionApplied {
    Recorded,
    Skipped,
    Aborted,
}

/// Drives a batch of local items through the matcher and the reconciliation
/// store: applies override/fingerprint/name precedence, auto-accepts what
/// the policy allows, folds the rest into the persistent unresolved set.
///
/// One session, one catalog snapshot, processed sequentially. Store files
/// are only written once a decision is final: at batch end for automatic
/// matching, per accepted decision during review.
pub struct MatchSession {
    index: CatalogIndex,
    policy: MatchPolicy,
    store: ReconciliationStore,
    state: StoreState,
}

impl MatchSession {
    pub fn new(
        index: CatalogIndex,
        policy: MatchPolicy,
        store: ReconciliationStore,
    ) -> Result<Self, Error> {
        let state = store.load()?;
        Ok(MatchSession {
            index,
            policy,
            store,
            state,
        })
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn run(
        &mut self,
        items: &[LocalItem],
        reporter: &dyn ProgressReporter,
    ) -> Result<SessionOutcome, Error> {
        let catalog_empty = self.index.is_empty();
        if catalog_empty {
            warn!("Catalog is empty; all {} items go to the unresolved set", items.len());
        }

        reporter.on_match_start(items.len());

        let mut resolved = Vec::new();
        let mut fresh_unresolved: BTreeMap<String, UnresolvedRecord> = BTreeMap::new();
        let mut stats = SessionStats {
            total: items.len(),
            ..SessionStats::default()
        };

        let matcher = Matcher::new(&self.index, &self.state.overrides, &self.policy);
        for (done, item) in items.iter().enumerate() {
            let category = stats.by_category.entry(item.category.clone()).or_default();
            category.total += 1;
            if item.variant != Variant::Canonical {
                category.variants += 1;
            }

            match matcher.match_item(item) {
                MatchOutcome::Resolved(resolution) => {
                    match resolution.method {
                        MatchMethod::Override => stats.overridden += 1,
                        MatchMethod::ExactFingerprint => stats.fingerprint_matched += 1,
                        MatchMethod::NameSimilarity => {}
                    }
                    category.resolved += 1;
                    resolved.push(ResolvedItem {
                        item: item.clone(),
                        resolution,
                    });
                }
                MatchOutcome::Candidates(candidates) => {
                    if let Some(best) = matcher.auto_accept(&candidates) {
                        stats.auto_accepted += 1;
                        category.resolved += 1;
                        resolved.push(ResolvedItem {
                            item: item.clone(),
                            resolution: Resolution {
                                entry: best.entry.clone(),
                                method: best.method,
                                confidence: best.confidence(),
                                reresolution_offers: Vec::new(),
                            },
                        });
                    } else {
                        let key = ItemKey::for_item(item).to_string();
                        fresh_unresolved.insert(key, UnresolvedRecord::from_item(item));
                    }
                }
            }
            reporter.on_match_progress(done + 1, items.len());
        }

        ReconciliationStore::merge_unresolved(&mut self.state.unresolved, fresh_unresolved);
        self.store.save(&self.state)?;

        stats.unresolved = self.state.unresolved.len();
        reporter.on_match_complete(resolved.len(), stats.unresolved);
        info!(
            "Matched {}/{} items ({} by override, {} by fingerprint, {} auto-accepted); {} unresolved",
            resolved.len(),
            stats.total,
            stats.overridden,
            stats.fingerprint_matched,
            stats.auto_accepted,
            stats.unresolved,
        );

        Ok(SessionOutcome {
            resolved,
            unresolved_keys: self.state.unresolved.keys().cloned().collect(),
            catalog_empty,
            stats,
        })
    }

    /// Ranked candidates for one unresolved record, which is what a review
    /// front-end shows. Fingerprint-exact hits surface first, as
    /// full-confidence candidates awaiting confirmation.
    pub fn candidates_for(&self, record: &UnresolvedRecord) -> Vec<MatchCandidate> {
        let matcher = Matcher::new(&self.index, &self.state.overrides, &self.policy);
        match matcher.match_item(&record.to_item()) {
            // Already overridden; nothing left to review for this record.
            MatchOutcome::Resolved(resolution)
                if resolution.method == MatchMethod::Override =>
            {
                Vec::new()
            }
            MatchOutcome::Resolved(resolution) => vec![MatchCandidate {
                entry: resolution.entry,
                score: 100,
                method: resolution.method,
            }],
            MatchOutcome::Candidates(candidates) => candidates,
        }
    }

    /// Free-text query against the session catalog.
    pub fn search(&self, query: &str, category: &str, limit: usize) -> Vec<MatchCandidate> {
        let matcher = Matcher::new(&self.index, &self.state.overrides, &self.policy);
        matcher.search(query, category, limit)
    }

    /// Apply one human decision. Accepting persists the override (and
    /// retires the unresolved entry) immediately, so an abort on the next
    /// item leaves nothing half-done on disk.
    pub fn apply_decision(
        &mut self,
        key: &ItemKey,
        decision: ReviewDecision,
    ) -> Result<DecisionApplied, Error> {
        match decision {
            ReviewDecision::Accept(entry) => {
                let record = OverrideRecord::from_entry(&entry);
                self.store.record_override(&mut self.state, key, record)?;
                info!("Recorded override for {}: {}", key, entry.name);
                Ok(DecisionApplied::Recorded)
            }
            ReviewDecision::Skip => Ok(DecisionApplied::Skipped),
            ReviewDecision::Abort => Ok(DecisionApplied::Aborted),
        }
    }
}
