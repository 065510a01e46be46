use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogEntry, CatalogIndex};
use crate::config::MatchPolicy;
use crate::model::LocalItem;
use crate::normalize::{word_tokens, Variant};
use crate::store::{ItemKey, OverrideRecord};

/// Name pairs sharing zero word tokens can never reach the review tier, no
/// matter how close the raw edit distance lands ("cat" vs "car").
const DISJOINT_CEILING: u8 = 59;
/// Non-canonical items (hacks, mods, prototypes) never score a perfect name
/// match; the classification dampens confidence without filtering.
const VARIANT_CEILING: u8 = 95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMethod {
    Override,
    ExactFingerprint,
    NameSimilarity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

impl ConfidenceTier {
    pub fn from_score(score: u8, policy: &MatchPolicy) -> ConfidenceTier {
        if score > policy.accept_threshold {
            ConfidenceTier::High
        } else if score >= policy.review_threshold {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }
}

/// One ranked catalog candidate for a local item.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub entry: CatalogEntry,
    /// Similarity score in [0, 100]; 100 for fingerprint-exact candidates.
    pub score: u8,
    pub method: MatchMethod,
}

impl MatchCandidate {
    pub fn confidence(&self) -> f64 {
        f64::from(self.score) / 100.0
    }

    pub fn tier(&self, policy: &MatchPolicy) -> ConfidenceTier {
        ConfidenceTier::from_score(self.score, policy)
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub entry: CatalogEntry,
    pub method: MatchMethod,
    pub confidence: f64,
    /// Exact-fingerprint catalog hits that disagree with an existing
    /// override, offered so the user can re-resolve against an updated
    /// catalog. The override itself always stands until they do.
    pub reresolution_offers: Vec<CatalogEntry>,
}

impl Resolution {
    fn new(entry: CatalogEntry, method: MatchMethod, confidence: f64) -> Self {
        Resolution {
            entry,
            method,
            confidence,
            reresolution_offers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum MatchOutcome {
    Resolved(Resolution),
    /// Ranked candidates needing a decision: possibly empty, possibly a
    /// fingerprint tie set. Never silently collapsed to one entry.
    Candidates(Vec<MatchCandidate>),
}

/// Name similarity in [0, 100]: Jaro-Winkler over case-folded input,
/// with the token-disjoint ceiling applied. Symmetric; identical folded
/// strings always score 100.
pub fn similarity(a: &str, b: &str) -> u8 {
    let a_folded = a.trim().to_lowercase();
    let b_folded = b.trim().to_lowercase();
    if a_folded == b_folded {
        return 100;
    }
    if a_folded.is_empty() || b_folded.is_empty() {
        return 0;
    }

    let score = (strsim::jaro_winkler(&a_folded, &b_folded) * 100.0).round() as u8;

    let a_tokens = word_tokens(&a_folded);
    let shares_token = word_tokens(&b_folded)
        .iter()
        .any(|t| a_tokens.contains(t));
    if shares_token {
        score.min(100)
    } else {
        score.min(DISJOINT_CEILING)
    }
}

/// Matches one local item at a time against a session's catalog index,
/// consulting the override set first. Pure and fast; owns no state.
pub struct Matcher<'a> {
    index: &'a CatalogIndex,
    overrides: &'a BTreeMap<String, OverrideRecord>,
    policy: &'a MatchPolicy,
}

impl<'a> Matcher<'a> {
    pub fn new(
        index: &'a CatalogIndex,
        overrides: &'a BTreeMap<String, OverrideRecord>,
        policy: &'a MatchPolicy,
    ) -> Self {
        Matcher {
            index,
            overrides,
            policy,
        }
    }

    /// Resolution ladder, first success wins:
    /// 1. Override for the item's stable key (bypasses the catalog)
    /// 2. Exact fingerprint: single hit resolves, ties surface as a set
    /// 3. Ranked name similarity candidates
    pub fn match_item(&self, item: &LocalItem) -> MatchOutcome {
        let key = ItemKey::for_item(item).to_string();
        if let Some(record) = self.overrides.get(&key) {
            return MatchOutcome::Resolved(self.resolve_override(item, record));
        }

        if let Some(fp) = item.fingerprint {
            let hits = self.index.fingerprint_indices(fp);
            match hits {
                [] => {}
                [single] => {
                    return MatchOutcome::Resolved(Resolution::new(
                        self.index.entry(*single).clone(),
                        MatchMethod::ExactFingerprint,
                        1.0,
                    ));
                }
                ties => {
                    return MatchOutcome::Candidates(
                        ties.iter()
                            .map(|&idx| MatchCandidate {
                                entry: self.index.entry(idx).clone(),
                                score: 100,
                                method: MatchMethod::ExactFingerprint,
                            })
                            .collect(),
                    );
                }
            }
        }

        MatchOutcome::Candidates(self.rank_by_name(&item.base_name, &item.category, item.variant))
    }

    fn resolve_override(&self, item: &LocalItem, record: &OverrideRecord) -> Resolution {
        let mut resolution = Resolution::new(record.to_entry(), MatchMethod::Override, 1.0);
        // An updated catalog may have gained a fingerprint-exact entry that
        // disagrees with the recorded override. Offer it, never apply it.
        if let Some(fp) = item.fingerprint {
            for &idx in self.index.fingerprint_indices(fp) {
                let entry = self.index.entry(idx);
                if entry.name != record.canonical_name {
                    resolution.reresolution_offers.push(entry.clone());
                }
            }
        }
        resolution
    }

    fn rank_by_name(&self, base: &str, category: &str, variant: Variant) -> Vec<MatchCandidate> {
        let pool = self
            .index
            .candidates_by_name(base, category, self.policy.candidate_pool);

        let ceiling = if variant == Variant::Canonical {
            100
        } else {
            VARIANT_CEILING
        };

        let mut scored: Vec<(usize, u8)> = pool
            .into_iter()
            .map(|idx| {
                let score = similarity(base, self.index.normalized_base(idx)).min(ceiling);
                (idx, score)
            })
            .collect();
        // descending score, catalog load order breaks ties
        scored.sort_by_key(|&(idx, score)| (Reverse(score), idx));
        scored.truncate(self.policy.max_candidates);

        scored
            .into_iter()
            .map(|(idx, score)| MatchCandidate {
                entry: self.index.entry(idx).clone(),
                score,
                method: MatchMethod::NameSimilarity,
            })
            .collect()
    }

    /// Free-text query against the whole category, for the interactive
    /// front-end's search box. No pre-filter: the user's query is the
    /// filter.
    pub fn search(&self, query: &str, category: &str, limit: usize) -> Vec<MatchCandidate> {
        let folded_query = query.trim().to_lowercase();
        let mut scored: Vec<(usize, u8)> = self
            .index
            .category_indices(category)
            .iter()
            .map(|&idx| {
                let by_name = similarity(query, self.index.normalized_base(idx));
                // substring hits rank at least medium even when the edit
                // distance is poor ("mario" against long titles)
                let score = if !folded_query.is_empty()
                    && self.index.normalized_base(idx).contains(&folded_query)
                {
                    by_name.max(self.policy.review_threshold)
                } else {
                    by_name
                };
                (idx, score)
            })
            .collect();
        scored.sort_by_key(|&(idx, score)| (Reverse(score), idx));
        scored.truncate(limit);

        scored
            .into_iter()
            .map(|(idx, score)| MatchCandidate {
                entry: self.index.entry(idx).clone(),
                score,
                method: MatchMethod::NameSimilarity,
            })
            .collect()
    }

    /// Batch-mode acceptance: a single high-confidence top candidate with no
    /// score tie. Fingerprint tie sets always come back `None`; a tied set
    /// is a human decision.
    pub fn auto_accept<'c>(&self, candidates: &'c [MatchCandidate]) -> Option<&'c MatchCandidate> {
        let top = candidates.first()?;
        if ConfidenceTier::from_score(top.score, self.policy) != ConfidenceTier::High {
            return None;
        }
        match candidates.get(1) {
            Some(second) if second.score >= top.score => None,
            _ => Some(top),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_identity_is_100() {
        assert_eq!(similarity("Super Mario Bros.", "Super Mario Bros."), 100);
        assert_eq!(similarity("super mario bros.", "SUPER MARIO BROS."), 100);
        assert_eq!(similarity("", ""), 100);
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let pairs = [
            ("Super Mario Bros.", "Super Mario Bros. 3"),
            ("Metroid", "Contra"),
            ("Tetris", ""),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a));
        }
    }

    #[test]
    fn test_disjoint_tokens_stay_below_review_tier() {
        assert!(similarity("cat", "car") < 60);
        assert!(similarity("Metroid", "Contra") < 60);
    }

    #[test]
    fn test_shared_prefix_titles_score_high() {
        let score = similarity("Super Mario Hack", "Super Mario Bros.");
        assert!(score > 80, "got {}", score);
    }

    #[test]
    fn test_tier_thresholds() {
        let policy = MatchPolicy::default();
        assert_eq!(ConfidenceTier::from_score(81, &policy), ConfidenceTier::High);
        assert_eq!(
            ConfidenceTier::from_score(80, &policy),
            ConfidenceTier::Medium
        );
        assert_eq!(
            ConfidenceTier::from_score(60, &policy),
            ConfidenceTier::Medium
        );
        assert_eq!(ConfidenceTier::from_score(59, &policy), ConfidenceTier::Low);
    }
}
