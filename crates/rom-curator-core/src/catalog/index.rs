use ahash::{AHashMap, AHashSet};

use super::entry::CatalogEntry;
use crate::fingerprint::Fingerprint;
use crate::normalize::{word_tokens, NameNormalizer};

struct IndexedName {
    folded: String,
    tokens: AHashSet<String>,
}

/// In-memory index over one catalog snapshot, keyed both by fingerprint and
/// by normalized name. Built once per session, immutable, discarded at
/// session end.
///
/// Entries keep their catalog load order; every lookup that has to break a
/// tie does so by that order, so results are stable across runs.
pub struct CatalogIndex {
    entries: Vec<CatalogEntry>,
    names: Vec<IndexedName>,
    by_fingerprint: AHashMap<Fingerprint, Vec<usize>>,
    by_category: AHashMap<String, Vec<usize>>,
}

impl CatalogIndex {
    pub fn build(entries: Vec<CatalogEntry>, normalizer: &NameNormalizer) -> Self {
        let mut names = Vec::with_capacity(entries.len());
        let mut by_fingerprint: AHashMap<Fingerprint, Vec<usize>> = AHashMap::new();
        let mut by_category: AHashMap<String, Vec<usize>> = AHashMap::new();

        for (idx, entry) in entries.iter().enumerate() {
            let folded = normalizer.normalize(&entry.name).base.to_lowercase();
            let tokens: AHashSet<String> = word_tokens(&folded).into_iter().collect();
            names.push(IndexedName { folded, tokens });

            if let Some(fp) = entry.fingerprint {
                by_fingerprint.entry(fp).or_default().push(idx);
            }
            by_category.entry(entry.category.clone()).or_default().push(idx);
        }

        CatalogIndex {
            entries,
            names,
            by_fingerprint,
            by_category,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entry(&self, idx: usize) -> &CatalogEntry {
        &self.entries[idx]
    }

    pub(crate) fn normalized_base(&self, idx: usize) -> &str {
        &self.names[idx].folded
    }

    /// First entry in catalog load order with this fingerprint. Duplicate
    /// fingerprints across entries are possible (regional re-releases); use
    /// `fingerprint_indices` when the full tie set matters.
    pub fn lookup_by_fingerprint(&self, fp: Fingerprint) -> Option<&CatalogEntry> {
        self.by_fingerprint
            .get(&fp)
            .and_then(|indices| indices.first())
            .map(|&idx| &self.entries[idx])
    }

    pub fn fingerprint_indices(&self, fp: Fingerprint) -> &[usize] {
        self.by_fingerprint
            .get(&fp)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub(crate) fn category_indices(&self, category: &str) -> &[usize] {
        self.by_category
            .get(category)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Same-category candidate superset for name matching: entries sharing
    /// the base's first character or at least one word token. Bounds the
    /// scoring work on large catalogs; the matcher ranks what comes back.
    pub fn candidates_by_name(&self, base: &str, category: &str, limit: usize) -> Vec<usize> {
        let folded = base.trim().to_lowercase();
        let first = folded.chars().next();
        let tokens: AHashSet<String> = word_tokens(&folded).into_iter().collect();

        let mut out = Vec::new();
        for &idx in self.category_indices(category) {
            let name = &self.names[idx];
            let same_first = first.is_some() && name.folded.chars().next() == first;
            let overlap = !tokens.is_empty() && name.tokens.iter().any(|t| tokens.contains(t));
            if same_first || overlap {
                out.push(idx);
                if out.len() >= limit {
                    break;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, fingerprint: Option<&str>, category: &str) -> CatalogEntry {
        CatalogEntry {
            name: name.to_string(),
            fingerprint: fingerprint.map(|f| f.parse().unwrap()),
            category: category.to_string(),
            region: None,
            release_year: None,
            developer: None,
            publisher: None,
        }
    }

    #[test]
    fn test_fingerprint_lookup_prefers_load_order() {
        let normalizer = NameNormalizer::default();
        let index = CatalogIndex::build(
            vec![
                entry("Shadow Dancer (USA)", Some("AABBCCDD"), "Genesis"),
                entry("Shadow Dancer (Europe)", Some("AABBCCDD"), "Genesis"),
            ],
            &normalizer,
        );

        let fp: Fingerprint = "AABBCCDD".parse().unwrap();
        assert_eq!(
            index.lookup_by_fingerprint(fp).unwrap().name,
            "Shadow Dancer (USA)"
        );
        assert_eq!(index.fingerprint_indices(fp), &[0, 1]);
    }

    #[test]
    fn test_candidates_scoped_to_category() {
        let normalizer = NameNormalizer::default();
        let index = CatalogIndex::build(
            vec![
                entry("Super Mario Bros.", None, "NES"),
                entry("Super Hang-On", None, "Genesis"),
            ],
            &normalizer,
        );

        let candidates = index.candidates_by_name("Super Mario Bros", "NES", 16);
        assert_eq!(candidates, vec![0]);
        assert!(index.candidates_by_name("Super Mario Bros", "PCE", 16).is_empty());
    }

    #[test]
    fn test_candidate_prefilter_by_token_overlap() {
        let normalizer = NameNormalizer::default();
        let index = CatalogIndex::build(
            vec![
                entry("Legend of Zelda, The", None, "NES"),
                entry("Metroid", None, "NES"),
            ],
            &normalizer,
        );

        // "Zelda" shares a token with entry 0 but no first character
        let candidates = index.candidates_by_name("Zelda", "NES", 16);
        assert_eq!(candidates, vec![0]);
    }
}
