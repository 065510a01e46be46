use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::CatalogEntry;
use crate::fingerprint::Fingerprint;
use crate::model::LocalItem;
use crate::normalize::Variant;

/// Stable identity for a local item across scan sessions. The fingerprint is
/// the preferred join key; normalized name + category is the fallback when
/// fingerprinting was skipped or failed.
///
/// Rendered as `crc:3337EC46` or `name:<category>/<base>`; these strings are
/// the keys of the persisted store maps, so the rendering is a compatibility
/// contract.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ItemKey {
    Fingerprint(Fingerprint),
    Name { category: String, base: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid item key: {0}")]
pub struct ParseKeyError(pub String);

impl ItemKey {
    pub fn for_item(item: &LocalItem) -> ItemKey {
        match item.fingerprint {
            Some(fp) => ItemKey::Fingerprint(fp),
            None => ItemKey::Name {
                category: item.category.clone(),
                base: item.base_name.clone(),
            },
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKey::Fingerprint(fp) => write!(f, "crc:{}", fp),
            ItemKey::Name { category, base } => write!(f, "name:{}/{}", category, base),
        }
    }
}

impl FromStr for ItemKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(hex) = s.strip_prefix("crc:") {
            let fp = hex.parse().map_err(|_| ParseKeyError(s.to_string()))?;
            return Ok(ItemKey::Fingerprint(fp));
        }
        if let Some(rest) = s.strip_prefix("name:") {
            if let Some((category, base)) = rest.split_once('/') {
                return Ok(ItemKey::Name {
                    category: category.to_string(),
                    base: base.to_string(),
                });
            }
        }
        Err(ParseKeyError(s.to_string()))
    }
}

/// A local item that automatic matching could not resolve. Persists pending
/// human input; the `manual_*` and `notes` fields belong to the human and
/// survive every rescan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnresolvedRecord {
    pub filename: String,
    pub path: PathBuf,
    pub category: String,
    pub size: u64,
    pub fingerprint: Option<Fingerprint>,
    pub base_name: String,
    pub region: Option<String>,
    pub variant: Variant,
    #[serde(default)]
    pub manual_name: Option<String>,
    #[serde(default)]
    pub manual_year: Option<u16>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl UnresolvedRecord {
    pub fn from_item(item: &LocalItem) -> Self {
        UnresolvedRecord {
            filename: item.filename.clone(),
            path: item.path.clone(),
            category: item.category.clone(),
            size: item.size,
            fingerprint: item.fingerprint,
            base_name: item.base_name.clone(),
            region: item.region.clone(),
            variant: item.variant,
            manual_name: None,
            manual_year: None,
            notes: None,
        }
    }

    pub fn to_item(&self) -> LocalItem {
        LocalItem {
            path: self.path.clone(),
            filename: self.filename.clone(),
            category: self.category.clone(),
            size: self.size,
            fingerprint: self.fingerprint,
            base_name: self.base_name.clone(),
            region: self.region.clone(),
            variant: self.variant,
        }
    }

    pub fn has_human_input(&self) -> bool {
        self.manual_name.as_deref().map(|s| !s.is_empty()).unwrap_or(false)
            || self.manual_year.is_some()
            || self.notes.as_deref().map(|s| !s.is_empty()).unwrap_or(false)
    }

    /// Refresh the automatic fields from a newer scan of the same item
    /// (file may have moved or been renamed) without touching the human
    /// fields.
    pub fn absorb_scan(&mut self, fresh: &UnresolvedRecord) {
        self.filename = fresh.filename.clone();
        self.path = fresh.path.clone();
        self.category = fresh.category.clone();
        self.size = fresh.size;
        self.fingerprint = fresh.fingerprint;
        self.base_name = fresh.base_name.clone();
        self.region = fresh.region.clone();
        self.variant = fresh.variant;
    }
}

/// A human-confirmed resolution. Authoritative over any automatic match for
/// the same key; never silently replaced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverrideRecord {
    pub category: String,
    pub canonical_name: String,
    #[serde(default)]
    pub region: Option<String>,
    /// The catalog entry's fingerprint; may differ from the local file's
    /// when the local copy is a hack or variant of the canonical game.
    #[serde(default)]
    pub fingerprint: Option<Fingerprint>,
    #[serde(default)]
    pub release_year: Option<u16>,
    #[serde(default)]
    pub developer: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
}

impl OverrideRecord {
    pub fn from_entry(entry: &CatalogEntry) -> Self {
        OverrideRecord {
            category: entry.category.clone(),
            canonical_name: entry.name.clone(),
            region: entry.region.clone(),
            fingerprint: entry.fingerprint,
            release_year: entry.release_year,
            developer: entry.developer.clone(),
            publisher: entry.publisher.clone(),
        }
    }

    pub fn to_entry(&self) -> CatalogEntry {
        CatalogEntry {
            name: self.canonical_name.clone(),
            fingerprint: self.fingerprint,
            category: self.category.clone(),
            region: self.region.clone(),
            release_year: self.release_year,
            developer: self.developer.clone(),
            publisher: self.publisher.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_rendering_round_trips() {
        let fp_key = ItemKey::Fingerprint("3337EC46".parse().unwrap());
        assert_eq!(fp_key.to_string(), "crc:3337EC46");
        assert_eq!(fp_key.to_string().parse::<ItemKey>().unwrap(), fp_key);

        let name_key = ItemKey::Name {
            category: "NES".to_string(),
            base: "Super Mario Bros.".to_string(),
        };
        assert_eq!(name_key.to_string(), "name:NES/Super Mario Bros.");
        assert_eq!(name_key.to_string().parse::<ItemKey>().unwrap(), name_key);
    }

    #[test]
    fn test_key_parse_rejects_unknown_forms() {
        assert!("bogus".parse::<ItemKey>().is_err());
        assert!("crc:not-hex".parse::<ItemKey>().is_err());
        assert!("name:missing-slash".parse::<ItemKey>().is_err());
    }
}
