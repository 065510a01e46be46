use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::records::{ItemKey, OverrideRecord, UnresolvedRecord};
use crate::config::StoreConfig;
use crate::error::Error;

/// In-memory view of the two persisted mappings. Keys are the stable
/// `ItemKey` renderings, values the record types, exactly what lands on
/// disk.
#[derive(Debug, Default, Clone)]
pub struct StoreState {
    pub unresolved: BTreeMap<String, UnresolvedRecord>,
    pub overrides: BTreeMap<String, OverrideRecord>,
}

/// The persistent reconciliation state: one JSON document of unresolved
/// items awaiting human input, one of human-confirmed overrides. Both are
/// plain keyed maps a user may hand-edit between runs, so serialization
/// order is deterministic (BTreeMap) and writes are atomic
/// (temp file + rename).
pub struct ReconciliationStore {
    unresolved_path: PathBuf,
    overrides_path: PathBuf,
}

impl ReconciliationStore {
    pub fn new(unresolved_path: impl Into<PathBuf>, overrides_path: impl Into<PathBuf>) -> Self {
        ReconciliationStore {
            unresolved_path: unresolved_path.into(),
            overrides_path: overrides_path.into(),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        ReconciliationStore::new(&config.unresolved_path, &config.overrides_path)
    }

    /// Load both mappings. A missing file is an empty store; malformed JSON
    /// is `Error::StoreCorrupted` so the caller can back the file up rather
    /// than silently losing human-entered data.
    ///
    /// A key present in both mappings (possible after hand edits, or a crash
    /// between the two writes of `record_override`) resolves override-wins:
    /// the stale unresolved entry is dropped here and disappears from disk
    /// on the next save.
    pub fn load(&self) -> Result<StoreState, Error> {
        let overrides: BTreeMap<String, OverrideRecord> = read_map(&self.overrides_path)?;
        let mut unresolved: BTreeMap<String, UnresolvedRecord> = read_map(&self.unresolved_path)?;

        let before = unresolved.len();
        unresolved.retain(|key, _| !overrides.contains_key(key));
        let dropped = before - unresolved.len();
        if dropped > 0 {
            warn!(
                "Dropped {} unresolved entries shadowed by overrides",
                dropped
            );
        }

        debug!(
            "Store loaded: {} unresolved, {} overrides",
            unresolved.len(),
            overrides.len()
        );
        Ok(StoreState {
            unresolved,
            overrides,
        })
    }

    /// Persist both mappings, overrides first: if the process dies between
    /// the two writes, reload sees the override and discards the stale
    /// unresolved entry, so the store never disagrees about an item's
    /// status.
    pub fn save(&self, state: &StoreState) -> Result<(), Error> {
        write_map_atomic(&self.overrides_path, &state.overrides)?;
        write_map_atomic(&self.unresolved_path, &state.unresolved)?;
        Ok(())
    }

    /// Record a human-confirmed resolution and retire the matching
    /// unresolved entry as one observable update.
    pub fn record_override(
        &self,
        state: &mut StoreState,
        key: &ItemKey,
        record: OverrideRecord,
    ) -> Result<(), Error> {
        let key = key.to_string();
        state.overrides.insert(key.clone(), record);
        write_map_atomic(&self.overrides_path, &state.overrides)?;

        state.unresolved.remove(&key);
        write_map_atomic(&self.unresolved_path, &state.unresolved)?;
        Ok(())
    }

    /// Non-destructive union of the prior unresolved set with a fresh scan's
    /// failures. Automatic fields refresh; human-entered fields always
    /// survive. Entries only ever leave through `record_override`.
    pub fn merge_unresolved(
        existing: &mut BTreeMap<String, UnresolvedRecord>,
        fresh: BTreeMap<String, UnresolvedRecord>,
    ) {
        for (key, record) in fresh {
            match existing.get_mut(&key) {
                Some(current) => current.absorb_scan(&record),
                None => {
                    existing.insert(key, record);
                }
            }
        }
    }
}

fn read_map<T: DeserializeOwned>(path: &Path) -> Result<BTreeMap<String, T>, Error> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&contents).map_err(|e| Error::StoreCorrupted {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn write_map_atomic<T: Serialize>(path: &Path, map: &BTreeMap<String, T>) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let serialized = serde_json::to_string_pretty(map)
        .map_err(|e| Error::Other(format!("serializing store: {}", e)))?;

    let tmp = path.with_extension("json.tmp");
    {
        let mut file = File::create(&tmp)?;
        file.write_all(serialized.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
