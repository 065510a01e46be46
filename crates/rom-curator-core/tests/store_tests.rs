use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::tempdir;

use rom_curator_core::model::LocalItem;
use rom_curator_core::normalize::NameNormalizer;
use rom_curator_core::store::{
    ItemKey, OverrideRecord, ReconciliationStore, UnresolvedRecord,
};
use rom_curator_core::Error;

fn store_in(dir: &Path) -> ReconciliationStore {
    ReconciliationStore::new(dir.join("unresolved.json"), dir.join("overrides.json"))
}

fn unresolved(filename: &str, fingerprint: Option<&str>) -> UnresolvedRecord {
    let item = LocalItem::from_scan(
        PathBuf::from(format!("/roms/{}", filename)),
        "NES".to_string(),
        2048,
        fingerprint.map(|f| f.parse().unwrap()),
        &NameNormalizer::default(),
    );
    UnresolvedRecord::from_item(&item)
}

fn override_record(name: &str) -> OverrideRecord {
    OverrideRecord {
        category: "NES".to_string(),
        canonical_name: name.to_string(),
        region: Some("USA".to_string()),
        fingerprint: Some("3337EC46".parse().unwrap()),
        release_year: Some(1985),
        developer: Some("Nintendo".to_string()),
        publisher: Some("Nintendo".to_string()),
    }
}

#[test]
fn test_missing_files_load_as_empty_store() {
    let dir = tempdir().unwrap();
    let state = store_in(dir.path()).load().unwrap();
    assert!(state.unresolved.is_empty());
    assert!(state.overrides.is_empty());
}

#[test]
fn test_save_and_reload_round_trip() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());

    let mut state = store.load().unwrap();
    let record = unresolved("Mystery Game.nes", Some("12AB34CD"));
    let key = ItemKey::Fingerprint("12AB34CD".parse().unwrap()).to_string();
    state.unresolved.insert(key.clone(), record.clone());
    state
        .overrides
        .insert("crc:3337EC46".to_string(), override_record("Super Mario Bros."));
    store.save(&state).unwrap();

    let reloaded = store.load().unwrap();
    assert_eq!(reloaded.unresolved.get(&key), Some(&record));
    assert_eq!(
        reloaded.overrides.get("crc:3337EC46").unwrap().canonical_name,
        "Super Mario Bros."
    );
}

#[test]
fn test_rewrite_is_byte_stable() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());

    let mut state = store.load().unwrap();
    state
        .unresolved
        .insert("crc:12AB34CD".to_string(), unresolved("a.nes", Some("12AB34CD")));
    state
        .overrides
        .insert("crc:3337EC46".to_string(), override_record("Super Mario Bros."));
    store.save(&state).unwrap();

    let first_unresolved = fs::read_to_string(dir.path().join("unresolved.json")).unwrap();
    let first_overrides = fs::read_to_string(dir.path().join("overrides.json")).unwrap();

    // load-then-save of unchanged state must not shuffle a single byte
    let reloaded = store.load().unwrap();
    store.save(&reloaded).unwrap();

    assert_eq!(
        fs::read_to_string(dir.path().join("unresolved.json")).unwrap(),
        first_unresolved
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("overrides.json")).unwrap(),
        first_overrides
    );
}

#[test]
fn test_corrupt_store_is_a_distinct_error() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("unresolved.json"), "{ this is not json").unwrap();

    let result = store_in(dir.path()).load();
    assert!(matches!(result, Err(Error::StoreCorrupted { .. })));
}

#[test]
fn test_empty_file_is_an_empty_store_not_corruption() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("unresolved.json"), "").unwrap();

    let state = store_in(dir.path()).load().unwrap();
    assert!(state.unresolved.is_empty());
}

#[test]
fn test_record_override_retires_unresolved_entry() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());

    let key = ItemKey::Fingerprint("12AB34CD".parse().unwrap());
    let mut state = store.load().unwrap();
    state
        .unresolved
        .insert(key.to_string(), unresolved("Mystery Game.nes", Some("12AB34CD")));
    store.save(&state).unwrap();

    store
        .record_override(&mut state, &key, override_record("Super Mario Bros."))
        .unwrap();

    // in-memory invariant
    assert!(!state.unresolved.contains_key(&key.to_string()));
    assert!(state.overrides.contains_key(&key.to_string()));

    // and what a fresh load observes
    let reloaded = store.load().unwrap();
    assert!(!reloaded.unresolved.contains_key(&key.to_string()));
    assert!(reloaded.overrides.contains_key(&key.to_string()));
}

#[test]
fn test_override_wins_when_hand_edited_files_disagree() {
    let dir = tempdir().unwrap();

    // Craft the on-disk conflict directly, as a hand-editor (or a crash
    // between the two writes) would.
    let key = "crc:12AB34CD";
    let mut unresolved_map = BTreeMap::new();
    unresolved_map.insert(key.to_string(), unresolved("conflict.nes", Some("12AB34CD")));
    let mut override_map = BTreeMap::new();
    override_map.insert(key.to_string(), override_record("Resolved Pick"));
    fs::write(
        dir.path().join("unresolved.json"),
        serde_json::to_string_pretty(&unresolved_map).unwrap(),
    )
    .unwrap();
    fs::write(
        dir.path().join("overrides.json"),
        serde_json::to_string_pretty(&override_map).unwrap(),
    )
    .unwrap();

    let store = store_in(dir.path());
    let state = store.load().unwrap();
    assert!(!state.unresolved.contains_key(key));
    assert_eq!(state.overrides.get(key).unwrap().canonical_name, "Resolved Pick");

    // the stale entry is gone from disk after the next save
    store.save(&state).unwrap();
    let raw = fs::read_to_string(dir.path().join("unresolved.json")).unwrap();
    assert!(!raw.contains(key));
}

#[test]
fn test_merge_preserves_human_entered_fields() {
    let mut existing = BTreeMap::new();
    let mut annotated = unresolved("Mystery Game.nes", Some("12AB34CD"));
    annotated.manual_name = Some("Actually Famicom Wars".to_string());
    annotated.manual_year = Some(1988);
    annotated.notes = Some("check the region before confirming".to_string());
    existing.insert("crc:12AB34CD".to_string(), annotated);

    // fresh scan re-derived the automatic fields: the file moved
    let mut fresh_map = BTreeMap::new();
    let fresh = UnresolvedRecord {
        path: PathBuf::from("/new-location/Mystery Game.nes"),
        ..unresolved("Mystery Game.nes", Some("12AB34CD"))
    };
    fresh_map.insert("crc:12AB34CD".to_string(), fresh);

    ReconciliationStore::merge_unresolved(&mut existing, fresh_map);

    let merged = existing.get("crc:12AB34CD").unwrap();
    assert_eq!(merged.path, PathBuf::from("/new-location/Mystery Game.nes"));
    assert_eq!(merged.manual_name.as_deref(), Some("Actually Famicom Wars"));
    assert_eq!(merged.manual_year, Some(1988));
    assert_eq!(
        merged.notes.as_deref(),
        Some("check the region before confirming")
    );
}

#[test]
fn test_merge_inserts_new_and_keeps_absent_entries() {
    let mut existing = BTreeMap::new();
    existing.insert(
        "crc:11111111".to_string(),
        unresolved("old.nes", Some("11111111")),
    );

    let mut fresh = BTreeMap::new();
    fresh.insert(
        "crc:22222222".to_string(),
        unresolved("new.nes", Some("22222222")),
    );

    ReconciliationStore::merge_unresolved(&mut existing, fresh);

    // union: the fresh entry arrives, the prior entry survives even though
    // this scan did not see it (only record_override removes entries)
    assert_eq!(existing.len(), 2);
    assert!(existing.contains_key("crc:11111111"));
    assert!(existing.contains_key("crc:22222222"));
}
