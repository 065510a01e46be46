use std::fs;

use tempfile::tempdir;

use rom_curator_core::catalog::{
    load_catalog, CatalogSource, JsonCatalogSource, SourceRegistry,
};

const NES_CATALOG: &str = r#"[
  {
    "name": "Super Mario Bros.",
    "fingerprint": "3337EC46",
    "region": "USA",
    "release_year": 1985,
    "developer": "Nintendo",
    "publisher": "Nintendo"
  },
  {
    "name": "Metroid",
    "fingerprint": "11112222"
  }
]"#;

const GENESIS_CATALOG: &str = r#"[
  {
    "name": "Sonic The Hedgehog",
    "fingerprint": "F9394E97",
    "category": "Sega - Mega Drive - Genesis"
  }
]"#;

#[test]
fn test_load_fills_category_from_file_stem() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("NES.json"), NES_CATALOG).unwrap();
    fs::write(dir.path().join("Genesis.json"), GENESIS_CATALOG).unwrap();

    let entries = load_catalog(dir.path()).unwrap();
    assert_eq!(entries.len(), 3);

    // files load in name order, so Genesis entries come first
    assert_eq!(entries[0].name, "Sonic The Hedgehog");
    // explicit category is kept, not overwritten by the stem
    assert_eq!(entries[0].category, "Sega - Mega Drive - Genesis");
    // omitted category falls back to the file stem
    assert_eq!(entries[1].category, "NES");
    assert_eq!(entries[1].name, "Super Mario Bros.");
    assert_eq!(entries[1].release_year, Some(1985));
}

#[test]
fn test_missing_catalog_dir_is_an_empty_catalog() {
    let dir = tempdir().unwrap();
    let entries = load_catalog(&dir.path().join("nowhere")).unwrap();
    assert!(entries.is_empty());
}

#[test]
fn test_malformed_catalog_file_is_an_error() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("NES.json"), "[ not json").unwrap();
    assert!(load_catalog(dir.path()).is_err());
}

#[test]
fn test_source_search_and_detail() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("NES.json"), NES_CATALOG).unwrap();

    let source = JsonCatalogSource::new(dir.path());

    let hits = source.search("mario", Some("NES")).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Super Mario Bros.");
    assert!(source.search("mario", Some("Genesis")).unwrap().is_empty());

    let by_fingerprint = source.fetch_detail("3337EC46").unwrap().unwrap();
    assert_eq!(by_fingerprint.name, "Super Mario Bros.");

    let by_name = source.fetch_detail("Metroid").unwrap().unwrap();
    assert_eq!(by_name.fingerprint.unwrap().to_string(), "11112222");

    assert!(source.fetch_detail("No Such Game").unwrap().is_none());
}

#[test]
fn test_registry_resolves_sources_by_name() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("NES.json"), NES_CATALOG).unwrap();

    let mut registry = SourceRegistry::new();
    registry.register(Box::new(JsonCatalogSource::new(dir.path())));

    assert_eq!(registry.names(), vec!["json"]);
    let source = registry.get("json").unwrap();
    assert_eq!(source.search("metroid", None).unwrap().len(), 1);
    assert!(registry.get("launchbox").is_none());
}
