use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::entry::CatalogEntry;
use crate::error::Error;
use crate::fingerprint::Fingerprint;

/// Capability interface for reference-data providers. Instances are
/// registered by name at startup; nothing is resolved dynamically after
/// that.
pub trait CatalogSource {
    fn name(&self) -> &str;

    /// Free-text search, optionally scoped to one category.
    fn search(&self, query: &str, category: Option<&str>) -> Result<Vec<CatalogEntry>, Error>;

    /// Look up one record by identifier: a fingerprint in hex form, or an
    /// exact canonical name.
    fn fetch_detail(&self, id: &str) -> Result<Option<CatalogEntry>, Error>;
}

#[derive(Default)]
pub struct SourceRegistry {
    sources: Vec<Box<dyn CatalogSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        SourceRegistry {
            sources: Vec::new(),
        }
    }

    pub fn register(&mut self, source: Box<dyn CatalogSource>) {
        debug!("Registered catalog source '{}'", source.name());
        self.sources.push(source);
    }

    pub fn get(&self, name: &str) -> Option<&dyn CatalogSource> {
        self.sources
            .iter()
            .find(|s| s.name() == name)
            .map(|s| s.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

/// Catalog records stored as one JSON array per category file
/// (`<dir>/<Category>.json`). Files are read in filename order so the
/// catalog load order, and with it every tie-break, is deterministic.
pub struct JsonCatalogSource {
    dir: PathBuf,
}

impl JsonCatalogSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonCatalogSource { dir: dir.into() }
    }

    pub fn load_all(&self) -> Result<Vec<CatalogEntry>, Error> {
        if !self.dir.is_dir() {
            warn!(
                "Catalog directory {} does not exist; proceeding with an empty catalog",
                self.dir.display()
            );
            return Ok(Vec::new());
        }

        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map(|e| e == "json").unwrap_or(false))
            .collect();
        files.sort();

        let mut entries = Vec::new();
        for file in &files {
            entries.extend(load_category_file(file)?);
        }
        debug!(
            "Loaded {} catalog entries from {} files",
            entries.len(),
            files.len()
        );
        Ok(entries)
    }
}

fn load_category_file(path: &Path) -> Result<Vec<CatalogEntry>, Error> {
    let contents = fs::read_to_string(path)?;
    let mut entries: Vec<CatalogEntry> = serde_json::from_str(&contents)
        .map_err(|e| Error::Catalog(format!("{}: {}", path.display(), e)))?;

    // Entries may omit their category; the file stem is the authority then.
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    for entry in &mut entries {
        if entry.category.is_empty() {
            entry.category = stem.clone();
        }
    }
    Ok(entries)
}

impl CatalogSource for JsonCatalogSource {
    fn name(&self) -> &str {
        "json"
    }

    fn search(&self, query: &str, category: Option<&str>) -> Result<Vec<CatalogEntry>, Error> {
        let query = query.to_lowercase();
        Ok(self
            .load_all()?
            .into_iter()
            .filter(|e| category.map(|c| e.category == c).unwrap_or(true))
            .filter(|e| e.name.to_lowercase().contains(&query))
            .collect())
    }

    fn fetch_detail(&self, id: &str) -> Result<Option<CatalogEntry>, Error> {
        let entries = self.load_all()?;
        if let Ok(fp) = id.parse::<Fingerprint>() {
            if let Some(entry) = entries.iter().find(|e| e.fingerprint == Some(fp)) {
                return Ok(Some(entry.clone()));
            }
        }
        Ok(entries.into_iter().find(|e| e.name == id))
    }
}

/// Session-start convenience: the full catalog snapshot from the configured
/// directory.
pub fn load_catalog(dir: &Path) -> Result<Vec<CatalogEntry>, Error> {
    JsonCatalogSource::new(dir).load_all()
}
