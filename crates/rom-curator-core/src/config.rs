use config::{Config, ConfigError, File as ConfigFile};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub roms_path: PathBuf,
    pub catalog_path: PathBuf,
    pub playlists_path: PathBuf,
    pub store: StoreConfig,
    pub systems: BTreeMap<String, SystemConfig>,
    pub scan: ScanOptions,
    pub matching: MatchPolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub unresolved_path: PathBuf,
    pub overrides_path: PathBuf,
}

/// One managed platform: which file extensions belong to it, and the catalog
/// file label used when naming playlists. The first extension is the primary
/// one and wins ties against systems that merely also accept it.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    pub extensions: Vec<String>,
    #[serde(default)]
    pub db_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    pub recursive: bool,
    pub fingerprint: bool,
    pub ignore_patterns: Vec<String>,
}

/// Matching policy knobs. Thresholds and the variant keyword lists vary by
/// content domain and naming convention, so they are configuration rather
/// than constants.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchPolicy {
    /// Scores strictly above this are high confidence (auto-acceptable).
    pub accept_threshold: u8,
    /// Scores at or above this (and not high) are medium confidence.
    pub review_threshold: u8,
    /// How many ranked candidates to surface per item.
    pub max_candidates: usize,
    /// Upper bound on the pre-filtered candidate pool per lookup.
    pub candidate_pool: usize,
    /// Extra region annotation tokens, lowercased token -> canonical name.
    pub region_tokens: BTreeMap<String, String>,
    /// Extra keywords appended to the built-in variant classifier lists.
    pub hack_keywords: Vec<String>,
    pub mod_keywords: Vec<String>,
    pub prototype_keywords: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            roms_path: PathBuf::from("roms"),
            catalog_path: PathBuf::from("catalog"),
            playlists_path: PathBuf::from("playlists"),
            store: StoreConfig::default(),
            systems: default_systems(),
            scan: ScanOptions::default(),
            matching: MatchPolicy::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            unresolved_path: PathBuf::from("unresolved.json"),
            overrides_path: PathBuf::from("overrides.json"),
        }
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            recursive: true,
            fingerprint: true,
            ignore_patterns: Vec::new(),
        }
    }
}

impl Default for MatchPolicy {
    fn default() -> Self {
        MatchPolicy {
            accept_threshold: 80,
            review_threshold: 60,
            max_candidates: 5,
            candidate_pool: 256,
            region_tokens: BTreeMap::new(),
            hack_keywords: Vec::new(),
            mod_keywords: Vec::new(),
            prototype_keywords: Vec::new(),
        }
    }
}

fn default_systems() -> BTreeMap<String, SystemConfig> {
    let mut systems = BTreeMap::new();
    let mut add = |name: &str, extensions: &[&str]| {
        systems.insert(
            name.to_string(),
            SystemConfig {
                extensions: extensions.iter().map(|e| e.to_string()).collect(),
                db_name: Some(format!("{}.rdb", name)),
            },
        );
    };
    add(
        "Nintendo - Nintendo Entertainment System",
        &[".nes", ".fds", ".unf"],
    );
    add(
        "Nintendo - Super Nintendo Entertainment System",
        &[".sfc", ".smc"],
    );
    add("Nintendo - Game Boy", &[".gb", ".sgb"]);
    add("Nintendo - Game Boy Color", &[".gbc", ".gb"]);
    add("Nintendo - Game Boy Advance", &[".gba"]);
    add("Sega - Mega Drive - Genesis", &[".md", ".gen", ".smd", ".bin"]);
    add("MAME - Arcade", &[".zip"]);
    systems
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("RomCurator").required(false))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

impl AppConfig {
    /// Resolve a file extension to its system. Systems listing the extension
    /// first (primary) win over systems that merely also accept it, so e.g.
    /// ".gbc" lands on Game Boy Color even though Game Boy Color also reads
    /// plain ".gb" carts.
    pub fn category_for_extension(&self, extension: &str) -> Option<(&str, &SystemConfig)> {
        let extension = extension.to_lowercase();

        for (name, system) in &self.systems {
            if let Some(primary) = system.extensions.first() {
                if primary.eq_ignore_ascii_case(&extension) {
                    return Some((name.as_str(), system));
                }
            }
        }

        for (name, system) in &self.systems {
            if system
                .extensions
                .iter()
                .any(|e| e.eq_ignore_ascii_case(&extension))
            {
                return Some((name.as_str(), system));
            }
        }

        None
    }

    pub fn all_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self
            .systems
            .values()
            .flat_map(|s| s.extensions.iter().map(|e| e.to_lowercase()))
            .collect();
        extensions.sort();
        extensions.dedup();
        extensions
    }
}
