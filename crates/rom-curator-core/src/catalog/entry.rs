use serde::{Deserialize, Serialize};

use crate::fingerprint::Fingerprint;

/// One reference-catalog record. Loaded once per session, read-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub name: String,
    /// Some catalog entries ship without a checksum; they are still
    /// reachable through name matching.
    #[serde(default)]
    pub fingerprint: Option<Fingerprint>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub release_year: Option<u16>,
    #[serde(default)]
    pub developer: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
}
