use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::fingerprint::Fingerprint;
use crate::normalize::{NameNormalizer, Variant};

/// One file under management, as produced by the traversal phase.
///
/// Immutable once built; lives for one scan/match session. The fingerprint
/// (when present) plus path act as a stable identity across sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalItem {
    pub path: PathBuf,
    pub filename: String,
    pub category: String,
    pub size: u64,
    /// None when fingerprinting was skipped or failed; identity then falls
    /// back to the normalized name. Reduced confidence, not an error.
    pub fingerprint: Option<Fingerprint>,
    pub base_name: String,
    pub region: Option<String>,
    pub variant: Variant,
}

impl LocalItem {
    pub fn from_scan(
        path: PathBuf,
        category: String,
        size: u64,
        fingerprint: Option<Fingerprint>,
        normalizer: &NameNormalizer,
    ) -> Self {
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        let normalized = normalizer.normalize(&filename);
        LocalItem {
            path,
            filename,
            category,
            size,
            fingerprint,
            base_name: normalized.base,
            region: normalized.region,
            variant: normalized.variant,
        }
    }
}
