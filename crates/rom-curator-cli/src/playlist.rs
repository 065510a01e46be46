use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::Serialize;

use rom_curator_core::session::ResolvedItem;
use rom_curator_core::AppConfig;

#[derive(Serialize)]
struct Playlist {
    version: &'static str,
    name: String,
    items: Vec<PlaylistItem>,
}

#[derive(Serialize)]
struct PlaylistItem {
    path: String,
    label: String,
    fingerprint: String,
    category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    db_name: Option<String>,
}

/// Write one playlist per system from the session's resolved mapping.
///
/// The label is the resolved canonical name (an override's name when one
/// exists, since overrides resolve ahead of everything else). The recorded
/// fingerprint prefers the catalog entry's checksum over the local file's
/// (a hack resolves to its canonical game) and falls back to "DETECT" when
/// neither side has one.
pub fn write_playlists(
    resolved: &[ResolvedItem],
    config: &AppConfig,
) -> Result<Vec<(String, PathBuf)>, Box<dyn std::error::Error>> {
    fs::create_dir_all(&config.playlists_path)?;

    let mut by_category: BTreeMap<String, Vec<&ResolvedItem>> = BTreeMap::new();
    for item in resolved {
        by_category
            .entry(item.item.category.clone())
            .or_default()
            .push(item);
    }

    let mut written = Vec::new();
    for (category, items) in by_category {
        let db_name = config
            .systems
            .get(&category)
            .and_then(|s| s.db_name.clone());

        let playlist = Playlist {
            version: "1.0",
            name: category.clone(),
            items: items
                .iter()
                .map(|r| {
                    let fingerprint = r
                        .resolution
                        .entry
                        .fingerprint
                        .or(r.item.fingerprint)
                        .map(|f| f.to_string())
                        .unwrap_or_else(|| "DETECT".to_string());
                    PlaylistItem {
                        path: r.item.path.to_string_lossy().into_owned(),
                        label: r.resolution.entry.name.clone(),
                        fingerprint,
                        category: category.clone(),
                        db_name: db_name.clone(),
                    }
                })
                .collect(),
        };

        let output = config.playlists_path.join(format!("{}.lpl", category));
        fs::write(&output, serde_json::to_string_pretty(&playlist)?)?;
        written.push((category, output));
    }

    Ok(written)
}
