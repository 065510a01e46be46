use dashmap::DashMap;
use glob::Pattern;
use rayon::prelude::*;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, error};

use crate::config::AppConfig;
use crate::error::Error;
use crate::fingerprint::Fingerprint;
use crate::model::LocalItem;
use crate::normalize::NameNormalizer;
use crate::progress::ProgressReporter;

/// Parallel traversal of the collection root. Discovers files whose
/// extension maps to a configured system, fingerprints them (unless the
/// scan options skip it), and builds the batch of `LocalItem`s for one
/// matching session. Symlinks and 0-byte files are skipped; glob ignore
/// patterns apply to directories and files alike.
///
/// The returned items are sorted by path so the session is deterministic
/// regardless of traversal order.
pub fn collect_items(
    config: &AppConfig,
    root: &Path,
    normalizer: &NameNormalizer,
    reporter: &dyn ProgressReporter,
) -> Result<Vec<LocalItem>, Error> {
    if !root.is_dir() {
        return Err(Error::Other(format!(
            "scan path does not exist: {}",
            root.display()
        )));
    }

    let ignore_patterns: Vec<Pattern> = config
        .scan
        .ignore_patterns
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect();

    // Phase 1: discover files, grouped by system
    reporter.on_scan_start();
    let scan_start = Instant::now();
    let by_category: DashMap<String, Vec<PathBuf>> = DashMap::new();
    let found = AtomicUsize::new(0);
    visit_dirs(
        root,
        config,
        &ignore_patterns,
        &by_category,
        &found,
        reporter,
        config.scan.recursive,
    )?;
    let discovered: usize = by_category.iter().map(|entry| entry.value().len()).sum();
    let scan_duration = scan_start.elapsed();
    reporter.on_scan_complete(discovered, scan_duration.as_secs_f64());
    debug!(
        "Discovered {} files in {:.2}s",
        discovered,
        scan_duration.as_secs_f64()
    );

    // Phase 2: fingerprint and build items
    reporter.on_fingerprint_start();
    let fp_start = Instant::now();
    let inner_extensions: Vec<String> = config
        .all_extensions()
        .into_iter()
        .filter(|e| e != ".zip")
        .collect();

    let pairs: Vec<(String, PathBuf)> = by_category
        .into_iter()
        .flat_map(|(category, paths)| {
            paths.into_iter().map(move |p| (category.clone(), p))
        })
        .collect();

    let total = pairs.len();
    let done = AtomicUsize::new(0);
    let mut items: Vec<LocalItem> = pairs
        .par_iter()
        .map(|(category, path)| {
            let item = build_item(config, normalizer, category, path, &inner_extensions);
            let current = done.fetch_add(1, Ordering::Relaxed) + 1;
            reporter.on_fingerprint_progress(current, total);
            item
        })
        .collect();
    items.sort_by(|a, b| a.path.cmp(&b.path));

    let fingerprinted = items.iter().filter(|i| i.fingerprint.is_some()).count();
    reporter.on_fingerprint_complete(fingerprinted, fp_start.elapsed().as_secs_f64());

    Ok(items)
}

fn visit_dirs(
    dir: &Path,
    config: &AppConfig,
    ignore_patterns: &[Pattern],
    map: &DashMap<String, Vec<PathBuf>>,
    found: &AtomicUsize,
    reporter: &dyn ProgressReporter,
    recurse: bool,
) -> io::Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }

    if ignore_patterns
        .iter()
        .any(|pattern| pattern.matches_path(dir))
    {
        return Ok(());
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            if err.kind() == io::ErrorKind::PermissionDenied {
                error!("Access denied reading directory {}: {}", dir.display(), err);
                return Ok(());
            } else {
                return Err(io::Error::new(
                    err.kind(),
                    format!("Error reading directory {}: {}", dir.display(), err),
                ));
            }
        }
    };

    entries.par_bridge().try_for_each(|entry_result| -> io::Result<()> {
        let entry = entry_result.map_err(|err| {
            io::Error::new(
                err.kind(),
                format!("Error reading entry in directory {}: {}", dir.display(), err),
            )
        })?;

        let path = entry.path();
        let metadata = match fs::symlink_metadata(&path) {
            Ok(metadata) => metadata,
            Err(err) => {
                error!("Error getting metadata for {}: {}", path.display(), err);
                return Ok(());
            }
        };

        if metadata.is_dir() {
            if recurse {
                visit_dirs(&path, config, ignore_patterns, map, found, reporter, recurse)?;
            }
        } else if metadata.is_file() && metadata.len() > 0 {
            if ignore_patterns
                .iter()
                .any(|pattern| pattern.matches_path(&path))
            {
                return Ok(());
            }
            let extension = match path.extension() {
                Some(ext) => format!(".{}", ext.to_string_lossy().to_lowercase()),
                None => return Ok(()),
            };
            match config.category_for_extension(&extension) {
                Some((category, _)) => {
                    map.entry(category.to_string()).or_default().push(path.clone());
                    let count = found.fetch_add(1, Ordering::Relaxed) + 1;
                    reporter.on_scan_progress(count, &path.to_string_lossy());
                }
                None => {
                    debug!(
                        "No system configured for extension {} ({})",
                        extension,
                        path.display()
                    );
                }
            }
        }
        Ok(())
    })?;

    Ok(())
}

fn build_item(
    config: &AppConfig,
    normalizer: &NameNormalizer,
    category: &str,
    path: &Path,
    inner_extensions: &[String],
) -> LocalItem {
    let size = match fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(err) => {
            error!("Error reading metadata for {}: {}", path.display(), err);
            0
        }
    };

    let fingerprint = if config.scan.fingerprint {
        compute_fingerprint(path, inner_extensions)
    } else {
        None
    };

    LocalItem::from_scan(
        path.to_path_buf(),
        category.to_string(),
        size,
        fingerprint,
        normalizer,
    )
}

/// A fingerprinting failure degrades the item to name-based identity; it
/// never fails the scan.
fn compute_fingerprint(path: &Path, inner_extensions: &[String]) -> Option<Fingerprint> {
    let is_zip = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("zip"))
        .unwrap_or(false);

    let result = if is_zip {
        zip_stored_crc(path, inner_extensions)
    } else {
        file_crc(path).map(Some)
    };

    match result {
        Ok(fingerprint) => fingerprint,
        Err(err) => {
            error!("Error fingerprinting '{}': {}", path.display(), err);
            None
        }
    }
}

fn file_crc(path: &Path) -> io::Result<Fingerprint> {
    let mut file = File::open(path)?;
    Fingerprint::from_reader(&mut file)
}

/// The zip central directory already stores each member's CRC-32, so the
/// checksum of the first ROM-extension member is read without
/// decompressing anything.
fn zip_stored_crc(path: &Path, inner_extensions: &[String]) -> io::Result<Option<Fingerprint>> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    for i in 0..archive.len() {
        let member = archive
            .by_index(i)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if member.is_dir() {
            continue;
        }
        let name = member.name().to_lowercase();
        if inner_extensions.iter().any(|ext| name.ends_with(ext.as_str())) {
            return Ok(Some(Fingerprint::from_raw(member.crc32())));
        }
    }
    Ok(None)
}
