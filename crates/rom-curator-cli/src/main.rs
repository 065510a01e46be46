mod commands;
mod interactive;
mod logging;
mod playlist;
mod progress;

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use progress::CliReporter;
use rom_curator_core::catalog::{load_catalog, CatalogIndex};
use rom_curator_core::normalize::NameNormalizer;
use rom_curator_core::scanner;
use rom_curator_core::session::SessionOutcome;
use rom_curator_core::store::ReconciliationStore;
use rom_curator_core::{AppConfig, Error as CoreError, MatchSession};
use tracing::{error, info, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match rom_curator_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    match args.command {
        Some(Commands::Scan {
            path,
            no_fingerprint,
        }) => {
            if let Err(err) = run_scan(&config, path, no_fingerprint) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Resolve) => {
            if let Err(err) = run_resolve(&config) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Build) => {
            if let Err(err) = run_build(&config) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Status) => {
            if let Err(err) = run_status(&config) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn open_session(
    config: &AppConfig,
    normalizer: &NameNormalizer,
) -> Result<MatchSession, Box<dyn std::error::Error>> {
    let entries = load_catalog(&config.catalog_path)?;
    let index = CatalogIndex::build(entries, normalizer);
    let store = ReconciliationStore::from_config(&config.store);

    // A corrupted store file is never clobbered silently: offer to set it
    // aside and start that file fresh, or bail out so the user can repair
    // it by hand.
    loop {
        match store.load() {
            Ok(_) => break,
            Err(CoreError::StoreCorrupted { path, reason }) => {
                eprintln!(
                    "{} {} ({})",
                    "Store file is corrupted:".red(),
                    path.display(),
                    reason
                );
                if !prompt_confirm("Back it up and reinitialize?", Some(false))? {
                    return Err(CoreError::StoreCorrupted { path, reason }.into());
                }
                let backup = path.with_extension("json.bak");
                fs::rename(&path, &backup)?;
                println!("Backed up to {}", backup.display());
            }
            Err(other) => return Err(other.into()),
        }
    }

    Ok(MatchSession::new(index, config.matching.clone(), store)?)
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}

fn scan_and_match(
    config: &AppConfig,
    path: Option<PathBuf>,
    no_fingerprint: bool,
) -> Result<SessionOutcome, Box<dyn std::error::Error>> {
    let mut config = config.clone();
    if no_fingerprint {
        config.scan.fingerprint = false;
    }
    let root = path.unwrap_or_else(|| config.roms_path.clone());

    let normalizer = NameNormalizer::from_policy(&config.matching);
    let reporter = CliReporter::new();
    let items = scanner::collect_items(&config, &root, &normalizer, &reporter)?;

    let mut session = open_session(&config, &normalizer)?;
    let outcome = session.run(&items, &reporter)?;

    if outcome.catalog_empty {
        eprintln!(
            "{}",
            "Catalog is empty; every item was routed to the unresolved set.".yellow()
        );
    }
    for resolved in &outcome.resolved {
        for offer in &resolved.resolution.reresolution_offers {
            warn!(
                "{}: catalog now has a fingerprint-exact entry '{}' differing from the recorded override '{}'",
                resolved.item.filename, offer.name, resolved.resolution.entry.name,
            );
        }
    }

    Ok(outcome)
}

fn run_scan(
    config: &AppConfig,
    path: Option<PathBuf>,
    no_fingerprint: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = scan_and_match(config, path, no_fingerprint)?;

    println!();
    info!(
        "{} items: {} resolved ({} override, {} fingerprint, {} auto-accepted), {} unresolved",
        outcome.stats.total,
        format!("{}", outcome.resolved.len()).green(),
        outcome.stats.overridden,
        outcome.stats.fingerprint_matched,
        outcome.stats.auto_accepted,
        format!("{}", outcome.stats.unresolved).red(),
    );
    for (category, stats) in &outcome.stats.by_category {
        println!(
            "  {}: {}/{} resolved, {} variants",
            category, stats.resolved, stats.total, stats.variants
        );
    }
    if outcome.stats.unresolved > 0 {
        println!(
            "Run {} to review unresolved items.",
            "rom-curator resolve".cyan()
        );
    }

    Ok(())
}

fn run_resolve(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let normalizer = NameNormalizer::from_policy(&config.matching);
    let mut session = open_session(config, &normalizer)?;
    let summary = interactive::review_unresolved(&mut session)?;

    println!();
    println!(
        "{} recorded, {} skipped, {} still unresolved",
        summary.recorded.to_string().green(),
        summary.skipped.to_string().yellow(),
        summary.remaining.to_string().red(),
    );
    Ok(())
}

fn run_build(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = scan_and_match(config, None, false)?;

    let written = playlist::write_playlists(&outcome.resolved, config)?;
    if written.is_empty() {
        println!("No resolved items; nothing to write.");
        return Ok(());
    }

    println!();
    for (category, path) in &written {
        info!("Playlist written for {}: {}", category, path.display());
    }

    Ok(())
}

fn run_status(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let entries = load_catalog(&config.catalog_path)?;
    let store = ReconciliationStore::from_config(&config.store);
    let state = store.load()?;

    println!("Catalog entries:  {}", format!("{}", entries.len()).cyan());
    println!(
        "Overrides:        {}",
        format!("{}", state.overrides.len()).green()
    );
    println!(
        "Unresolved items: {}",
        format!("{}", state.unresolved.len()).red()
    );

    let annotated = state
        .unresolved
        .values()
        .filter(|r| r.has_human_input())
        .count();
    if annotated > 0 {
        println!("  with human-entered fields: {}", annotated);
    }

    let mut per_category: BTreeMap<&str, usize> = BTreeMap::new();
    for record in state.unresolved.values() {
        *per_category.entry(record.category.as_str()).or_default() += 1;
    }
    for (category, count) in per_category {
        println!("  {}: {}", category, count);
    }

    Ok(())
}
