use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "rom-curator")]
#[command(about = "Reconcile a ROM collection against a reference catalog", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan the collection and match items against the catalog
    Scan {
        /// Directory to scan (defaults to the configured roms_path)
        path: Option<PathBuf>,
        /// Skip content fingerprinting and match by name only
        #[arg(long)]
        no_fingerprint: bool,
    },
    /// Review unresolved items interactively and record overrides
    Resolve,
    /// Scan, match, and generate playlists from the resolved collection
    Build,
    /// Show catalog and reconciliation store counts
    Status,
    /// Print configuration values
    PrintConfig,
}
