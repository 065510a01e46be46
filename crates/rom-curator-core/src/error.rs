use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Malformed persisted state. Deliberately distinct from "empty store"
    /// so callers can back up the file instead of reinitializing over it.
    #[error("Store file {path} is corrupted: {reason}")]
    StoreCorrupted { path: PathBuf, reason: String },

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("{0}")]
    Other(String),
}
