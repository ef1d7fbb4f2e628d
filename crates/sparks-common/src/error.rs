//! Error types shared across Sparks crates

use thiserror::Error;

/// Result type alias for shared Sparks operations
pub type Result<T> = std::result::Result<T, SparksError>;

/// Main error type for the shared crate
#[derive(Error, Debug)]
pub enum SparksError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown rank: {0} (expected hangglider, wingrunner or skystormer)")]
    UnknownRank(String),

    #[error("Invalid progress value: {0}")]
    InvalidProgress(String),
}
