//! Error types for spreadsheet ingestion

/// Result type for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Error types for spreadsheet ingestion
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// A sheet could not be retrieved from its source
    #[error("Sheet '{sheet}' unavailable: {reason}")]
    SourceUnavailable { sheet: String, reason: String },

    /// A CSV record could not be decoded. The parser logs and skips these;
    /// the variant exists so the skip reason is reported uniformly.
    #[error("Malformed row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    /// The library could not be assembled from its sheets
    #[error("Ingestion failed: {0}")]
    IngestionFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Common(#[from] sparks_common::SparksError),
}

impl IngestError {
    pub fn source_unavailable(sheet: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        IngestError::SourceUnavailable {
            sheet: sheet.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<url::ParseError> for IngestError {
    fn from(err: url::ParseError) -> Self {
        IngestError::Config(format!("invalid URL: {}", err))
    }
}
