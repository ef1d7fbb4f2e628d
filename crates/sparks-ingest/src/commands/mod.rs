//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod fetch;
pub mod mirror;
pub mod progress;

use std::path::PathBuf;
use std::sync::Arc;

use crate::source::{CsvSource, DirectorySource, GoogleSheetsSource};
use crate::{Result, SheetsConfig};

/// Local CSV directory when given, published sheets otherwise
fn select_source(config: &SheetsConfig, local_dir: Option<PathBuf>) -> Result<Arc<dyn CsvSource>> {
    Ok(match local_dir {
        Some(dir) => Arc::new(DirectorySource::new(dir)),
        None => Arc::new(GoogleSheetsSource::new(config)?),
    })
}
