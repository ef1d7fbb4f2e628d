//! `sparks-ingest fetch` command implementation
//!
//! Loads the library and writes it as JSON. The empty library is still
//! written, but the command then fails so scripts notice.

use std::path::PathBuf;
use tracing::info;

use super::select_source;
use crate::error::{IngestError, Result};
use crate::{AudioLibrary, SheetsConfig};

pub async fn run(output: Option<PathBuf>, local_dir: Option<PathBuf>, compact: bool) -> Result<()> {
    let config = SheetsConfig::from_env()?;
    let source = select_source(&config, local_dir)?;
    let library = AudioLibrary::new(source, config);

    let data = library.fetch_audio_data().await;

    let json = if compact {
        serde_json::to_string(&data)?
    } else {
        serde_json::to_string_pretty(&data)?
    };

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, format!("{}\n", json)).await?;
            info!(path = %path.display(), tracks = data.track_count(), "Wrote library");
        },
        None => println!("{}", json),
    }

    if data.is_empty() {
        return Err(IngestError::IngestionFailed(
            "no content available, see the log for the cause".to_string(),
        ));
    }

    Ok(())
}
