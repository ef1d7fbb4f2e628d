//! Data access facade
//!
//! The single call the player uses to load its library. Every call fetches
//! all six sheets concurrently and rebuilds the tree from scratch; nothing is
//! cached between calls.

use sparks_common::{AudioData, RankId};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::assembly::{build_library, RankSources};
use crate::config::SheetsConfig;
use crate::error::{IngestError, Result};
use crate::source::{CsvSource, GoogleSheetsSource};

/// Loads the audio library from its configured sheets
#[derive(Clone)]
pub struct AudioLibrary {
    source: Arc<dyn CsvSource>,
    config: SheetsConfig,
}

impl AudioLibrary {
    pub fn new(source: Arc<dyn CsvSource>, config: SheetsConfig) -> Self {
        Self { source, config }
    }

    /// Library backed by the published Google Sheets
    pub fn from_config(config: SheetsConfig) -> Result<Self> {
        config.validate()?;
        let source = GoogleSheetsSource::new(&config)?;
        Ok(Self::new(Arc::new(source), config))
    }

    pub fn config(&self) -> &SheetsConfig {
        &self.config
    }

    /// Fetch and assemble the library.
    ///
    /// Never fails: any error is logged and the empty library is returned.
    /// Callers treat an empty result as "content unavailable".
    pub async fn fetch_audio_data(&self) -> AudioData {
        self.fetch_audio_data_with_cancel(&CancellationToken::new()).await
    }

    /// Like [`fetch_audio_data`](Self::fetch_audio_data), abandoning the
    /// fetch when `cancel` fires
    pub async fn fetch_audio_data_with_cancel(&self, cancel: &CancellationToken) -> AudioData {
        match self.try_fetch_audio_data(cancel).await {
            Ok(data) => data,
            Err(e) => {
                error!(error = %e, "Failed to load audio library, returning empty result");
                AudioData::empty()
            },
        }
    }

    /// Fetch and assemble the library, reporting why it failed
    pub async fn try_fetch_audio_data(&self, cancel: &CancellationToken) -> Result<AudioData> {
        let started = Instant::now();

        let deadline = async {
            match self.config.deadline_secs {
                Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                None => std::future::pending::<()>().await,
            }
        };

        let sources = tokio::select! {
            result = self.fetch_all() => result?,
            _ = cancel.cancelled() => {
                return Err(IngestError::IngestionFailed("fetch cancelled".to_string()));
            },
            _ = deadline => {
                return Err(IngestError::IngestionFailed(format!(
                    "fetch did not finish within {}s",
                    self.config.deadline_secs.unwrap_or_default()
                )));
            },
        };

        let data = build_library(&sources)?;

        info!(
            tracks = data.track_count(),
            raw_count = data.raw_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Loaded audio library"
        );

        Ok(data)
    }

    /// Issue all six fetches at once; the first failure wins
    async fn fetch_all(&self) -> Result<Vec<RankSources>> {
        let hangglider = self.config.sheets(RankId::HangGlider);
        let wingrunner = self.config.sheets(RankId::WingRunner);
        let skystormer = self.config.sheets(RankId::SkyStormer);

        let (hg_structure, hg_data, wr_structure, wr_data, ss_structure, ss_data) = futures::try_join!(
            self.source.fetch_csv(&hangglider.structure),
            self.source.fetch_csv(&hangglider.data),
            self.source.fetch_csv(&wingrunner.structure),
            self.source.fetch_csv(&wingrunner.data),
            self.source.fetch_csv(&skystormer.structure),
            self.source.fetch_csv(&skystormer.data),
        )?;

        Ok(vec![
            RankSources::new(RankId::HangGlider, hg_structure, hg_data),
            RankSources::new(RankId::WingRunner, wr_structure, wr_data),
            RankSources::new(RankId::SkyStormer, ss_structure, ss_data),
        ])
    }
}
