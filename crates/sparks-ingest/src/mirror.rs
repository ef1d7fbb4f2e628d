//! Asset mirror
//!
//! Copies each track's audio from the link in its rank's data sheet to
//! `{output}/tracks/{rank}/{track}.mp3`. Files already present (and larger
//! than [`MIN_COMPLETE_FILE_BYTES`]) are left alone, so an interrupted run can
//! simply be started again.

use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use reqwest::Client;
use sparks_common::RankId;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{SheetsConfig, USER_AGENT};
use crate::error::{IngestError, Result};
use crate::metadata::TrackMetaTable;
use crate::rows::parse_rows;
use crate::source::CsvSource;

/// Direct-download endpoint for Drive files
pub const DEFAULT_DRIVE_DOWNLOAD_URL: &str = "https://drive.google.com/uc";

/// Anything at or below this size is treated as an incomplete download
pub const MIN_COMPLETE_FILE_BYTES: u64 = 1000;

/// Per-file download timeout
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300;

static DRIVE_PATH_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/d/([a-zA-Z0-9_-]+)").expect("valid Drive path pattern"));
static DRIVE_QUERY_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"id=([a-zA-Z0-9_-]+)").expect("valid Drive query pattern"));

/// Pull the file id out of a Drive share link.
///
/// Accepts `.../file/d/{id}/view` and `...?id={id}` forms.
pub fn extract_drive_id(link: &str) -> Option<&str> {
    DRIVE_PATH_ID
        .captures(link)
        .or_else(|| DRIVE_QUERY_ID.captures(link))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// What to mirror and where
#[derive(Debug, Clone)]
pub struct MirrorOptions {
    pub output_root: PathBuf,
    pub download_url: String,
    /// Ranks to mirror, in order
    pub ranks: Vec<RankId>,
    /// Download even when a complete-looking file exists
    pub force: bool,
    pub timeout_secs: u64,
    pub show_progress: bool,
}

impl MirrorOptions {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            download_url: DEFAULT_DRIVE_DOWNLOAD_URL.to_string(),
            ranks: RankId::ALL.to_vec(),
            force: false,
            timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            show_progress: true,
        }
    }

    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = url.into();
        self
    }

    pub fn with_ranks(mut self, ranks: Vec<RankId>) -> Self {
        self.ranks = ranks;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn rank_dir(&self, rank: RankId) -> PathBuf {
        self.output_root.join("tracks").join(rank.as_str())
    }

    /// Destination of one track under the output root
    pub fn destination(&self, rank: RankId, track_id: &str) -> PathBuf {
        self.output_root.join(rank.media_path(track_id))
    }
}

/// Outcome counts of a mirror run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorStats {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl MirrorStats {
    pub fn total(&self) -> usize {
        self.downloaded + self.skipped + self.failed
    }
}

impl std::fmt::Display for MirrorStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} downloaded, {} skipped, {} failed",
            self.downloaded, self.skipped, self.failed
        )
    }
}

/// Downloads track audio listed in the data sheets
pub struct AssetMirror {
    source: Arc<dyn CsvSource>,
    config: SheetsConfig,
    options: MirrorOptions,
    client: Client,
    download_url: Url,
}

impl AssetMirror {
    pub fn new(source: Arc<dyn CsvSource>, config: SheetsConfig, options: MirrorOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        let download_url = Url::parse(&options.download_url)?;

        Ok(Self {
            source,
            config,
            options,
            client,
            download_url,
        })
    }

    /// Mirror every selected rank.
    ///
    /// A data sheet that cannot be fetched aborts the run; a single track
    /// that fails to download does not.
    pub async fn run(&self) -> Result<MirrorStats> {
        let mut stats = MirrorStats::default();

        for &rank in &self.options.ranks {
            let sheet = &self.config.sheets(rank).data;
            let csv = self.source.fetch_csv(sheet).await?;
            let table = TrackMetaTable::from_rows(rank, &parse_rows(&csv));

            info!(rank = %rank, tracks = table.len(), "Mirroring rank");
            self.mirror_rank(rank, &table, &mut stats).await?;
        }

        info!(
            downloaded = stats.downloaded,
            skipped = stats.skipped,
            failed = stats.failed,
            "Mirror complete"
        );
        Ok(stats)
    }

    async fn mirror_rank(&self, rank: RankId, table: &TrackMetaTable, stats: &mut MirrorStats) -> Result<()> {
        tokio::fs::create_dir_all(self.options.rank_dir(rank)).await?;

        for (track_id, meta) in table.for_rank(rank) {
            if !is_safe_file_stem(track_id) {
                warn!(rank = %rank, track = track_id, "Track id is not usable as a file name");
                stats.skipped += 1;
                continue;
            }

            let Some(file_id) = meta.remote_link.as_deref().and_then(extract_drive_id) else {
                debug!(rank = %rank, track = track_id, "No downloadable link");
                stats.skipped += 1;
                continue;
            };

            let dest = self.options.destination(rank, track_id);
            if !self.options.force && is_complete(&dest).await {
                debug!(path = %dest.display(), "Already present");
                stats.skipped += 1;
                continue;
            }

            match self.download(file_id, &dest).await {
                Ok(bytes) => {
                    debug!(rank = %rank, track = track_id, bytes, "Downloaded");
                    stats.downloaded += 1;
                },
                Err(e) => {
                    warn!(rank = %rank, track = track_id, error = %e, "Download failed");
                    stats.failed += 1;
                },
            }
        }

        Ok(())
    }

    /// Direct-download URL for a Drive file id
    pub fn file_url(&self, file_id: &str) -> Url {
        let mut url = self.download_url.clone();
        url.query_pairs_mut()
            .append_pair("export", "download")
            .append_pair("id", file_id);
        url
    }

    /// Download into `{dest}.part`, renaming over `dest` only once complete
    async fn download(&self, file_id: &str, dest: &Path) -> Result<u64> {
        let partial = partial_path(dest);
        let result = self.download_to(file_id, &partial).await;

        match result {
            Ok(bytes) => {
                tokio::fs::rename(&partial, dest).await?;
                Ok(bytes)
            },
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(&partial).await {
                    if remove_err.kind() != std::io::ErrorKind::NotFound {
                        warn!(path = %partial.display(), error = %remove_err, "Could not remove partial file");
                    }
                }
                Err(e)
            },
        }
    }

    async fn download_to(&self, file_id: &str, dest: &Path) -> Result<u64> {
        let url = self.file_url(file_id);
        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(IngestError::source_unavailable(
                url.to_string(),
                format!("HTTP {}", response.status()),
            ));
        }

        let pb = self.progress_bar(response.content_length().unwrap_or(0), dest)?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            pb.set_position(downloaded);
        }
        file.flush().await?;

        pb.finish_and_clear();
        Ok(downloaded)
    }

    fn progress_bar(&self, total: u64, dest: &Path) -> Result<ProgressBar> {
        if !self.options.show_progress {
            return Ok(ProgressBar::hidden());
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                .map_err(|e| IngestError::Config(format!("progress template: {}", e)))?
                .progress_chars("#>-"),
        );
        pb.set_message(format!("Downloading {}", dest.display()));
        Ok(pb)
    }
}

/// Track ids become file names; refuse anything that could leave the rank directory
fn is_safe_file_stem(track_id: &str) -> bool {
    !track_id.is_empty() && !track_id.starts_with('.') && !track_id.contains(['/', '\\'])
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

async fn is_complete(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.len() > MIN_COMPLETE_FILE_BYTES)
        .unwrap_or(false)
}
