//! CSV sources
//!
//! A source turns a [`SheetRef`] into the raw CSV text published for it.
//! Sources never retry and never cache: every call reads the current content.

use async_trait::async_trait;
use reqwest::{header, Client};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::{SheetRef, SheetsConfig, USER_AGENT};
use crate::error::{IngestError, Result};

/// Anything that can produce the CSV text of a sheet
#[async_trait]
pub trait CsvSource: Send + Sync {
    /// Fetch the raw CSV for a sheet (and tab, if set)
    async fn fetch_csv(&self, sheet: &SheetRef) -> Result<String>;
}

// ============================================================================
// Google Sheets
// ============================================================================

/// Reads the CSV export of published Google Sheets
pub struct GoogleSheetsSource {
    client: Client,
    base_url: Url,
}

impl GoogleSheetsSource {
    pub fn new(config: &SheetsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: Url::parse(&config.base_url)?,
        })
    }

    /// Export URL for a sheet: `{base}/{id}/gviz/tq?tqx=out:csv[&sheet={tab}]`
    pub fn sheet_url(&self, sheet: &SheetRef) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| IngestError::Config(format!("base URL cannot take a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend([sheet.sheet_id.as_str(), "gviz", "tq"]);

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("tqx", "out:csv");
            if let Some(tab) = &sheet.tab {
                query.append_pair("sheet", tab);
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl CsvSource for GoogleSheetsSource {
    async fn fetch_csv(&self, sheet: &SheetRef) -> Result<String> {
        let url = self.sheet_url(sheet)?;
        debug!(sheet = %sheet, url = %url, "Fetching sheet");

        let response = self
            .client
            .get(url)
            .header(header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| IngestError::source_unavailable(sheet.to_string(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::source_unavailable(
                sheet.to_string(),
                format!("HTTP {}", status),
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| IngestError::source_unavailable(sheet.to_string(), e))?;

        debug!(sheet = %sheet, bytes = text.len(), "Fetched sheet");
        Ok(text)
    }
}

// ============================================================================
// Local Directory
// ============================================================================

/// Reads pre-exported CSV files from a directory.
///
/// A sheet maps to `{dir}/{sheet_id}.csv`, or `{dir}/{sheet_id}__{tab}.csv`
/// when a tab is set.
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn file_path(&self, sheet: &SheetRef) -> PathBuf {
        let name = match &sheet.tab {
            Some(tab) => format!("{}__{}.csv", sheet.sheet_id, tab),
            None => format!("{}.csv", sheet.sheet_id),
        };
        self.dir.join(name)
    }
}

#[async_trait]
impl CsvSource for DirectorySource {
    async fn fetch_csv(&self, sheet: &SheetRef) -> Result<String> {
        let path = self.file_path(sheet);
        debug!(sheet = %sheet, path = %path.display(), "Reading sheet from disk");

        tokio::fs::read_to_string(&path).await.map_err(|e| {
            IngestError::source_unavailable(sheet.to_string(), format!("{}: {}", path.display(), e))
        })
    }
}

// ============================================================================
// In Memory
// ============================================================================

/// Serves fixed CSV text, keyed by sheet reference
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    sheets: HashMap<SheetRef, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, sheet: SheetRef, csv: impl Into<String>) -> Self {
        self.sheets.insert(sheet, csv.into());
        self
    }
}

#[async_trait]
impl CsvSource for MemorySource {
    async fn fetch_csv(&self, sheet: &SheetRef) -> Result<String> {
        self.sheets
            .get(sheet)
            .cloned()
            .ok_or_else(|| IngestError::source_unavailable(sheet.to_string(), "no such sheet"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(base: &str) -> GoogleSheetsSource {
        GoogleSheetsSource::new(&SheetsConfig::builder().base_url(base).build()).unwrap()
    }

    #[test]
    fn test_sheet_url_without_tab() {
        let url = source("https://docs.google.com/spreadsheets/d")
            .sheet_url(&SheetRef::new("abc"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://docs.google.com/spreadsheets/d/abc/gviz/tq?tqx=out%3Acsv"
        );
    }

    #[test]
    fn test_sheet_url_with_tab_is_encoded() {
        let url = source("http://localhost:8080/d/")
            .sheet_url(&SheetRef::new("abc").with_tab("Audio Stream"))
            .unwrap();
        assert_eq!(url.path(), "/d/abc/gviz/tq");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("tqx".to_string(), "out:csv".to_string()),
                ("sheet".to_string(), "Audio Stream".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_directory_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc.csv"), "a,b\n1,2\n").unwrap();
        std::fs::write(dir.path().join("abc__Sheet1.csv"), "tab\n").unwrap();

        let source = DirectorySource::new(dir.path());
        assert_eq!(source.fetch_csv(&SheetRef::new("abc")).await.unwrap(), "a,b\n1,2\n");
        assert_eq!(
            source.fetch_csv(&SheetRef::new("abc").with_tab("Sheet1")).await.unwrap(),
            "tab\n"
        );

        let missing = source.fetch_csv(&SheetRef::new("zzz")).await;
        assert!(matches!(missing, Err(IngestError::SourceUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_memory_source() {
        let source = MemorySource::new().with_sheet(SheetRef::new("abc"), "x\n");
        assert_eq!(source.fetch_csv(&SheetRef::new("abc")).await.unwrap(), "x\n");
        assert!(source.fetch_csv(&SheetRef::new("abc").with_tab("t")).await.is_err());
    }
}
