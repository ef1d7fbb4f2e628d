//! Sheet configuration
//!
//! Which spreadsheets hold each rank's structure and track data, and how to
//! reach them. Defaults point at the published production sheets; every value
//! can be overridden from the environment (or a `.env` file).

use serde::{Deserialize, Serialize};
use sparks_common::RankId;

use crate::error::{IngestError, Result};

// ============================================================================
// Configuration Constants
// ============================================================================

/// Published-sheet endpoint root; sheet ids are appended as path segments.
pub const DEFAULT_SHEETS_BASE_URL: &str = "https://docs.google.com/spreadsheets/d";

/// Default HTTP client timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// User agent sent with every sheet request.
pub const USER_AGENT: &str = concat!("sparks-ingest/", env!("CARGO_PKG_VERSION"));

const WING_RUNNER_STRUCTURE_ID: &str = "1siBKZaKQYr4DBXvvR7lzN1hsUC1UFMWiNVjPSfavasc";
const SKY_STORMER_STRUCTURE_ID: &str = "1htICnuNXXy_KrVXYU-q2qHKGtZ0fuHZ8VizBrJaiJb4";
const HANG_GLIDER_STRUCTURE_ID: &str = "194yAShJebCjGJiVO6ODUrOpZuXbZ_UQjlhE1wI83qZ0";

const WING_RUNNER_DATA_ID: &str = "1kJ1ycExJ5aOZT1NB4NoqHjBaEXVgn3naz-ESI0JJhX4";
const SKY_STORMER_DATA_ID: &str = "11TY3G_8L0fjXzfHnMGFkEyp6ivm1hUOY-YT5uw58HOM";
const HANG_GLIDER_DATA_ID: &str = "13wzeAuYUxw24V-LcRMcEydSS0qrJL9tZxrSRfwrjLoU";

/// A single published sheet, optionally narrowed to one tab
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SheetRef {
    pub sheet_id: String,
    #[serde(default)]
    pub tab: Option<String>,
}

impl SheetRef {
    pub fn new(sheet_id: impl Into<String>) -> Self {
        Self {
            sheet_id: sheet_id.into(),
            tab: None,
        }
    }

    pub fn with_tab(mut self, tab: impl Into<String>) -> Self {
        self.tab = Some(tab.into());
        self
    }
}

impl std::fmt::Display for SheetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.tab {
            Some(tab) => write!(f, "{}[{}]", self.sheet_id, tab),
            None => write!(f, "{}", self.sheet_id),
        }
    }
}

/// The two sheets describing one rank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankSheets {
    /// Stage / unit hierarchy with track references
    pub structure: SheetRef,
    /// Track titles and media links
    pub data: SheetRef,
}

/// Sheet locations and transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Give up on the whole fetch after this many seconds (None = no limit)
    pub deadline_secs: Option<u64>,
    pub hangglider: RankSheets,
    pub wingrunner: RankSheets,
    pub skystormer: RankSheets,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SHEETS_BASE_URL.to_string(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            deadline_secs: None,
            hangglider: RankSheets {
                structure: SheetRef::new(HANG_GLIDER_STRUCTURE_ID),
                data: SheetRef::new(HANG_GLIDER_DATA_ID),
            },
            wingrunner: RankSheets {
                structure: SheetRef::new(WING_RUNNER_STRUCTURE_ID),
                data: SheetRef::new(WING_RUNNER_DATA_ID).with_tab("audio_stream"),
            },
            skystormer: RankSheets {
                structure: SheetRef::new(SKY_STORMER_STRUCTURE_ID),
                data: SheetRef::new(SKY_STORMER_DATA_ID).with_tab("Sheet1"),
            },
        }
    }
}

impl SheetsConfig {
    pub fn builder() -> SheetsConfigBuilder {
        SheetsConfigBuilder::default()
    }

    /// Load configuration from defaults, `.env` and the process environment
    ///
    /// Environment variables:
    /// - `SPARKS_SHEETS_BASE_URL`: published-sheet endpoint root
    /// - `SPARKS_HTTP_TIMEOUT_SECS`: per-request timeout
    /// - `SPARKS_FETCH_DEADLINE_SECS`: overall fetch deadline
    /// - `SPARKS_{RANK}_STRUCTURE_ID`, `SPARKS_{RANK}_STRUCTURE_TAB`
    /// - `SPARKS_{RANK}_DATA_ID`, `SPARKS_{RANK}_DATA_TAB`
    ///
    /// where `{RANK}` is `HANGGLIDER`, `WINGRUNNER` or `SKYSTORMER`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::default().with_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup. Empty values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let get_u64 = |key: &str| -> Result<Option<u64>> {
            get(key)
                .map(|v| {
                    v.parse::<u64>()
                        .map_err(|_| IngestError::Config(format!("{} must be a number, got '{}'", key, v)))
                })
                .transpose()
        };

        if let Some(url) = get("SPARKS_SHEETS_BASE_URL") {
            self.base_url = url;
        }
        if let Some(secs) = get_u64("SPARKS_HTTP_TIMEOUT_SECS")? {
            self.timeout_secs = secs;
        }
        if let Some(secs) = get_u64("SPARKS_FETCH_DEADLINE_SECS")? {
            self.deadline_secs = Some(secs);
        }

        for rank in RankId::ALL {
            let prefix = format!("SPARKS_{}", rank.as_str().to_uppercase());
            let sheets = self.sheets_mut(rank);

            if let Some(id) = get(&format!("{}_STRUCTURE_ID", prefix)) {
                sheets.structure.sheet_id = id;
            }
            if let Some(tab) = get(&format!("{}_STRUCTURE_TAB", prefix)) {
                sheets.structure.tab = Some(tab);
            }
            if let Some(id) = get(&format!("{}_DATA_ID", prefix)) {
                sheets.data.sheet_id = id;
            }
            if let Some(tab) = get(&format!("{}_DATA_TAB", prefix)) {
                sheets.data.tab = Some(tab);
            }
        }

        Ok(self)
    }

    pub fn sheets(&self, rank: RankId) -> &RankSheets {
        match rank {
            RankId::HangGlider => &self.hangglider,
            RankId::WingRunner => &self.wingrunner,
            RankId::SkyStormer => &self.skystormer,
        }
    }

    fn sheets_mut(&mut self, rank: RankId) -> &mut RankSheets {
        match rank {
            RankId::HangGlider => &mut self.hangglider,
            RankId::WingRunner => &mut self.wingrunner,
            RankId::SkyStormer => &mut self.skystormer,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(IngestError::Config("Sheets base URL cannot be empty".to_string()));
        }

        if self.timeout_secs == 0 {
            return Err(IngestError::Config("HTTP timeout must be greater than 0".to_string()));
        }

        if self.deadline_secs == Some(0) {
            return Err(IngestError::Config("Fetch deadline must be greater than 0".to_string()));
        }

        for rank in RankId::ALL {
            let sheets = self.sheets(rank);
            if sheets.structure.sheet_id.trim().is_empty() {
                return Err(IngestError::Config(format!("{} structure sheet id is empty", rank)));
            }
            if sheets.data.sheet_id.trim().is_empty() {
                return Err(IngestError::Config(format!("{} data sheet id is empty", rank)));
            }
        }

        Ok(())
    }
}

/// Builder for SheetsConfig
#[derive(Debug, Default)]
pub struct SheetsConfigBuilder {
    config: SheetsConfig,
}

impl SheetsConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn deadline_secs(mut self, secs: u64) -> Self {
        self.config.deadline_secs = Some(secs);
        self
    }

    pub fn rank(mut self, rank: RankId, sheets: RankSheets) -> Self {
        *self.config.sheets_mut(rank) = sheets;
        self
    }

    pub fn build(self) -> SheetsConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = SheetsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.wingrunner.data.tab.as_deref(), Some("audio_stream"));
        assert_eq!(config.skystormer.data.tab.as_deref(), Some("Sheet1"));
        assert_eq!(config.hangglider.data.tab, None);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("SPARKS_SHEETS_BASE_URL", "http://localhost:9000/d"),
            ("SPARKS_HTTP_TIMEOUT_SECS", "5"),
            ("SPARKS_FETCH_DEADLINE_SECS", "60"),
            ("SPARKS_WINGRUNNER_DATA_TAB", "tracks"),
            ("SPARKS_SKYSTORMER_STRUCTURE_ID", "abc123"),
            ("SPARKS_HANGGLIDER_DATA_ID", "   "),
        ]
        .into_iter()
        .collect();

        let config = SheetsConfig::default()
            .with_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.base_url, "http://localhost:9000/d");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.deadline_secs, Some(60));
        assert_eq!(config.wingrunner.data.tab.as_deref(), Some("tracks"));
        assert_eq!(config.skystormer.structure.sheet_id, "abc123");
        // Blank values leave the default in place
        assert_eq!(config.hangglider.data.sheet_id, HANG_GLIDER_DATA_ID);
    }

    #[test]
    fn test_override_rejects_bad_number() {
        let result = SheetsConfig::default().with_overrides(|k| {
            (k == "SPARKS_HTTP_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(IngestError::Config(_))));
    }

    #[test]
    fn test_validate() {
        assert!(SheetsConfig::builder().timeout_secs(0).build().validate().is_err());
        assert!(SheetsConfig::builder().base_url("").build().validate().is_err());
        assert!(SheetsConfig::builder().deadline_secs(0).build().validate().is_err());

        let config = SheetsConfig::builder()
            .rank(
                RankId::WingRunner,
                RankSheets {
                    structure: SheetRef::new("s"),
                    data: SheetRef::new(""),
                },
            )
            .build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sheet_ref_display() {
        assert_eq!(SheetRef::new("abc").to_string(), "abc");
        assert_eq!(SheetRef::new("abc").with_tab("Sheet1").to_string(), "abc[Sheet1]");
    }
}
