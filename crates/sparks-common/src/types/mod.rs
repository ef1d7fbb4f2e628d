//! Domain types for the Sparks audio library
//!
//! The library is a three-level tree: a fixed set of [`Rank`]s, each holding
//! ordered [`Stage`]s, each holding ordered [`Unit`]s, each holding ordered
//! [`Track`]s. All values are plain data once assembled. Field names are
//! serialized in camelCase because that is what the player front end reads.

use serde::{Deserialize, Serialize};

// ============================================================================
// Ranks
// ============================================================================

/// One of the three curriculum tracks.
///
/// The declaration order is the display order of the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankId {
    HangGlider,
    WingRunner,
    SkyStormer,
}

impl RankId {
    /// All ranks in declared order
    pub const ALL: [RankId; 3] = [RankId::HangGlider, RankId::WingRunner, RankId::SkyStormer];

    /// Lowercase identifier, also used as the rank prefix for metadata keys
    /// and media paths
    pub fn as_str(self) -> &'static str {
        match self {
            RankId::HangGlider => "hangglider",
            RankId::WingRunner => "wingrunner",
            RankId::SkyStormer => "skystormer",
        }
    }

    /// Display title
    pub fn title(self) -> &'static str {
        match self {
            RankId::HangGlider => "HangGlider",
            RankId::WingRunner => "WingRunner",
            RankId::SkyStormer => "SkyStormer",
        }
    }

    /// Position in the library
    pub fn order(self) -> u32 {
        match self {
            RankId::HangGlider => 0,
            RankId::WingRunner => 1,
            RankId::SkyStormer => 2,
        }
    }

    /// Local media path for a track under this rank
    pub fn media_path(self, track_id: &str) -> String {
        format!("tracks/{}/{}.mp3", self.as_str(), track_id)
    }
}

impl std::fmt::Display for RankId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RankId {
    type Err = crate::error::SparksError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hangglider" => Ok(RankId::HangGlider),
            "wingrunner" => Ok(RankId::WingRunner),
            "skystormer" => Ok(RankId::SkyStormer),
            _ => Err(crate::error::SparksError::UnknownRank(s.to_string())),
        }
    }
}

// ============================================================================
// Library Tree
// ============================================================================

/// Root of the library
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioData {
    /// Ranks in declared order
    pub ranks: Vec<Rank>,

    /// Number of distinct track metadata entries indexed across all ranks
    pub raw_count: usize,
}

impl AudioData {
    /// The "content unavailable" result
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when no ranks are present. Callers treat this as a failed load,
    /// not as a library with no content.
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    pub fn rank(&self, id: RankId) -> Option<&Rank> {
        self.ranks.iter().find(|r| r.id == id)
    }

    /// Total number of tracks across the whole tree
    pub fn track_count(&self) -> usize {
        self.ranks
            .iter()
            .flat_map(|r| &r.stages)
            .flat_map(|s| &s.units)
            .map(|u| u.tracks.len())
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rank {
    pub id: RankId,
    pub title: String,
    pub order: u32,
    pub stages: Vec<Stage>,
}

impl Rank {
    /// An empty rank with its fixed identity
    pub fn seeded(id: RankId) -> Self {
        Self {
            id,
            title: id.title().to_string(),
            order: id.order(),
            stages: Vec::new(),
        }
    }

    pub fn stage(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    /// Derived from the title, see [`derive_id`]
    pub id: String,
    pub title: String,
    pub order: u32,
    pub units: Vec<Unit>,
}

impl Stage {
    pub fn unit(&self, id: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Units sorted by their numeric order.
    ///
    /// Units whose number cell did not parse all share order 0, so the sort
    /// is stable and ties keep their sheet order.
    pub fn units_by_order(&self) -> Vec<&Unit> {
        let mut units: Vec<&Unit> = self.units.iter().collect();
        units.sort_by_key(|u| u.order);
        units
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: String,
    pub title: String,
    pub order: u32,
    pub rank_id: RankId,
    pub tracks: Vec<Track>,
}

/// Whether a track's display metadata came from the data sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackResolution {
    /// Title taken from the rank's data sheet
    Resolved,
    /// No data sheet entry; title and path were synthesized
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Raw reference as written in the structure sheet
    pub id: String,
    pub order: u64,
    pub title: String,
    pub local_media_path: String,
    /// Identifier of the owning unit
    pub unit_id: String,
    pub resolution: TrackResolution,
}

impl Track {
    pub fn is_resolved(&self) -> bool {
        self.resolution == TrackResolution::Resolved
    }
}

// ============================================================================
// Identifier Helpers
// ============================================================================

/// Derive a route identifier from display text.
///
/// Lowercases and replaces every run of whitespace with a single hyphen.
/// Two titles that differ only in case or spacing produce the same id.
///
/// ```
/// use sparks_common::types::derive_id;
///
/// assert_eq!(derive_id("Red Jewel 1"), "red-jewel-1");
/// assert_eq!(derive_id("  Badge  "), "badge");
/// ```
pub fn derive_id(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Parse the leading decimal digits of a cell, 0 when there are none.
///
/// `"12"` gives 12, `"3b"` gives 3, `"Intro"` gives 0.
pub fn leading_number(text: &str) -> u32 {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}
