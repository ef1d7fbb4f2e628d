//! Track metadata table
//!
//! Built from a rank's data sheet. The first row is a header; columns are
//! found by normalized name (trimmed, lowercased, whitespace runs replaced by
//! `_`), so "File Name", "file name" and " FILE   NAME " all match `file_name`.
//!
//! # Format
//! ```text
//! Track,File Name,File Link
//! 7,Welcome,https://drive.google.com/file/d/1AbC/view
//! 8,,https://drive.google.com/open?id=2XyZ
//! ```
//!
//! Keys are scoped by rank: track `7` of WingRunner and track `7` of
//! SkyStormer are different entries.

use sparks_common::RankId;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::rows::{cell, Row};

/// Header name of the track id column
pub const TRACK_COLUMN: &str = "track";
/// Header name of the display title column
pub const FILE_NAME_COLUMN: &str = "file_name";
/// Header name of the remote media link column
pub const FILE_LINK_COLUMN: &str = "file_link";

/// Lookup key: rank prefix plus the raw track id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackKey {
    pub rank: RankId,
    pub track_id: String,
}

impl TrackKey {
    pub fn new(rank: RankId, track_id: impl Into<String>) -> Self {
        Self {
            rank,
            track_id: track_id.into(),
        }
    }
}

impl std::fmt::Display for TrackKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.rank, self.track_id)
    }
}

/// Display metadata for one track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMeta {
    pub title: String,
    /// Always `tracks/{rank}/{track_id}.mp3`
    pub local_media_path: String,
    /// Link the asset mirror downloads from. Never served to players.
    pub remote_link: Option<String>,
}

/// `(rank, track id) -> metadata`, iterated in key order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetaTable {
    entries: BTreeMap<TrackKey, TrackMeta>,
}

impl TrackMetaTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table for one rank from its parsed data sheet
    pub fn from_rows(rank: RankId, rows: &[Row]) -> Self {
        let mut table = Self::new();

        let Some((header, records)) = rows.split_first() else {
            warn!(rank = %rank, "Data sheet is empty");
            return table;
        };

        let columns: Vec<String> = header.iter().map(|h| normalize_header(h)).collect();
        let find = |name: &str| columns.iter().position(|c| c == name);

        let Some(track_col) = find(TRACK_COLUMN) else {
            warn!(rank = %rank, header = ?columns, "Data sheet has no '{}' column", TRACK_COLUMN);
            return table;
        };
        let name_col = find(FILE_NAME_COLUMN);
        let link_col = find(FILE_LINK_COLUMN);

        let mut skipped = 0usize;
        for row in records {
            let track_id = cell(row, track_col);
            if track_id.is_empty() {
                skipped += 1;
                continue;
            }

            let title = name_col
                .map(|i| cell(row, i))
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| fallback_title(track_id));

            let remote_link = link_col
                .map(|i| cell(row, i))
                .filter(|l| !l.is_empty())
                .map(str::to_string);

            let meta = TrackMeta {
                title,
                local_media_path: rank.media_path(track_id),
                remote_link,
            };

            if table.insert(TrackKey::new(rank, track_id), meta).is_some() {
                debug!(rank = %rank, track = track_id, "Duplicate track id, later row wins");
            }
        }

        debug!(rank = %rank, entries = table.len(), skipped, "Built track metadata table");
        table
    }

    /// Insert an entry, returning the one it replaced
    pub fn insert(&mut self, key: TrackKey, meta: TrackMeta) -> Option<TrackMeta> {
        self.entries.insert(key, meta)
    }

    /// Look up a track; a miss is `None`, never an error
    pub fn get(&self, rank: RankId, track_id: &str) -> Option<&TrackMeta> {
        self.entries.get(&TrackKey::new(rank, track_id))
    }

    /// Move every entry of `other` into this table
    pub fn merge(&mut self, other: TrackMetaTable) {
        self.entries.extend(other.entries);
    }

    /// Entries belonging to one rank
    pub fn for_rank(&self, rank: RankId) -> impl Iterator<Item = (&str, &TrackMeta)> {
        self.entries
            .iter()
            .filter(move |(key, _)| key.rank == rank)
            .map(|(key, meta)| (key.track_id.as_str(), meta))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Title used when a track has no name in the data sheet
pub fn fallback_title(track_id: &str) -> String {
    format!("Track {}", track_id)
}

/// Trim, lowercase and join whitespace-separated words with `_`
pub fn normalize_header(header: &str) -> String {
    header
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}
