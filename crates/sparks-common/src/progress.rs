//! Listening progress store
//!
//! Keeps per-track playback position and completion plus the set of units a
//! listener has ticked off. The store is a plain value; [`ProgressStore::load`]
//! and [`ProgressStore::save`] persist it as JSON.
//!
//! # Example
//!
//! ```no_run
//! use sparks_common::progress::ProgressStore;
//!
//! # fn main() -> sparks_common::Result<()> {
//! let path = std::path::Path::new("ccac_sparks_progress_v1.json");
//! let mut store = ProgressStore::load(path)?;
//! store.update_progress("7", 95.0, 100.0)?;
//! store.save(path)?;
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, SparksError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Default file name for the persisted store
pub const DEFAULT_PROGRESS_FILE: &str = "ccac_sparks_progress_v1.json";

/// Fraction of a track that counts as listened to
pub const COMPLETION_THRESHOLD: f64 = 0.9;

/// Progress for a single track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackProgress {
    pub track_id: String,
    pub is_completed: bool,
    /// Seconds into the track
    pub last_position: f64,
    /// Milliseconds since the Unix epoch
    pub last_played_at: i64,
}

impl TrackProgress {
    fn new(track_id: &str) -> Self {
        Self {
            track_id: track_id.to_string(),
            is_completed: false,
            last_position: 0.0,
            last_played_at: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStore {
    #[serde(default)]
    pub tracks: BTreeMap<String, TrackProgress>,
    #[serde(default)]
    pub completed_units: Vec<String>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from disk. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No progress file, starting empty");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let store = serde_json::from_str(&content)?;
        Ok(store)
    }

    /// Write the store to disk, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), tracks = self.tracks.len(), "Saved progress");
        Ok(())
    }

    /// Record the playback position of a track.
    ///
    /// Completion latches: once a track reaches the threshold it stays
    /// completed even if the listener seeks back.
    pub fn update_progress(&mut self, track_id: &str, position: f64, duration: f64) -> Result<()> {
        if !position.is_finite() || position < 0.0 {
            return Err(SparksError::InvalidProgress(format!("position {}", position)));
        }
        if !duration.is_finite() || duration < 0.0 {
            return Err(SparksError::InvalidProgress(format!("duration {}", duration)));
        }

        let entry = self
            .tracks
            .entry(track_id.to_string())
            .or_insert_with(|| TrackProgress::new(track_id));

        entry.is_completed =
            entry.is_completed || (duration > 0.0 && position / duration >= COMPLETION_THRESHOLD);
        entry.last_position = position;
        entry.last_played_at = Utc::now().timestamp_millis();
        Ok(())
    }

    pub fn mark_completed(&mut self, track_id: &str) {
        let entry = self
            .tracks
            .entry(track_id.to_string())
            .or_insert_with(|| TrackProgress::new(track_id));
        entry.is_completed = true;
        entry.last_played_at = Utc::now().timestamp_millis();
    }

    pub fn track_progress(&self, track_id: &str) -> Option<&TrackProgress> {
        self.tracks.get(track_id)
    }

    /// Flip a unit's completion. Returns the new state.
    pub fn toggle_unit_complete(&mut self, unit_id: &str) -> bool {
        if let Some(pos) = self.completed_units.iter().position(|u| u == unit_id) {
            self.completed_units.remove(pos);
            false
        } else {
            self.completed_units.push(unit_id.to_string());
            true
        }
    }

    pub fn is_unit_complete(&self, unit_id: &str) -> bool {
        self.completed_units.iter().any(|u| u == unit_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_update_progress_completes_at_threshold() {
        let mut store = ProgressStore::new();

        store.update_progress("7", 50.0, 100.0).unwrap();
        let progress = store.track_progress("7").unwrap();
        assert!(!progress.is_completed);
        assert_eq!(progress.last_position, 50.0);
        assert!(progress.last_played_at > 0);

        store.update_progress("7", 90.0, 100.0).unwrap();
        assert!(store.track_progress("7").unwrap().is_completed);
    }

    #[test]
    fn test_completion_latches() {
        let mut store = ProgressStore::new();
        store.update_progress("7", 99.0, 100.0).unwrap();
        store.update_progress("7", 5.0, 100.0).unwrap();

        let progress = store.track_progress("7").unwrap();
        assert!(progress.is_completed);
        assert_eq!(progress.last_position, 5.0);
    }

    #[test]
    fn test_zero_duration_never_completes() {
        let mut store = ProgressStore::new();
        store.update_progress("7", 10.0, 0.0).unwrap();
        assert!(!store.track_progress("7").unwrap().is_completed);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let mut store = ProgressStore::new();
        assert!(store.update_progress("7", -1.0, 10.0).is_err());
        assert!(store.update_progress("7", f64::NAN, 10.0).is_err());
        assert!(store.track_progress("7").is_none());
    }

    #[test]
    fn test_mark_completed() {
        let mut store = ProgressStore::new();
        store.mark_completed("8");
        let progress = store.track_progress("8").unwrap();
        assert!(progress.is_completed);
        assert_eq!(progress.last_position, 0.0);
    }

    #[test]
    fn test_toggle_unit() {
        let mut store = ProgressStore::new();
        assert!(store.toggle_unit_complete("1"));
        assert!(store.is_unit_complete("1"));
        assert!(!store.toggle_unit_complete("1"));
        assert!(!store.is_unit_complete("1"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(DEFAULT_PROGRESS_FILE);

        let mut store = ProgressStore::new();
        store.update_progress("7", 30.0, 60.0).unwrap();
        store.toggle_unit_complete("2");
        store.save(&path).unwrap();

        let loaded = ProgressStore::load(&path).unwrap();
        assert_eq!(loaded, store);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["tracks"]["7"]["lastPosition"], 30.0);
        assert_eq!(raw["completedUnits"][0], "2");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::load(&dir.path().join("absent.json")).unwrap();
        assert!(store.tracks.is_empty());
        assert!(store.completed_units.is_empty());
    }
}
