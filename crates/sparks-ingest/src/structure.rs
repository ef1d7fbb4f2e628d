//! Structure tree builder
//!
//! Rebuilds a rank's Stage → Unit → Track hierarchy from its structure sheet.
//!
//! # Format
//! ```text
//! col:  0   1   2   3        4     5          6    7    ...
//!       ..  ..  ..  Stage    Unit  Label      refs ...
//!                   Badge    1     Intro      7    8
//!                            2     Promise    9
//!                   Red Jewel 1  1 Scripture  10   11   12
//! ```
//!
//! The first row is a header. The Stage cell is only filled where a stage
//! begins (a merged cell in the spreadsheet); rows below inherit it until the
//! next filled Stage cell. A stage name seen again later re-opens the earlier
//! stage instead of creating a second one.

use sparks_common::types::{derive_id, leading_number};
use sparks_common::{RankId, Stage, Track, TrackResolution, Unit};
use std::collections::HashMap;
use tracing::debug;

use crate::metadata::{fallback_title, TrackMetaTable};
use crate::rows::{cell, Row};

pub const STAGE_COLUMN: usize = 3;
pub const UNIT_NUMBER_COLUMN: usize = 4;
pub const UNIT_LABEL_COLUMN: usize = 5;
pub const FIRST_TRACK_COLUMN: usize = 6;

/// Build the ordered stages of one rank
pub fn build_stages(rank: RankId, rows: &[Row], metadata: &TrackMetaTable) -> Vec<Stage> {
    let mut stages = StageAccumulator::default();
    let mut current: Option<StageContext> = None;
    let mut skipped = 0usize;

    for row in rows.iter().skip(1) {
        let stage_name = cell(row, STAGE_COLUMN);
        let unit_number = cell(row, UNIT_NUMBER_COLUMN);
        let unit_label = cell(row, UNIT_LABEL_COLUMN);

        if !stage_name.is_empty() {
            current = Some(StageContext {
                id: derive_id(stage_name),
                title: stage_name.to_string(),
            });
        }

        let Some(stage) = &current else {
            skipped += 1;
            continue;
        };

        if unit_number.is_empty() && unit_label.is_empty() {
            skipped += 1;
            continue;
        }

        let track_cells = row.get(FIRST_TRACK_COLUMN..).unwrap_or_default();
        let unit = build_unit(rank, unit_number, unit_label, track_cells, metadata);
        stages.stage(stage).push(unit);
    }

    let stages = stages.finish();
    debug!(
        rank = %rank,
        stages = stages.len(),
        units = stages.iter().map(|s| s.units.len()).sum::<usize>(),
        skipped,
        "Built structure tree"
    );
    stages
}

/// The stage that unlabelled rows belong to
struct StageContext {
    id: String,
    title: String,
}

/// Stages in first-seen order, addressable by id while rows are read
#[derive(Default)]
struct StageAccumulator {
    stages: Vec<StageBuilder>,
    index: HashMap<String, usize>,
}

impl StageAccumulator {
    /// Get the stage for a context, creating it on first use
    fn stage(&mut self, context: &StageContext) -> &mut StageBuilder {
        let position = match self.index.get(&context.id) {
            Some(&position) => position,
            None => {
                let position = self.stages.len();
                self.stages.push(StageBuilder::new(context));
                self.index.insert(context.id.clone(), position);
                position
            },
        };
        &mut self.stages[position]
    }

    fn finish(self) -> Vec<Stage> {
        self.stages
            .into_iter()
            .enumerate()
            .map(|(order, builder)| builder.finish(order as u32))
            .collect()
    }
}

struct StageBuilder {
    id: String,
    title: String,
    units: Vec<Unit>,
    unit_index: HashMap<String, usize>,
}

impl StageBuilder {
    fn new(context: &StageContext) -> Self {
        Self {
            id: context.id.clone(),
            title: context.title.clone(),
            units: Vec::new(),
            unit_index: HashMap::new(),
        }
    }

    /// Append a unit. A unit id already present in this stage keeps its
    /// first position and title and takes the new row's tracks.
    fn push(&mut self, unit: Unit) {
        match self.unit_index.get(&unit.id) {
            Some(&position) => {
                debug!(stage = %self.id, unit = %unit.id, "Repeated unit row, merging tracks");
                self.units[position].tracks.extend(unit.tracks);
            },
            None => {
                self.unit_index.insert(unit.id.clone(), self.units.len());
                self.units.push(unit);
            },
        }
    }

    fn finish(self, order: u32) -> Stage {
        Stage {
            id: self.id,
            title: self.title,
            order,
            units: self.units,
        }
    }
}

fn build_unit(
    rank: RankId,
    number: &str,
    label: &str,
    track_cells: &[String],
    metadata: &TrackMetaTable,
) -> Unit {
    let id = if number.is_empty() {
        derive_id(label)
    } else {
        derive_id(number)
    };

    let title = match (number.is_empty(), label.is_empty()) {
        (false, false) => format!("Unit {}: {}", number, label),
        (false, true) => format!("Unit {}", number),
        (true, _) => label.to_string(),
    };

    let tracks = track_cells
        .iter()
        .map(|c| c.trim())
        .filter_map(|reference| {
            parse_track_reference(reference)
                .map(|order| resolve_track(rank, reference, order, &id, metadata))
        })
        .collect();

    Unit {
        order: leading_number(number),
        id,
        title,
        rank_id: rank,
        tracks,
    }
}

/// A track reference is a non-negative integer written in plain digits
pub fn parse_track_reference(reference: &str) -> Option<u64> {
    if reference.is_empty() || !reference.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    reference.parse().ok()
}

fn resolve_track(
    rank: RankId,
    reference: &str,
    order: u64,
    unit_id: &str,
    metadata: &TrackMetaTable,
) -> Track {
    let (title, local_media_path, resolution) = match metadata.get(rank, reference) {
        Some(meta) => (
            meta.title.clone(),
            meta.local_media_path.clone(),
            TrackResolution::Resolved,
        ),
        None => (
            fallback_title(reference),
            rank.media_path(reference),
            TrackResolution::Unresolved,
        ),
    };

    Track {
        id: reference.to_string(),
        order,
        title,
        local_media_path,
        unit_id: unit_id.to_string(),
        resolution,
    }
}
