//! Library assembly
//!
//! Turns the six sheet texts into one [`AudioData`]. Runs only once every text
//! is in hand; nothing here performs I/O.

use sparks_common::{AudioData, Rank, RankId, Stage};
use tracing::info;

use crate::error::{IngestError, Result};
use crate::metadata::TrackMetaTable;
use crate::rows::parse_rows;
use crate::structure::build_stages;

/// Raw CSV text of one rank's two sheets
#[derive(Debug, Clone)]
pub struct RankSources {
    pub rank: RankId,
    pub structure_csv: String,
    pub data_csv: String,
}

impl RankSources {
    pub fn new(rank: RankId, structure_csv: impl Into<String>, data_csv: impl Into<String>) -> Self {
        Self {
            rank,
            structure_csv: structure_csv.into(),
            data_csv: data_csv.into(),
        }
    }
}

/// Parse, index and assemble the whole library.
///
/// All data sheets are indexed into one table before any structure sheet is
/// read; lookups stay rank-scoped through the key.
pub fn build_library(sources: &[RankSources]) -> Result<AudioData> {
    let mut metadata = TrackMetaTable::new();
    for source in sources {
        let rows = parse_rows(&source.data_csv);
        metadata.merge(TrackMetaTable::from_rows(source.rank, &rows));
    }

    let trees: Vec<(RankId, Vec<Stage>)> = sources
        .iter()
        .map(|source| {
            let rows = parse_rows(&source.structure_csv);
            (source.rank, build_stages(source.rank, &rows, &metadata))
        })
        .collect();

    assemble(trees, &metadata)
}

/// Place each rank's stages under its seeded rank.
///
/// Every rank must be supplied exactly once; anything else fails the whole
/// assembly.
pub fn assemble(trees: Vec<(RankId, Vec<Stage>)>, metadata: &TrackMetaTable) -> Result<AudioData> {
    let mut ranks: Vec<Rank> = RankId::ALL.into_iter().map(Rank::seeded).collect();
    let mut filled = [false; 3];

    for (rank_id, stages) in trees {
        let slot = rank_id.order() as usize;
        if filled[slot] {
            return Err(IngestError::IngestionFailed(format!(
                "rank {} supplied more than once",
                rank_id
            )));
        }
        filled[slot] = true;
        ranks[slot].stages = stages;
    }

    if let Some(missing) = RankId::ALL.into_iter().find(|r| !filled[r.order() as usize]) {
        return Err(IngestError::IngestionFailed(format!("rank {} is missing", missing)));
    }

    let data = AudioData {
        ranks,
        raw_count: metadata.len(),
    };

    info!(
        ranks = data.ranks.len(),
        stages = data.ranks.iter().map(|r| r.stages.len()).sum::<usize>(),
        tracks = data.track_count(),
        raw_count = data.raw_count,
        "Assembled audio library"
    );

    Ok(data)
}
