//! `sparks-ingest mirror` command implementation

use colored::Colorize;
use sparks_common::RankId;
use std::path::PathBuf;

use super::select_source;
use crate::error::Result;
use crate::mirror::{AssetMirror, MirrorOptions};
use crate::SheetsConfig;

/// Arguments of the mirror command
#[derive(Debug, Clone)]
pub struct MirrorArgs {
    pub output: PathBuf,
    pub rank: Option<RankId>,
    pub force: bool,
    pub local_dir: Option<PathBuf>,
    pub download_url: String,
    pub show_progress: bool,
}

pub async fn run(args: MirrorArgs) -> Result<()> {
    let config = SheetsConfig::from_env()?;
    let source = select_source(&config, args.local_dir)?;

    let ranks = match args.rank {
        Some(rank) => vec![rank],
        None => RankId::ALL.to_vec(),
    };

    let options = MirrorOptions::new(&args.output)
        .with_download_url(args.download_url)
        .with_ranks(ranks)
        .with_force(args.force)
        .with_progress(args.show_progress);

    let stats = AssetMirror::new(source, config, options)?.run().await?;

    println!("{} {}", "Mirror complete:".green().bold(), stats);
    if stats.failed > 0 {
        println!(
            "{}",
            format!("{} file(s) failed; run again to retry them", stats.failed).yellow()
        );
    }

    Ok(())
}
