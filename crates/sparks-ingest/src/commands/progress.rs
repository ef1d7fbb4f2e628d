//! `sparks-ingest progress` command implementation
//!
//! Reads and edits a listening progress file the same way the player does.

use colored::Colorize;
use sparks_common::progress::ProgressStore;
use std::path::Path;

use crate::error::Result;
use crate::ProgressCommand;

pub fn run(file: &Path, command: &ProgressCommand) -> Result<()> {
    let mut store = ProgressStore::load(file)?;

    match command {
        ProgressCommand::Show => {
            show(&store);
            return Ok(());
        },
        ProgressCommand::Update {
            track,
            position,
            duration,
        } => {
            store.update_progress(track, *position, *duration)?;
            let completed = store.track_progress(track).is_some_and(|p| p.is_completed);
            println!(
                "Track {} at {:.1}s{}",
                track,
                position,
                if completed { " (completed)" } else { "" }
            );
        },
        ProgressCommand::Complete { track } => {
            store.mark_completed(track);
            println!("Track {} marked completed", track);
        },
        ProgressCommand::ToggleUnit { unit } => {
            let now_complete = store.toggle_unit_complete(unit);
            println!(
                "Unit {} {}",
                unit,
                if now_complete { "completed" } else { "reopened" }
            );
        },
    }

    store.save(file)?;
    Ok(())
}

fn show(store: &ProgressStore) {
    if store.tracks.is_empty() && store.completed_units.is_empty() {
        println!("No progress recorded.");
        return;
    }

    println!("{}", "Tracks:".cyan().bold());
    for progress in store.tracks.values() {
        let marker = if progress.is_completed {
            "done".green()
        } else {
            "....".normal()
        };
        println!(
            "  [{}] {:<12} {:>8.1}s",
            marker, progress.track_id, progress.last_position
        );
    }

    println!();
    println!("{}", "Completed units:".cyan().bold());
    for unit in &store.completed_units {
        println!("  {}", unit);
    }
}
