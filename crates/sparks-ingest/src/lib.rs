//! Sparks Ingest Library
//!
//! Builds the Sparks audio library from the spreadsheets that describe it.
//!
//! # Pipeline
//!
//! Each rank has two sheets: a *structure* sheet (stages, units and the track
//! numbers in each unit) and a *data* sheet (track titles and media links).
//! A load runs:
//!
//! - **Source**: fetch all six sheets concurrently ([`source`])
//! - **Rows**: parse each CSV export into rows of cells ([`rows`])
//! - **Metadata**: index the data sheets by `(rank, track)` ([`metadata`])
//! - **Structure**: rebuild Stage → Unit → Track from the sparse structure rows ([`structure`])
//! - **Assembly**: place the three ranks in fixed order ([`assembly`])
//!
//! [`AudioLibrary`] runs the whole pipeline and falls back to the empty
//! library on any failure. [`mirror`] downloads the audio files the library
//! points at.
//!
//! # Example
//!
//! ```no_run
//! use sparks_ingest::{AudioLibrary, SheetsConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let library = AudioLibrary::from_config(SheetsConfig::from_env()?)?;
//!     let data = library.fetch_audio_data().await;
//!     println!("{} tracks", data.track_count());
//!     Ok(())
//! }
//! ```

pub mod assembly;
pub mod commands;
pub mod config;
pub mod error;
pub mod facade;
pub mod metadata;
pub mod mirror;
pub mod rows;
pub mod source;
pub mod structure;

// Re-export commonly used types
pub use config::{RankSheets, SheetRef, SheetsConfig};
pub use error::{IngestError, Result};
pub use facade::AudioLibrary;
pub use source::{CsvSource, DirectorySource, GoogleSheetsSource, MemorySource};

use clap::{Parser, Subcommand};
use sparks_common::progress::DEFAULT_PROGRESS_FILE;
use sparks_common::RankId;
use std::path::PathBuf;

/// Sparks audio library ingestion tool
#[derive(Parser, Debug)]
#[command(name = "sparks-ingest")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the library from its sheets and write it as JSON
    Fetch {
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Read sheets from exported CSV files in this directory instead of Google Sheets
        #[arg(long, env = "SPARKS_LOCAL_DIR")]
        local_dir: Option<PathBuf>,

        /// Write compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Download track audio into a local directory
    Mirror {
        /// Output root; files land in {output}/tracks/{rank}/{track}.mp3
        #[arg(short, long)]
        output: PathBuf,

        /// Only mirror this rank
        #[arg(short, long)]
        rank: Option<RankId>,

        /// Download even if the file already exists
        #[arg(short, long)]
        force: bool,

        /// Read data sheets from exported CSV files in this directory
        #[arg(long, env = "SPARKS_LOCAL_DIR")]
        local_dir: Option<PathBuf>,

        /// Drive direct-download endpoint
        #[arg(long, env = "SPARKS_DRIVE_DOWNLOAD_URL", default_value = mirror::DEFAULT_DRIVE_DOWNLOAD_URL)]
        download_url: String,

        /// Hide per-file progress bars
        #[arg(long)]
        no_progress: bool,
    },

    /// Inspect or edit a listening progress file
    Progress {
        /// Progress file
        #[arg(long, default_value = DEFAULT_PROGRESS_FILE)]
        file: PathBuf,

        #[command(subcommand)]
        command: ProgressCommand,
    },
}

/// Progress subcommands
#[derive(Subcommand, Debug)]
pub enum ProgressCommand {
    /// Show recorded progress
    Show,

    /// Record a playback position
    Update {
        /// Track id
        track: String,

        /// Position in seconds
        position: f64,

        /// Track duration in seconds
        duration: f64,
    },

    /// Mark a track completed
    Complete {
        /// Track id
        track: String,
    },

    /// Toggle a unit's completed flag
    ToggleUnit {
        /// Unit id
        unit: String,
    },
}
