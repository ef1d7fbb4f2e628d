//! Sparks Ingest - spreadsheet ingestion and asset mirroring

use clap::Parser;
use sparks_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use sparks_ingest::commands::{self, mirror::MirrorArgs};
use sparks_ingest::{Cli, Commands};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::builder()
        .level(if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Info
        })
        .output(LogOutput::Console)
        .log_file_prefix("sparks-ingest")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    let guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {}", e);
            None
        },
    };

    let result = execute_command(cli).await;

    if let Err(e) = result {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        drop(guard);
        process::exit(1);
    }
}

async fn execute_command(cli: Cli) -> sparks_ingest::Result<()> {
    match cli.command {
        Commands::Fetch {
            output,
            local_dir,
            compact,
        } => commands::fetch::run(output, local_dir, compact).await,

        Commands::Mirror {
            output,
            rank,
            force,
            local_dir,
            download_url,
            no_progress,
        } => {
            commands::mirror::run(MirrorArgs {
                output,
                rank,
                force,
                local_dir,
                download_url,
                show_progress: !no_progress,
            })
            .await
        },

        Commands::Progress { file, command } => commands::progress::run(&file, &command),
    }
}
