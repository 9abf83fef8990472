//! Reel CLI - HLS Playlist Inspector
//!
//! Features:
//! - Master/media playlist analysis
//! - Segment listing with timing and encryption context
//! - Raw tag inspection
//! - JSON output for scripting

use clap::{Parser, Subcommand};

mod commands;
mod output;

/// Reel CLI - HLS playlist toolkit
#[derive(Parser)]
#[command(name = "reel-cli")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "HLS playlist analysis toolkit", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a playlist (master or media)
    Analyze {
        /// URL or path to playlist
        playlist: String,
    },

    /// List media segments
    Segments {
        /// URL or path to playlist
        playlist: String,

        /// Number of segments to show (0 = all)
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Dump raw playlist tags
    Tags {
        /// URL or path to playlist
        playlist: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .init();

    match cli.command {
        Commands::Analyze { playlist } => {
            commands::analyze(&playlist, &cli.format).await?;
        }
        Commands::Segments { playlist, limit } => {
            commands::segments(&playlist, limit, &cli.format).await?;
        }
        Commands::Tags { playlist } => {
            commands::tags(&playlist, &cli.format).await?;
        }
    }

    Ok(())
}
