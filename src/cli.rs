use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "onair")]
#[command(author, version, about = "Linear channels over on-demand media libraries")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show what a channel is airing
    Resolve {
        /// Channel number or id
        channel: String,

        /// Instant to resolve (RFC 3339, defaults to now)
        #[arg(long)]
        at: Option<String>,

        /// Session token used for attempt throttling
        #[arg(long)]
        session: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Do not record the result for playback continuity
        #[arg(long)]
        no_commit: bool,
    },

    /// Forget the current stream of a channel
    Stop {
        /// Channel number or id
        channel: String,
    },

    /// Import a catalog of programs, filler lists and channels
    Import {
        /// Catalog JSON file
        #[arg(required = true)]
        file: PathBuf,
    },

    /// List configured channels
    Channels,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
