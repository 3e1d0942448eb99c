//! CLI module for vidlens.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// vidlens - Video knowledge base
///
/// Index YouTube videos from their captions (or a model's own viewing when no
/// captions exist), then ask questions and search for visual moments with
/// timestamped answers.
#[derive(Parser, Debug)]
#[command(name = "vidlens")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "VIDLENS_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Process and index a YouTube video
    Process {
        /// YouTube URL
        url: String,

        /// Also capture and describe frames for visual search
        #[arg(long)]
        visual: bool,
    },

    /// Ask a question about a processed video
    Ask {
        /// Video ID
        video_id: String,

        /// The question to ask
        question: String,
    },

    /// Find moments in a processed video matching a visual description
    Search {
        /// Video ID
        video_id: String,

        /// What to look for
        query: String,

        /// Skip the generated summary of the matches
        #[arg(long)]
        no_narrative: bool,
    },

    /// List processed videos
    List,

    /// Show details of a processed video
    Info {
        /// Video ID
        video_id: String,
    },

    /// Delete a processed video
    Delete {
        /// Video ID
        video_id: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Inspect and maintain the query embedding cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "rag.top_k")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Show configuration file path
    Path,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show cache statistics
    Stats,

    /// Remove every cached embedding
    Clear,

    /// Remove persistent entries not used recently
    Sweep {
        /// Age in days (defaults to cache.max_age_days)
        #[arg(long)]
        days: Option<u32>,
    },
}
