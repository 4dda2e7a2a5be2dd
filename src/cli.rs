use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tf_state::Stage;

#[derive(Parser)]
#[command(name = "trendforge")]
#[command(author, version, about = "Turns a trend idea into an assembled short video")]
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
    /// Run the pipeline from the persisted stage to completion
    Run,

    /// Discard all progress and run from scratch
    Reset {
        /// Seed for quasi-reproducible generation (random if omitted)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Rewind to just before the given stage and rerun from there
    RunFrom {
        /// Stage to rerun (SCRIPTED, VISUALIZED, VIDEO_GENERATED, ASSEMBLED)
        stage: Stage,
    },

    /// Display the persisted project state
    Status {
        /// Output the full state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
