use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path (defaults to ./config.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the library periodically and translate new subtitles until interrupted
    Run,

    /// Run a single library scan, wait for its jobs and exit
    Scan,

    /// Translate a local subtitle file with the configured backend
    Translate {
        /// Input subtitle file
        #[arg(short, long)]
        input: PathBuf,

        /// Output subtitle file
        #[arg(short, long)]
        output: PathBuf,

        /// Subtitle format (ass, ssa, srt, subrip), inferred from the input extension when omitted
        #[arg(long)]
        codec: Option<String>,
    },

    /// Write the default configuration file
    InitConfig {
        /// Where to write the configuration
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
}
