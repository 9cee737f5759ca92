//! CLI arguments and parsing

use crate::sink::SinkFormat;
use clap::Parser;
use std::path::PathBuf;

/// Harvest every page of a session-gated search API
#[derive(Parser, Debug)]
#[command(name = "search-harvester")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Search query (prompted when omitted)
    #[arg(short, long)]
    pub query: Option<String>,

    /// Session credential (prompted when omitted)
    #[arg(short, long)]
    pub session: Option<String>,

    /// First page to fetch
    #[arg(short = 'p', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub start_page: Option<u32>,

    /// Delay between pages in seconds
    #[arg(short, long)]
    pub delay: Option<f64>,

    /// Settings file (YAML or JSON)
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Directory for results, event log and checkpoint
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Result file format
    #[arg(short, long)]
    pub format: Option<SinkFormat>,

    /// Start from the saved checkpoint when it belongs to this query
    #[arg(long)]
    pub resume: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Whether the operator has to be asked for anything.
    ///
    /// A run with both query and session on the command line never prompts
    /// at start-up.
    pub fn is_interactive(&self) -> bool {
        self.query.is_none() || self.session.is_none()
    }
}
