//! CLI command definitions

use clap::Parser;
use polyquorum_domain::{OutputFormat, SlotId};
use std::path::PathBuf;

/// CLI arguments for polyquorum
#[derive(Parser, Debug)]
#[command(name = "polyquorum")]
#[command(author, version, about = "Broadcast one question to several AI chat panes and merge the answers")]
#[command(long_about = r#"
Polyquorum watches four AI chat panes, detects when each has finished
answering, and injects a synthesis request into the sink pane.

Without a scenario file, a built-in demo is played against an in-memory
surface: three panes answer the same question and the bottom-right pane
receives the merge prompt.

Configuration files are loaded from (in priority order):
1. POLYQUORUM_* environment variables
2. --config <path>        Explicit config file
3. ./polyquorum.toml      Project-level config
4. ~/.config/polyquorum/config.toml   Global config

Example:
  polyquorum
  polyquorum scenarios/capital.toml --sink topLeft --timeout 30
  polyquorum --question "Largest ocean?" --manual --format full
"#)]
pub struct Cli {
    /// Scenario file to play (defaults to the built-in demo)
    pub scenario: Option<PathBuf>,

    /// Replace the question the scenario submits
    #[arg(long, value_name = "TEXT")]
    pub question: Option<String>,

    /// Merge answers into the sink (aggregation mode)
    #[arg(long)]
    pub aggregate: bool,

    /// Slot receiving the synthesis request (topLeft, topRight, bottomLeft, bottomRight)
    #[arg(long, value_name = "SLOT")]
    pub sink: Option<SlotId>,

    /// Seconds to wait after the first answer before merging (0 = off, -1 = forever)
    #[arg(long, value_name = "SECONDS", allow_hyphen_values = true)]
    pub timeout: Option<i64>,

    /// Do not merge automatically once every source has answered
    #[arg(long)]
    pub manual: bool,

    /// Output format (full, synthesis, json)
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Append cycle events to this JSONL file
    #[arg(long, value_name = "PATH")]
    pub journal: Option<PathBuf>,

    /// Also write logs to daily files in this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
