//! CLI argument definitions

use crate::dedup::DedupMode;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Merge per-node nginx-proxy configuration fragments and reload nginx
#[derive(Parser)]
#[command(name = "swarm-merge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,

    /// Color output
    #[arg(long, value_enum, default_value = "auto")]
    pub color: ColorChoice,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge fragments, write the combined config and reload nginx
    Merge(MergeArgs),

    /// Parse and deduplicate without writing or reloading anything
    Check(CheckArgs),
}

#[derive(clap::Args)]
pub struct MergeArgs {
    /// Swarm aggregation entry point
    #[arg(long, default_value = crate::DEFAULT_SWARM_CONFIG_PATH)]
    pub swarm_config: PathBuf,

    /// Merged output file
    #[arg(short, long, default_value = crate::DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// Reload command to run after writing
    #[arg(long, default_value = crate::DEFAULT_RELOAD_CMD)]
    pub reload_cmd: String,

    /// Duplicate detection mode
    #[arg(long, value_enum, default_value = "semantic")]
    pub mode: DedupModeArg,

    /// Print the merged config instead of writing it (implies no reload)
    #[arg(long)]
    pub dry_run: bool,

    /// Write the merged config but skip the reload command
    #[arg(long)]
    pub no_reload: bool,
}

#[derive(clap::Args)]
pub struct CheckArgs {
    /// Swarm aggregation entry point
    #[arg(long, default_value = crate::DEFAULT_SWARM_CONFIG_PATH)]
    pub swarm_config: PathBuf,

    /// Duplicate detection mode
    #[arg(long, value_enum, default_value = "semantic")]
    pub mode: DedupModeArg,

    /// Machine-readable output
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DedupModeArg {
    /// Key upstream blocks on their name, server blocks on server_name
    Semantic,
    /// Exact structural duplicates only (legacy behavior)
    Exact,
}

impl From<DedupModeArg> for DedupMode {
    fn from(arg: DedupModeArg) -> Self {
        match arg {
            DedupModeArg::Semantic => DedupMode::SemanticKeyed,
            DedupModeArg::Exact => DedupMode::ExactOnly,
        }
    }
}
