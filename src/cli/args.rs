//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Annotate phylogenetic trees with calendar-time estimates from sample metadata
#[derive(Parser, Debug)]
#[command(name = "chronotree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d, -dd, -ddd)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Settings file (TOML)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Estimate node times and write per-node annotations as TSV
    Annotate {
        /// Newick tree file
        #[arg(value_hint = ValueHint::FilePath)]
        tree: PathBuf,
        /// Sample metadata table (TSV)
        #[arg(value_hint = ValueHint::FilePath)]
        metadata: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
        /// Include internal nodes in the output
        #[arg(long)]
        internal: bool,
    },

    /// Summarize fallback usage and time-source breakdown
    Report {
        /// Newick tree file
        #[arg(value_hint = ValueHint::FilePath)]
        tree: PathBuf,
        /// Sample metadata table (TSV)
        #[arg(value_hint = ValueHint::FilePath)]
        metadata: PathBuf,
    },

    /// Show tree statistics and highlight coverage
    Stats {
        /// Newick tree file
        #[arg(value_hint = ValueHint::FilePath)]
        tree: PathBuf,
        /// Sample metadata table (TSV)
        #[arg(value_hint = ValueHint::FilePath)]
        metadata: PathBuf,
    },

    /// Show annotated hierarchy as tree
    Tree {
        /// Newick tree file
        #[arg(value_hint = ValueHint::FilePath)]
        tree: PathBuf,
        /// Sample metadata table (TSV); omit to estimate from fallbacks only
        #[arg(value_hint = ValueHint::FilePath)]
        metadata: Option<PathBuf>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Target path (default: global config location)
        path: Option<PathBuf>,
    },

    /// Show config paths
    Path,
}
