//! Command line argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// TV Show Renamer - Rename and reorganize TV episode files
#[derive(Parser, Debug)]
#[command(name = "tvshow-renamer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Configuration file (default: <config dir>/tvshow_renamer/config.toml)
    #[arg(short, long, global = true, value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip preflight checks
    #[arg(long, global = true)]
    pub skip_preflight: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan the source tree and rename episodes (preview unless --execute)
    Run {
        /// Apply the changes
        #[arg(long, conflicts_with = "preview")]
        execute: bool,

        /// Only show what would be done (default)
        #[arg(long)]
        preview: bool,

        /// Do not ask for confirmation before executing
        #[arg(short, long)]
        yes: bool,

        /// Source directory (overrides paths.source_dir)
        #[arg(short, long, value_name = "SOURCE")]
        source: Option<PathBuf>,

        /// Output directory (overrides paths.output_dir)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Backup directory (overrides paths.backup_dir)
        #[arg(short, long, value_name = "BACKUP")]
        backup: Option<PathBuf>,

        /// Move files with a worker pool
        #[arg(long, conflicts_with = "sequential")]
        parallel: bool,

        /// Move files one at a time
        #[arg(long)]
        sequential: bool,

        /// Worker count for parallel mode
        #[arg(short, long, value_name = "N")]
        workers: Option<usize>,

        /// Write an HTML report
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        /// Write the run report as JSON
        #[arg(long, value_name = "FILE")]
        report_json: Option<PathBuf>,
    },

    /// Reverse the most recent moves
    Undo {
        /// Number of undo log entries to reverse
        #[arg(value_name = "N", default_value_t = 1)]
        count: usize,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show how file names would be parsed and named
    Parse {
        /// File names or paths
        #[arg(value_name = "NAME", required = true)]
        names: Vec<String>,
    },

    /// Run preflight checks only
    Check,

    /// Write the default configuration document
    InitConfig {
        /// Target path (default: the default config location)
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
