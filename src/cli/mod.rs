//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// DTC configuration store
#[derive(Parser, Debug)]
#[command(name = "dtc", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: $DTC_DB, then platform data dir/configurations.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new configuration store
    Init {
        /// Apply the schema to an existing database file
        #[arg(long)]
        force: bool,
    },

    /// List stored configurations
    List,

    /// Export configurations as file pairs
    Export(ExportArgs),

    /// Show which file pairs in a directory are new or already stored
    Scan {
        /// Directory containing `.bin`/`.json` file pairs
        dir: PathBuf,
    },

    /// Import file pairs into the store
    Import(ImportArgs),

    /// Delete configurations by id
    Delete {
        /// Ids to delete
        #[arg(required = true, value_delimiter = ',')]
        ids: Vec<u64>,
    },

    /// Print version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output directory (created if missing)
    pub dir: PathBuf,

    /// Only export these ids (default: all)
    #[arg(long, value_delimiter = ',')]
    pub ids: Vec<u64>,

    /// Replace existing files without asking
    #[arg(long, conflicts_with = "skip_existing")]
    pub overwrite: bool,

    /// Keep existing files without asking
    #[arg(long)]
    pub skip_existing: bool,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Directory containing `.bin`/`.json` file pairs
    pub dir: PathBuf,

    /// Import these ids from the new file pairs
    #[arg(
        long,
        value_delimiter = ',',
        required_unless_present = "all_new",
        conflicts_with = "all_new"
    )]
    pub ids: Vec<u64>,

    /// Import every file pair whose id is not stored yet
    #[arg(long)]
    pub all_new: bool,
}
