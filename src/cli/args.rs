//! CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Reconstruct the module architecture of a source tree
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(about = "Reconstruct the module architecture of a source tree")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Report format written by `analyze`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain-text narrative
    #[default]
    Text,
    /// Structured report
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a source tree and print the architecture report
    Analyze {
        /// Root of the source tree
        path: PathBuf,

        /// Config file path (defaults to ./strata.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Glob patterns to exclude (can be repeated)
        #[arg(long)]
        exclude: Vec<String>,

        /// Directory names to skip anywhere in the tree (can be repeated)
        #[arg(long = "exclude-dir")]
        exclude_dir: Vec<String>,

        /// Leading directories stripped from module names (can be repeated)
        #[arg(long = "source-root")]
        source_root: Vec<String>,

        /// Number of most coupled modules to list
        #[arg(long)]
        top: Option<usize>,

        /// Extract files on a single thread
        #[arg(long)]
        sequential: bool,

        /// Debug logging and a progress bar
        #[arg(short, long)]
        verbose: bool,

        /// Only log errors
        #[arg(short, long, conflicts_with = "verbose")]
        quiet: bool,

        /// Disable colored log output
        #[arg(long)]
        no_color: bool,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Config file path (defaults to ./strata.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show version information
    Version,
}
