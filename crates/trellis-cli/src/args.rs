//! Command-line argument definitions for the Trellis CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the input and output files, the layout
//! algorithm, configuration file, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Trellis layout tool
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input DOT file
    #[arg(help = "Path to the input DOT file")]
    pub input: String,

    /// Path to the output DOT file; standard output if omitted
    #[arg(short, long)]
    pub output: Option<String>,

    /// Layout algorithm; the first suggestion for the graph if omitted
    #[arg(short, long)]
    pub algorithm: Option<String>,

    /// Lay out collapsed containers as single nodes
    #[arg(long)]
    pub respect_collapsed: bool,

    /// Print the suggested algorithms and exit without laying out
    #[arg(long)]
    pub suggest: bool,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
