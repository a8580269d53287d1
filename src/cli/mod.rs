//! CLI command definitions and handlers.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod analyze;
pub mod compounds;
pub mod config;
pub mod inspect;

/// Biosyn carbon-yield calculator - rank enzymes by carbon yield from
/// chromatography peak areas.
#[derive(Parser, Debug)]
#[command(name = "biosyn")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log level
    #[arg(long, default_value = "warn", env = "BIOSYN_LOG_LEVEL", global = true)]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, default_value = "human", global = true)]
    pub log_format: LogFormat,

    /// Path to config file
    #[arg(long = "config", env = "BIOSYN_CONFIG", global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
pub enum LogFormat {
    Human,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute carbon yields for a workbook and export the report
    Analyze(AnalyzeArgs),

    /// Preview sheet/column resolution and calibration without exporting
    Inspect {
        /// Path to the input workbook
        input: PathBuf,
    },

    /// List the compound reference table
    Compounds,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information
    Version,
}

#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    /// Path to the input workbook (.xlsx, .xls, .ods)
    pub input: PathBuf,

    /// Export workbook path (default: <output.directory>/<prefix>_<timestamp>.xlsx)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Skip the spreadsheet export
    #[arg(long, conflicts_with = "output")]
    pub no_export: bool,

    /// Also write the full analysis as JSON
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Also write the summary table as CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Retention-time tolerance override
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Only recognized C4 sugars count as C4 standards
    #[arg(long)]
    pub strict_standards: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate configuration file
    Validate,

    /// Show effective configuration
    Show,

    /// Show configuration file path
    Path,
}
