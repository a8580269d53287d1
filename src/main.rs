//! Biosyn Carbon-Yield Calculator
//!
//! Turns hand-prepared chromatography workbooks (a standard sheet and a
//! reaction sheet) into per-enzyme carbon yields, ranked best first.

use anyhow::Result;
use clap::Parser;
use tracing::info;

mod calibration;
mod cli;
mod compounds;
mod config;
mod error;
mod matcher;
mod metrics;
mod pipeline;
mod reaction;
mod report;
mod resolver;
mod types;
mod workbook;

use cli::{Cli, Command, LogFormat};

fn main() {
    if let Err(e) = real_main() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn real_main() -> Result<()> {
    let cli = Cli::parse();

    init_console_logging(&cli);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Biosyn carbon-yield calculator starting"
    );

    let config_path = cli.config_path.as_deref();

    match cli.command {
        Command::Analyze(args) => cli::analyze::run(args, config_path),
        Command::Inspect { input } => cli::inspect::run(&input, config_path),
        Command::Compounds => cli::compounds::run(config_path),
        Command::Config { action } => cli::config::run(action, config_path),
        Command::Version => {
            println!("biosyn {}", env!("CARGO_PKG_VERSION"));
            println!("compound table {}", compounds::BUILTIN_VERSION);
            Ok(())
        }
    }
}

/// Logs go to stderr so the report on stdout stays clean. `RUST_LOG`
/// overrides `--log-level`.
fn init_console_logging(cli: &Cli) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_str()));

    let registry = tracing_subscriber::registry().with(filter);

    match cli.log_format {
        LogFormat::Human => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}
