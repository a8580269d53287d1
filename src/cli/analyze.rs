//! Analyze command - compute yields and export the report.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::cli::AnalyzeArgs;
use crate::config::{paths, Config, StandardSelection};
use crate::pipeline::{Analysis, Analyzer};
use crate::report::{console, export, xlsx};

/// Run the analyze command.
pub fn run(args: AnalyzeArgs, config_path: Option<&Path>) -> Result<()> {
    let config = effective_config(&args, config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file does not exist: {}", args.input.display());
    }

    let analyzer = Analyzer::new(&config).context("Failed to prepare analysis")?;
    let analysis = analyzer
        .analyze_file(&args.input)
        .with_context(|| format!("Analysis of {} failed", args.input.display()))?;

    console::print_report(&analysis);

    if !args.no_export {
        let path = export_target(&args, &config, &analysis);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        xlsx::write_workbook(&analysis, &path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        verify_export(&path, &analysis)?;
        println!("Report saved: {}", path.display());
    }

    if let Some(ref path) = args.json {
        export::write_json(&analysis, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("JSON saved: {}", path.display());
    }

    if let Some(ref path) = args.csv {
        export::write_summary_csv(&analysis, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("CSV saved: {}", path.display());
    }

    info!(run_id = %analysis.run_id, "Analyze command finished");
    Ok(())
}

/// Loaded configuration with command-line overrides applied.
fn effective_config(args: &AnalyzeArgs, config_path: Option<&Path>) -> Result<Config> {
    let mut config = Config::load(config_path).context("Failed to load configuration")?;

    if let Some(tolerance) = args.tolerance {
        config.analysis.rt_tolerance = tolerance;
    }
    if args.strict_standards {
        config.analysis.standard_selection = StandardSelection::Strict;
    }

    config.validate()?;
    Ok(config)
}

/// Re-read the Summary sheet and check it matches the ranking.
fn verify_export(path: &Path, analysis: &Analysis) -> Result<()> {
    let rows = xlsx::read_summary(path)
        .with_context(|| format!("Failed to read back {}", path.display()))?;

    let written: Vec<_> = rows
        .iter()
        .map(|r| (r.rank, r.enzyme.as_str(), r.yield_pct, r.conversion_pct))
        .collect();
    let expected: Vec<_> = analysis
        .results
        .iter()
        .enumerate()
        .map(|(i, r)| (i as u32 + 1, r.enzyme.as_str(), r.yield_pct, r.conversion_pct))
        .collect();
    if written != expected {
        anyhow::bail!(
            "Exported summary in {} does not match the analysis",
            path.display()
        );
    }

    debug!(path = %path.display(), rows = rows.len(), "Export verified");
    Ok(())
}

fn export_target(args: &AnalyzeArgs, config: &Config, analysis: &Analysis) -> PathBuf {
    match args.output {
        Some(ref path) => path.clone(),
        None => paths::export_path(
            &config.output.directory,
            &config.output.file_prefix,
            analysis.generated_at,
        ),
    }
}
