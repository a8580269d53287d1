//! Config command - configuration utilities.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::cli::ConfigAction;
use crate::config::{self, Config};

/// Run the config command.
pub fn run(action: ConfigAction, config_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Validate => validate_config(config_path),
        ConfigAction::Show => show_config(config_path),
        ConfigAction::Path => show_path(config_path),
    }
}

fn resolve_path(config_path: Option<&Path>) -> PathBuf {
    config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config::paths::config_file)
}

fn validate_config(config_path: Option<&Path>) -> Result<()> {
    let path = resolve_path(config_path);

    println!();
    println!("Validating configuration...");
    println!("Path: {}", path.display());
    println!();

    if !path.exists() {
        println!("No configuration file; built-in defaults are in effect.");
        println!();
        println!("Create a configuration file at:");
        println!("  {}", path.display());
        println!();
        println!("Or specify a custom path with --config");
        println!();
        return Ok(());
    }

    match Config::load_from(&path) {
        Ok(config) => {
            println!("Configuration is valid.");
            println!();
            println!("Summary:");
            println!("  RT tolerance: {}", config.analysis.rt_tolerance);
            println!("  Standard selection: {}", config.analysis.standard_selection);
            println!("  Substrate: {}", config.analysis.substrate);
            println!("  Standard sheets: {}", config.sheets.standard.join(", "));
            println!("  Reaction sheets: {}", config.sheets.reaction.join(", "));
            println!(
                "  Extra compounds: {}{}",
                config.reference.compounds.len(),
                if config.reference.replace_builtin {
                    " (replacing builtin table)"
                } else {
                    ""
                }
            );
            println!("  Output directory: {}", config.output.directory.display());
        }
        Err(e) => {
            println!("ERROR: Configuration is invalid");
            println!();
            println!("Details: {:#}", e);
            println!();
            println!("Fix the configuration and run 'biosyn config validate' again.");
        }
    }

    println!();
    Ok(())
}

fn show_config(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;
    println!("# {}", config.path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn show_path(config_path: Option<&Path>) -> Result<()> {
    println!("{}", resolve_path(config_path).display());
    Ok(())
}
