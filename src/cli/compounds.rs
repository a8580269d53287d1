//! Compounds command - list the reference table.

use anyhow::{Context, Result};
use std::path::Path;

use crate::compounds::{CompoundTable, BUILTIN_VERSION, DEFAULT_CARBON_COUNT, DEFAULT_MOLECULAR_WEIGHT};
use crate::config::Config;

/// Run the compounds command.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path).context("Failed to load configuration")?;
    let table = CompoundTable::from_config(&config.reference)?;

    println!();
    println!("Compound Reference");
    println!("==================");
    println!("Builtin table: {}", BUILTIN_VERSION);
    if config.reference.replace_builtin {
        println!("Source: configuration only");
    } else if !config.reference.compounds.is_empty() {
        println!("Source: builtin + {} configured", config.reference.compounds.len());
    }
    println!("Entries: {}", table.len());
    println!();

    println!("{:<16} {:>10} {:>8} {:>10}", "Name", "MW", "Carbons", "C fraction");
    println!("{}", "-".repeat(47));
    for c in table.entries() {
        println!(
            "{:<16} {:>10.2} {:>8} {:>10.4}",
            c.name,
            c.molecular_weight,
            c.carbon_count,
            c.carbon_fraction()
        );
    }

    println!();
    println!(
        "Unknown products: MW {:.2}, {} carbons (fraction {:.4})",
        DEFAULT_MOLECULAR_WEIGHT,
        DEFAULT_CARBON_COUNT,
        table.default_carbon_fraction()
    );
    println!();
    Ok(())
}
