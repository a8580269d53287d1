//! Inspect command - preview sheet/column resolution and calibration.

use anyhow::{Context, Result};
use std::path::Path;

use crate::calibration;
use crate::config::Config;
use crate::matcher::RtReference;
use crate::pipeline::Analyzer;
use crate::resolver::ResolvedSheet;
use crate::types::{ColumnRole, SheetKind};
use crate::workbook::Workbook;

/// Run the inspect command.
pub fn run(input: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path).context("Failed to load configuration")?;
    let analyzer = Analyzer::new(&config).context("Failed to prepare analysis")?;
    let workbook = Workbook::open(input)?;

    println!();
    println!("Workbook Inspection");
    println!("===================");
    println!("File: {}", input.display());
    if let Some(source) = workbook.source() {
        println!("SHA-256: {}", source.sha256);
    }
    println!("Sheets: {}", workbook.sheet_names().join(", "));

    let resolver = analyzer.resolver();
    let mut standard = None;

    for kind in [SheetKind::Standard, SheetKind::Reaction] {
        println!();
        match resolver.resolve_sheet(&workbook, kind) {
            Ok(resolved) => {
                print_resolved(&resolved);
                if kind == SheetKind::Standard {
                    standard = Some(resolved);
                }
            }
            Err(e) => println!("{} sheet: NOT FOUND ({})", kind, e),
        }
    }

    let Some(standard) = standard else {
        println!();
        return Ok(());
    };

    println!();
    println!("Standards");
    println!("---------");
    let rows = match calibration::read_standards(&standard, analyzer.settings()) {
        Ok(rows) => rows,
        Err(e) => {
            println!("Could not read standards: {}", e);
            println!();
            return Ok(());
        }
    };
    for row in &rows {
        let rt = row
            .retention_time
            .map(|t| format!("{:.3}", t))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<20} area {:>12.2}  conc {:>10.4}  rt {:>7}",
            row.compound_name, row.peak_area, row.concentration, rt
        );
    }

    let reference = RtReference::from_standards(&rows);
    println!();
    println!("RT reference: {} compound(s)", reference.len());
    for entry in reference.entries() {
        println!(
            "  {:<20} {:.3}",
            entry.compound_name, entry.standard_retention_time
        );
    }

    println!();
    println!("Calibration");
    println!("-----------");
    match calibration::build_calibration(&rows, analyzer.settings()) {
        Ok(params) => {
            println!("C4 response factor:   {:.2}", params.c4_response_factor);
            println!(
                "{} response factor: {:.2}",
                analyzer.settings().substrate,
                params.gald_response_factor
            );
        }
        Err(e) => println!("FAILED: {}", e),
    }

    println!();
    Ok(())
}

fn print_resolved(resolved: &ResolvedSheet<'_>) {
    println!(
        "{} sheet: '{}' ({} data rows)",
        resolved.kind,
        resolved.sheet.name,
        resolved.sheet.rows.len()
    );
    for role in ColumnRole::ALL {
        match resolved.columns.get(role) {
            Some(col) => println!("  {:<16} column {:>2}  '{}'", role, col.index + 1, col.label),
            None => println!("  {:<16} (not found)", role),
        }
    }
}
