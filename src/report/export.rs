//! JSON and CSV exports of an analysis.

use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::error::ExportError;
use crate::pipeline::Analysis;

/// Write the whole analysis as pretty JSON.
pub fn write_json(analysis: &Analysis, path: &Path) -> Result<(), ExportError> {
    let content = serde_json::to_string_pretty(analysis)?;
    std::fs::write(path, content)?;
    info!(path = %path.display(), "JSON exported");
    Ok(())
}

#[derive(Serialize)]
struct SummaryRecord<'a> {
    rank: usize,
    enzyme: &'a str,
    yield_pct: f64,
    conversion_pct: f64,
    product_carbon_mass: f64,
    substrate_carbon_mass: f64,
    products: String,
}

/// Write the ranked summary table as CSV.
pub fn write_summary_csv(analysis: &Analysis, path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;

    for (i, r) in analysis.results.iter().enumerate() {
        writer.serialize(SummaryRecord {
            rank: i + 1,
            enzyme: &r.enzyme,
            yield_pct: r.yield_pct,
            conversion_pct: r.conversion_pct,
            product_carbon_mass: r.product_carbon_mass,
            substrate_carbon_mass: r.substrate_carbon_mass,
            products: r
                .products
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })?;
    }

    writer.flush()?;
    info!(path = %path.display(), "CSV exported");
    Ok(())
}
