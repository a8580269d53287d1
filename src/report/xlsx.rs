//! Multi-sheet `.xlsx` export and summary read-back.

use calamine::{open_workbook, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use super::{SheetNamer, CALIBRATION_SHEET, RT_SHEET, SUMMARY_SHEET};
use crate::error::ExportError;
use crate::pipeline::Analysis;
use crate::types::YieldResult;
use crate::workbook::{Cell, Sheet};

const SUMMARY_HEADERS: [&str; 7] = [
    "Rank",
    "Enzyme",
    "Carbon Yield (%)",
    "Conversion (%)",
    "Product Carbon (mg/mL)",
    "Substrate Carbon (mg/mL)",
    "Products",
];

const DETAIL_HEADERS: [&str; 6] = [
    "Compound",
    "Type",
    "Peak Area",
    "Concentration (mg/mL)",
    "Carbon (mg/mL)",
    "RT Deviation",
];

/// One row of the Summary sheet as read back from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub rank: u32,
    pub enzyme: String,
    pub yield_pct: f64,
    pub conversion_pct: f64,
}

/// Write the full report workbook.
pub fn write_workbook(analysis: &Analysis, path: &Path) -> Result<(), ExportError> {
    let bold = Format::new().set_bold();
    let mut workbook = Workbook::new();
    let mut namer = SheetNamer::new();
    namer.reserve(SUMMARY_SHEET);
    namer.reserve(CALIBRATION_SHEET);
    namer.reserve(RT_SHEET);

    write_summary(workbook.add_worksheet(), analysis, &bold)?;

    for result in &analysis.results {
        let name = namer.allocate(&result.enzyme);
        let sheet = workbook.add_worksheet();
        sheet.set_name(&name)?;
        write_detail(sheet, result, &analysis.substrate, &bold)?;
    }

    write_calibration(workbook.add_worksheet(), analysis, &bold)?;

    if let Some(ref diags) = analysis.rt_diagnostics {
        let sheet = workbook.add_worksheet();
        sheet.set_name(RT_SHEET)?;
        write_headers(
            sheet,
            &[
                "Compound",
                "Standard RT",
                "Best Reaction RT",
                "Deviation",
                "Within Tolerance",
            ],
            &bold,
        )?;
        for (i, d) in diags.iter().enumerate() {
            let row = i as u32 + 1;
            sheet.write_string(row, 0, &d.compound_name)?;
            sheet.write_number(row, 1, d.standard_retention_time)?;
            if let Some(rt) = d.best_retention_time {
                sheet.write_number(row, 2, rt)?;
            }
            if let Some(dev) = d.deviation {
                sheet.write_number(row, 3, dev)?;
            }
            sheet.write_string(row, 4, if d.within_tolerance { "yes" } else { "no" })?;
        }
    }

    workbook.save(path)?;
    info!(path = %path.display(), enzymes = analysis.results.len(), "Workbook exported");
    Ok(())
}

fn write_headers(sheet: &mut Worksheet, headers: &[&str], bold: &Format) -> Result<(), XlsxError> {
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, bold)?;
        sheet.set_column_width(col as u16, 18.0)?;
    }
    sheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn write_summary(sheet: &mut Worksheet, analysis: &Analysis, bold: &Format) -> Result<(), XlsxError> {
    sheet.set_name(SUMMARY_SHEET)?;
    write_headers(sheet, &SUMMARY_HEADERS, bold)?;

    for (i, r) in analysis.results.iter().enumerate() {
        let row = i as u32 + 1;
        let products = r
            .products
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        sheet.write_number(row, 0, (i + 1) as f64)?;
        sheet.write_string(row, 1, &r.enzyme)?;
        sheet.write_number(row, 2, r.yield_pct)?;
        sheet.write_number(row, 3, r.conversion_pct)?;
        sheet.write_number(row, 4, r.product_carbon_mass)?;
        sheet.write_number(row, 5, r.substrate_carbon_mass)?;
        sheet.write_string(row, 6, &products)?;
    }
    Ok(())
}

/// Substrate row first, then products in encounter order.
fn write_detail(
    sheet: &mut Worksheet,
    result: &YieldResult,
    substrate: &str,
    bold: &Format,
) -> Result<(), XlsxError> {
    write_headers(sheet, &DETAIL_HEADERS, bold)?;

    sheet.write_string(1, 0, substrate)?;
    sheet.write_string(1, 1, "Substrate")?;
    sheet.write_number(1, 2, result.substrate_peak_area)?;
    sheet.write_number(1, 3, result.substrate_concentration)?;
    sheet.write_number(1, 4, result.substrate_carbon_mass)?;

    for (i, p) in result.products.iter().enumerate() {
        let row = i as u32 + 2;
        let kind = if p.is_predicted {
            "Product (RT predicted)"
        } else {
            "Product"
        };
        sheet.write_string(row, 0, &p.name)?;
        sheet.write_string(row, 1, kind)?;
        sheet.write_number(row, 2, p.peak_area)?;
        sheet.write_number(row, 3, p.concentration)?;
        sheet.write_number(row, 4, p.carbon_mass)?;
        if let Some(dev) = p.rt_deviation {
            sheet.write_number(row, 5, dev)?;
        }
    }
    Ok(())
}

fn write_calibration(
    sheet: &mut Worksheet,
    analysis: &Analysis,
    bold: &Format,
) -> Result<(), XlsxError> {
    sheet.set_name(CALIBRATION_SHEET)?;
    write_headers(sheet, &["Sugar Type", "Response Factor", "Carbon Fraction"], bold)?;

    sheet.write_string(1, 0, "C4")?;
    sheet.write_number(1, 1, analysis.calibration.c4_response_factor)?;
    sheet.write_number(1, 2, analysis.c4_carbon_fraction)?;

    sheet.write_string(2, 0, &analysis.substrate)?;
    sheet.write_number(2, 1, analysis.calibration.gald_response_factor)?;
    sheet.write_number(2, 2, analysis.gald_carbon_fraction)?;
    Ok(())
}

/// Read the Summary sheet of an exported workbook.
pub fn read_summary(path: &Path) -> Result<Vec<SummaryRow>, ExportError> {
    let read_err = |e: calamine::XlsxError| ExportError::ReadBack(e.to_string());

    let mut workbook: Xlsx<_> = open_workbook(path).map_err(read_err)?;
    let range = workbook.worksheet_range(SUMMARY_SHEET).map_err(read_err)?;

    let grid: Vec<Vec<Cell>> = range
        .rows()
        .map(|row| row.iter().map(Cell::from).collect())
        .collect();
    let sheet = Sheet::from_grid(SUMMARY_SHEET, grid, 0);

    let number = |i: usize, col: usize| match sheet.cell(i, col) {
        Cell::Number(n) => Ok(*n),
        other => Err(ExportError::ReadBack(format!(
            "{} sheet, row {}: {} '{}' is not a number",
            SUMMARY_SHEET,
            sheet.spreadsheet_row(i),
            SUMMARY_HEADERS[col],
            other.as_text().unwrap_or_default()
        ))),
    };

    let mut rows = Vec::with_capacity(sheet.rows.len());
    for i in 0..sheet.rows.len() {
        let Some(enzyme) = sheet.text(i, 1) else {
            continue;
        };
        rows.push(SummaryRow {
            rank: number(i, 0)? as u32,
            enzyme,
            yield_pct: number(i, 2)?,
            conversion_pct: number(i, 3)?,
        });
    }
    Ok(rows)
}
