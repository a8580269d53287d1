//! In-memory workbook model.
//!
//! The whole file is read once up front; later stages only see `Sheet`
//! values. Loading goes through `calamine`, which handles xlsx, xlsm, xls and
//! ods.

use calamine::{open_workbook_auto, Data, Reader};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{ValueError, WorkbookError};
use crate::types::ColumnRole;

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Cell {
    /// Trimmed text content, `None` for empty or blank cells.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) => Some(format_number(*n)),
            Cell::Text(s) => {
                let t = s.trim();
                (!t.is_empty()).then(|| t.to_string())
            }
            Cell::Bool(b) => Some(b.to_string()),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.as_text().is_none()
    }

    /// Parse a literal the way a spreadsheet would display it.
    #[cfg(test)]
    pub fn guess(raw: &str) -> Self {
        let t = raw.trim();
        if t.is_empty() {
            Cell::Empty
        } else if let Ok(n) = t.parse::<f64>() {
            Cell::Number(n)
        } else {
            Cell::Text(raw.to_string())
        }
    }
}

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => Cell::Empty,
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Bool(*b),
            Data::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }
}

/// Integers print without a trailing ".0" so labels like enzyme "12" survive.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// One sheet: trimmed header labels plus data rows below the header.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    /// 1-based spreadsheet row of the header line
    header_row: usize,
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let headers = headers.into_iter().map(|h| h.trim().to_string()).collect();
        Self {
            name: name.into(),
            headers,
            rows,
            header_row: 1,
        }
    }

    /// Build from a raw grid: the first non-blank row becomes the header.
    pub fn from_grid(name: impl Into<String>, grid: Vec<Vec<Cell>>, first_row: usize) -> Self {
        let name = name.into();
        let header_pos = grid
            .iter()
            .position(|row| row.iter().any(|c| !c.is_blank()));

        let Some(header_pos) = header_pos else {
            return Self {
                name,
                headers: Vec::new(),
                rows: Vec::new(),
                header_row: first_row + 1,
            };
        };

        let mut rows = grid;
        let data = rows.split_off(header_pos + 1);
        let headers = rows[header_pos]
            .iter()
            .map(|c| c.as_text().unwrap_or_default())
            .collect();

        Self {
            name,
            headers,
            rows: data,
            header_row: first_row + header_pos + 1,
        }
    }

    /// Cell at data row `row`, column `col`; out-of-range reads as empty.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    /// 1-based spreadsheet row number of data row `row`.
    pub fn spreadsheet_row(&self, row: usize) -> usize {
        self.header_row + row + 1
    }

    /// Optional numeric cell. Blank is `Ok(None)`; unparsable text is an error.
    pub fn number(
        &self,
        row: usize,
        col: usize,
        role: ColumnRole,
    ) -> Result<Option<f64>, ValueError> {
        match self.cell(row, col) {
            Cell::Number(n) => Ok(Some(*n)),
            Cell::Empty => Ok(None),
            other => {
                let Some(text) = other.as_text() else {
                    return Ok(None);
                };
                text.parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .map(Some)
                    .ok_or_else(|| ValueError::InvalidNumber {
                        sheet: self.name.clone(),
                        row: self.spreadsheet_row(row),
                        role,
                        value: text,
                    })
            }
        }
    }

    /// Numeric cell that must be present.
    pub fn required_number(
        &self,
        row: usize,
        col: usize,
        role: ColumnRole,
    ) -> Result<f64, ValueError> {
        self.number(row, col, role)?
            .ok_or_else(|| ValueError::MissingValue {
                sheet: self.name.clone(),
                row: self.spreadsheet_row(row),
                role,
            })
    }

    /// Trimmed text of a cell, if any.
    pub fn text(&self, row: usize, col: usize) -> Option<String> {
        self.cell(row, col).as_text()
    }
}

/// Where a workbook came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub file_name: String,
    pub sha256: String,
}

/// All sheets of one input file.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    source: Option<SourceInfo>,
}

impl Workbook {
    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        Self {
            sheets,
            source: None,
        }
    }

    /// Read every sheet of a spreadsheet file into memory.
    pub fn open(path: &Path) -> Result<Self, WorkbookError> {
        let open_err = |message: String| WorkbookError::Open {
            path: path.display().to_string(),
            message,
        };

        if !path.is_file() {
            return Err(open_err("file not found".to_string()));
        }

        let sha256 = hash_file(path)?;
        let mut reader = open_workbook_auto(path).map_err(|e| open_err(e.to_string()))?;

        let mut sheets = Vec::new();
        for name in reader.sheet_names() {
            let range = reader
                .worksheet_range(&name)
                .map_err(|e| WorkbookError::Sheet {
                    sheet: name.clone(),
                    message: e.to_string(),
                })?;

            let first_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);
            let grid: Vec<Vec<Cell>> = range
                .rows()
                .map(|row| row.iter().map(Cell::from).collect())
                .collect();

            let sheet = Sheet::from_grid(name, grid, first_row);
            debug!(
                sheet = %sheet.name,
                columns = sheet.headers.len(),
                rows = sheet.rows.len(),
                "Sheet loaded"
            );
            sheets.push(sheet);
        }

        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("unknown")
            .to_string();

        info!(file = %file_name, sheets = sheets.len(), "Workbook loaded");

        Ok(Self {
            sheets,
            source: Some(SourceInfo { file_name, sha256 }),
        })
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn source(&self) -> Option<&SourceInfo> {
        self.source.as_ref()
    }
}

/// SHA-256 of a file's bytes.
fn hash_file(path: &Path) -> Result<String, WorkbookError> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
