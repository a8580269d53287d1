//! Error types for the carbon-yield pipeline.
//!
//! Every variant is fatal to the current run. Stages never swallow an error
//! from an earlier stage.

use thiserror::Error;

use crate::types::{ColumnRole, SheetKind};

/// Main error type for an analysis run.
#[derive(Error, Debug)]
pub enum YieldError {
    #[error("Workbook error: {0}")]
    Workbook(#[from] WorkbookError),

    #[error("{0}")]
    Resolve(#[from] ResolveError),

    #[error("Invalid cell value: {0}")]
    Value(#[from] ValueError),

    #[error("Calibration error: {0}")]
    Calibration(#[from] CalibrationError),

    #[error("Reaction data error: {0}")]
    Reaction(#[from] ReactionError),

    #[error("Compound reference error: {0}")]
    Reference(#[from] ReferenceError),
}

#[derive(Error, Debug)]
pub enum WorkbookError {
    #[error("Failed to open {path}: {message}")]
    Open { path: String, message: String },

    #[error("Failed to read sheet '{sheet}': {message}")]
    Sheet { sheet: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Missing {sheet} sheet (looked for: {})", .tried.join(", "))]
    MissingSheet { sheet: SheetKind, tried: Vec<String> },

    #[error("Missing {role} column in {sheet} sheet '{sheet_name}'")]
    MissingColumn {
        sheet: SheetKind,
        sheet_name: String,
        role: String,
    },

    #[error("Invalid column keyword: {0}")]
    Keyword(#[from] regex::Error),
}

/// Cell-level problems; row numbers are 1-based spreadsheet rows.
#[derive(Error, Debug)]
pub enum ValueError {
    #[error("{sheet} sheet, row {row}: {role} is empty")]
    MissingValue {
        sheet: String,
        row: usize,
        role: ColumnRole,
    },

    #[error("{sheet} sheet, row {row}: {role} value '{value}' is not a number")]
    InvalidNumber {
        sheet: String,
        row: usize,
        role: ColumnRole,
        value: String,
    },

    #[error("{sheet} sheet, row {row}: {role} must be > 0, got {value}")]
    NonPositive {
        sheet: String,
        row: usize,
        role: ColumnRole,
        value: f64,
    },
}

#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("No {0} standard rows found in the standard sheet")]
    CalibrationDataMissing(String),

    #[error("{name} response factor must be > 0, got {value}")]
    NonPositiveResponse { name: String, value: f64 },
}

#[derive(Error, Debug)]
pub enum ReactionError {
    #[error("No enzyme blocks found in reaction sheet '{0}'")]
    NoReactionsFound(String),
}

#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("Duplicate compound in reference table: {0}")]
    DuplicateCompound(String),

    #[error("Invalid reference entry '{name}': {reason}")]
    InvalidEntry { name: String, reason: String },
}

/// Report export failures. Exports run after the analysis is complete, so
/// these are returned directly rather than through `YieldError`.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Spreadsheet write failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Spreadsheet read-back failed: {0}")]
    ReadBack(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pipeline operations.
pub type AnalysisResult<T> = Result<T, YieldError>;
