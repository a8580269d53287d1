//! Report rendering and export.
//!
//! Consumes a finished `Analysis` only; nothing here feeds back into the
//! calculation.

use std::collections::HashSet;

pub mod console;
pub mod export;
pub mod xlsx;

/// Excel's sheet-name length limit.
pub const MAX_SHEET_NAME: usize = 31;

pub const SUMMARY_SHEET: &str = "Summary";
pub const CALIBRATION_SHEET: &str = "Calibration";
pub const RT_SHEET: &str = "RT Matching";

/// Allocates unique, spreadsheet-safe sheet names.
///
/// Spaces and characters Excel forbids become `_`, names are cut to 31
/// characters, and case-insensitive clashes get a numeric suffix.
#[derive(Debug, Default)]
pub struct SheetNamer {
    used: HashSet<String>,
}

impl SheetNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a fixed name such as the summary sheet.
    pub fn reserve(&mut self, name: &str) {
        self.used.insert(name.to_lowercase());
    }

    pub fn allocate(&mut self, raw: &str) -> String {
        let base = sanitize(raw);

        let mut candidate = base.clone();
        let mut n = 2;
        while self.used.contains(&candidate.to_lowercase()) {
            let suffix = format!("_{}", n);
            let keep = MAX_SHEET_NAME - suffix.chars().count();
            candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
            n += 1;
        }

        self.used.insert(candidate.to_lowercase());
        candidate
    }
}

/// Names Excel reserves for its own use.
const RESERVED_NAMES: [&str; 1] = ["History"];

fn sanitize(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    // Cutting can expose an apostrophe at the end, so trim after truncating
    let truncated: String = cleaned
        .trim_matches('\'')
        .chars()
        .take(MAX_SHEET_NAME)
        .collect();
    let name = truncated.trim_matches('\'');

    if name.is_empty() {
        "Sheet".to_string()
    } else if RESERVED_NAMES.iter().any(|r| r.eq_ignore_ascii_case(name)) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}
