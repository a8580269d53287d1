//! Core types for the Biosyn carbon-yield calculator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mass of one carbon atom used throughout the carbon-fraction math.
pub const CARBON_MASS: f64 = 12.0;

/// Sentinel compound name for a peak the RT matcher could not identify.
pub const UNMATCHED: &str = "unmatched";

/// Reference data for a single compound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundInfo {
    pub name: String,
    /// g/mol
    pub molecular_weight: f64,
    pub carbon_count: u32,
}

impl CompoundInfo {
    pub fn new(name: impl Into<String>, molecular_weight: f64, carbon_count: u32) -> Self {
        Self {
            name: name.into(),
            molecular_weight,
            carbon_count,
        }
    }

    /// Fraction of the compound's mass attributable to carbon.
    pub fn carbon_fraction(&self) -> f64 {
        self.carbon_count as f64 * CARBON_MASS / self.molecular_weight
    }
}

/// Logical sheets expected in an input workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetKind {
    /// Known-concentration calibration measurements
    Standard,
    /// Enzyme reaction peak measurements
    Reaction,
}

impl std::fmt::Display for SheetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            SheetKind::Standard => "standard",
            SheetKind::Reaction => "reaction",
        })
    }
}

/// Canonical column roles a header can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Enzyme,
    Area,
    Concentration,
    RetentionTime,
    Compound,
}

impl ColumnRole {
    /// Roles in classification priority order.
    pub const ALL: [ColumnRole; 5] = [
        ColumnRole::Enzyme,
        ColumnRole::Area,
        ColumnRole::Concentration,
        ColumnRole::RetentionTime,
        ColumnRole::Compound,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnRole::Enzyme => "enzyme",
            ColumnRole::Area => "area",
            ColumnRole::Concentration => "concentration",
            ColumnRole::RetentionTime => "retention_time",
            ColumnRole::Compound => "compound",
        }
    }
}

impl std::fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Role -> column mapping for one sheet.
///
/// Holds the header label and its position so later stages never look
/// headers up by name again.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnMap {
    columns: BTreeMap<ColumnRole, MappedColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedColumn {
    pub label: String,
    pub index: usize,
}

impl ColumnMap {
    /// Insert a role unless it is already mapped. Returns false if the role
    /// was taken by an earlier header.
    pub(crate) fn insert_first(&mut self, role: ColumnRole, label: &str, index: usize) -> bool {
        if self.columns.contains_key(&role) {
            return false;
        }
        self.columns.insert(
            role,
            MappedColumn {
                label: label.to_string(),
                index,
            },
        );
        true
    }

    pub fn get(&self, role: ColumnRole) -> Option<&MappedColumn> {
        self.columns.get(&role)
    }

    pub fn index(&self, role: ColumnRole) -> Option<usize> {
        self.columns.get(&role).map(|c| c.index)
    }

    pub fn contains(&self, role: ColumnRole) -> bool {
        self.columns.contains_key(&role)
    }
}

/// One calibration measurement from the standard sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardRow {
    pub compound_name: String,
    pub peak_area: f64,
    /// mg/mL
    pub concentration: f64,
    pub retention_time: Option<f64>,
}

/// Response factors derived from the standard sheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationParams {
    pub c4_response_factor: f64,
    pub gald_response_factor: f64,
}

/// Reference retention time of a standard compound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RtReferenceEntry {
    pub compound_name: String,
    pub standard_retention_time: f64,
}

/// A resolved peak from the reaction sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionPeak {
    pub enzyme: String,
    pub compound_name: String,
    pub peak_area: f64,
    /// True when the compound was identified by retention time
    pub is_predicted: bool,
    /// Signed deviation (row RT - reference RT) for RT-predicted peaks
    pub rt_deviation: Option<f64>,
}

/// All peaks recorded for one enzyme block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnzymeReaction {
    pub enzyme_name: String,
    pub substrate_residual_peak: f64,
    pub products: Vec<ReactionPeak>,
}

impl EnzymeReaction {
    pub fn new(enzyme_name: impl Into<String>) -> Self {
        Self {
            enzyme_name: enzyme_name.into(),
            substrate_residual_peak: 0.0,
            products: Vec::new(),
        }
    }
}

/// Carbon accounting for one product peak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCarbon {
    pub name: String,
    pub peak_area: f64,
    /// mg/mL, rounded to 4 places
    pub concentration: f64,
    /// mg/mL carbon, rounded to 4 places
    pub carbon_mass: f64,
    pub is_predicted: bool,
    pub rt_deviation: Option<f64>,
}

/// Final per-enzyme carbon yield.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldResult {
    pub enzyme: String,
    /// Percent, rounded to 2 places
    pub yield_pct: f64,
    /// 100 - yield_pct, rounded to 2 places
    pub conversion_pct: f64,
    pub product_carbon_mass: f64,
    pub substrate_carbon_mass: f64,
    pub substrate_peak_area: f64,
    pub substrate_concentration: f64,
    pub products: Vec<ProductCarbon>,
}

/// Diagnostic view of how one reference compound matched reaction rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RtDiagnostic {
    pub compound_name: String,
    pub standard_retention_time: f64,
    /// Closest retention time seen in the reaction sheet
    pub best_retention_time: Option<f64>,
    /// best_retention_time - standard_retention_time
    pub deviation: Option<f64>,
    pub within_tolerance: bool,
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
