//! Compound reference table.
//!
//! Static molecular data (molecular weight, carbon count) keyed by compound
//! name. The builtin table is versioned; configuration may extend or replace
//! it. Duplicate names are rejected at load time.

use std::collections::HashMap;
use tracing::debug;

use crate::config::ReferenceConfig;
use crate::error::ReferenceError;
use crate::types::CompoundInfo;

/// Version tag of the builtin table.
pub const BUILTIN_VERSION: &str = "2024.2";

/// Substrate used by every reaction (glycolaldehyde).
pub const GALD: &str = "GALD";

/// Fallback for unrecognized product peaks; most unknown peaks are C4 isomers.
pub const DEFAULT_MOLECULAR_WEIGHT: f64 = 120.10;
pub const DEFAULT_CARBON_COUNT: u32 = 4;

const BUILTIN: &[(&str, f64, u32)] = &[
    (GALD, 60.05, 2),
    // C4 sugars
    ("赤藓糖", 120.10, 4),
    ("赤藓酮糖", 120.10, 4),
    ("苏阿糖", 120.10, 4),
    ("Erythrose", 120.10, 4),
    ("Erythrulose", 120.10, 4),
    ("Threose", 120.10, 4),
    // C6 sugars
    ("葡萄糖", 180.16, 6),
    ("山梨糖", 180.16, 6),
    ("阿洛糖", 180.16, 6),
    ("阿洛酮糖", 180.16, 6),
    ("果糖", 180.16, 6),
    ("甘露糖", 180.16, 6),
    ("Glucose", 180.16, 6),
    ("Sorbose", 180.16, 6),
    ("Allose", 180.16, 6),
    ("Allulose", 180.16, 6),
    ("Fructose", 180.16, 6),
    ("Mannose", 180.16, 6),
];

/// Validated name -> compound lookup.
#[derive(Debug, Clone)]
pub struct CompoundTable {
    entries: Vec<CompoundInfo>,
    index: HashMap<String, usize>,
    default: CompoundInfo,
}

impl CompoundTable {
    /// The builtin table alone.
    pub fn builtin() -> Result<Self, ReferenceError> {
        Self::from_entries(Self::builtin_entries())
    }

    /// Builtin table combined with configured entries.
    pub fn from_config(config: &ReferenceConfig) -> Result<Self, ReferenceError> {
        if config.compounds.is_empty() && !config.replace_builtin {
            return Self::builtin();
        }
        let mut entries = if config.replace_builtin {
            Vec::new()
        } else {
            Self::builtin_entries()
        };
        entries.extend(config.compounds.iter().cloned());
        Self::from_entries(entries)
    }

    /// Build a table, failing on duplicate names or non-physical entries.
    pub fn from_entries(entries: Vec<CompoundInfo>) -> Result<Self, ReferenceError> {
        let mut index = HashMap::with_capacity(entries.len());

        for (i, entry) in entries.iter().enumerate() {
            validate_entry(entry)?;
            if index.insert(entry.name.clone(), i).is_some() {
                return Err(ReferenceError::DuplicateCompound(entry.name.clone()));
            }
        }

        debug!(compounds = entries.len(), "Compound reference table loaded");

        Ok(Self {
            entries,
            index,
            default: CompoundInfo::new("default", DEFAULT_MOLECULAR_WEIGHT, DEFAULT_CARBON_COUNT),
        })
    }

    fn builtin_entries() -> Vec<CompoundInfo> {
        BUILTIN
            .iter()
            .map(|&(name, mw, carbon)| CompoundInfo::new(name, mw, carbon))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&CompoundInfo> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// Carbon fraction for a compound, falling back to the C4 default.
    pub fn carbon_fraction(&self, name: &str) -> f64 {
        self.get(name).unwrap_or(&self.default).carbon_fraction()
    }

    /// Carbon fraction of the default (C4) compound.
    pub fn default_carbon_fraction(&self) -> f64 {
        self.default.carbon_fraction()
    }

    pub fn entries(&self) -> &[CompoundInfo] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

fn validate_entry(entry: &CompoundInfo) -> Result<(), ReferenceError> {
    let invalid = |reason: &str| ReferenceError::InvalidEntry {
        name: entry.name.clone(),
        reason: reason.to_string(),
    };

    if entry.name.trim().is_empty() {
        return Err(invalid("empty name"));
    }
    if !(entry.molecular_weight.is_finite() && entry.molecular_weight > 0.0) {
        return Err(invalid("molecular weight must be > 0"));
    }
    if entry.carbon_count == 0 {
        return Err(invalid("carbon count must be > 0"));
    }
    if entry.carbon_fraction() > 1.0 {
        return Err(invalid("carbon mass exceeds molecular weight"));
    }
    Ok(())
}
