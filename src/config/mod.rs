//! Configuration management for the carbon-yield calculator.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::{ColumnRole, CompoundInfo};

pub mod paths;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Path to the config file (set after loading)
    #[serde(skip)]
    pub path: PathBuf,

    /// Calculation parameters
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Accepted sheet names
    #[serde(default)]
    pub sheets: SheetConfig,

    /// Header keywords per column role
    #[serde(default)]
    pub columns: ColumnConfig,

    /// Compound reference table overrides
    #[serde(default)]
    pub reference: ReferenceConfig,

    /// Export settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from an explicit path, or from the default
    /// location. A missing default file yields the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => {
                let path = paths::config_file();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self {
                        path,
                        ..Self::default()
                    })
                }
            }
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.path = path.to_path_buf();

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let tol = self.analysis.rt_tolerance;
        if !(tol.is_finite() && tol > 0.0) {
            anyhow::bail!("analysis.rt_tolerance must be a positive number, got {}", tol);
        }
        if self.analysis.substrate.trim().is_empty() {
            anyhow::bail!("analysis.substrate must not be empty");
        }
        if self.sheets.standard.is_empty() {
            anyhow::bail!("sheets.standard needs at least one sheet name");
        }
        if self.sheets.reaction.is_empty() {
            anyhow::bail!("sheets.reaction needs at least one sheet name");
        }
        for role in ColumnRole::ALL {
            let keywords = self.columns.keywords(role);
            if keywords.is_empty() || keywords.iter().any(|k| k.trim().is_empty()) {
                anyhow::bail!("columns.{} needs non-empty keywords", role);
            }
        }
        Ok(())
    }
}

/// How C4 calibration rows are selected from the standard sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StandardSelection {
    /// Any labelled row that is not an excluded label, substrate included
    #[default]
    Permissive,
    /// Only rows naming a recognized C4 sugar
    Strict,
}

impl std::fmt::Display for StandardSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            StandardSelection::Permissive => "permissive",
            StandardSelection::Strict => "strict",
        })
    }
}

/// Calculation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Maximum |RT deviation| accepted as a match
    #[serde(default = "default_rt_tolerance")]
    pub rt_tolerance: f64,

    #[serde(default)]
    pub standard_selection: StandardSelection,

    /// Substrate compound label
    #[serde(default = "default_substrate")]
    pub substrate: String,

    /// Placeholder or header-echo labels never treated as standards
    #[serde(default = "default_excluded_labels")]
    pub excluded_labels: Vec<String>,

    /// Recognized C4 sugars for strict selection
    #[serde(default = "default_c4_standards")]
    pub c4_standards: Vec<String>,
}

fn default_rt_tolerance() -> f64 {
    0.15
}

fn default_substrate() -> String {
    crate::compounds::GALD.to_string()
}

fn default_excluded_labels() -> Vec<String> {
    to_strings(&["6C标品名称", "样品名称", "反应条件/体系"])
}

fn default_c4_standards() -> Vec<String> {
    to_strings(&[
        "赤藓糖",
        "赤藓酮糖",
        "苏阿糖",
        "Erythrose",
        "Erythrulose",
        "Threose",
    ])
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            rt_tolerance: default_rt_tolerance(),
            standard_selection: StandardSelection::default(),
            substrate: default_substrate(),
            excluded_labels: default_excluded_labels(),
            c4_standards: default_c4_standards(),
        }
    }
}

/// Accepted sheet names, tried in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    #[serde(default = "default_standard_sheets")]
    pub standard: Vec<String>,

    #[serde(default = "default_reaction_sheets")]
    pub reaction: Vec<String>,
}

fn default_standard_sheets() -> Vec<String> {
    to_strings(&[
        "汇总",
        "标准曲线",
        "标品",
        "Standards",
        "Standard",
        "Calibration",
        "Summary",
    ])
}

fn default_reaction_sheets() -> Vec<String> {
    to_strings(&["反应数据", "反应", "Reactions", "Reaction", "Reaction Data"])
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            standard: default_standard_sheets(),
            reaction: default_reaction_sheets(),
        }
    }
}

/// Header keywords per role. Roles are tried in `ColumnRole::ALL` order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnConfig {
    #[serde(default = "default_enzyme_keywords")]
    pub enzyme: Vec<String>,

    #[serde(default = "default_area_keywords")]
    pub area: Vec<String>,

    #[serde(default = "default_concentration_keywords")]
    pub concentration: Vec<String>,

    #[serde(default = "default_rt_keywords")]
    pub retention_time: Vec<String>,

    #[serde(default = "default_compound_keywords")]
    pub compound: Vec<String>,
}

impl ColumnConfig {
    pub fn keywords(&self, role: ColumnRole) -> &[String] {
        match role {
            ColumnRole::Enzyme => &self.enzyme,
            ColumnRole::Area => &self.area,
            ColumnRole::Concentration => &self.concentration,
            ColumnRole::RetentionTime => &self.retention_time,
            ColumnRole::Compound => &self.compound,
        }
    }
}

fn default_enzyme_keywords() -> Vec<String> {
    to_strings(&["enzyme", "酶"])
}

fn default_area_keywords() -> Vec<String> {
    to_strings(&["area", "峰面积"])
}

fn default_concentration_keywords() -> Vec<String> {
    to_strings(&["conc", "浓度"])
}

fn default_rt_keywords() -> Vec<String> {
    to_strings(&["retention", "rt", "保留时间"])
}

fn default_compound_keywords() -> Vec<String> {
    to_strings(&["compound", "substance", "物质", "标品名称", "name", "名称"])
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            enzyme: default_enzyme_keywords(),
            area: default_area_keywords(),
            concentration: default_concentration_keywords(),
            retention_time: default_rt_keywords(),
            compound: default_compound_keywords(),
        }
    }
}

/// Compound reference table overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// Drop the builtin table and use only `compounds`
    #[serde(default)]
    pub replace_builtin: bool,

    #[serde(default)]
    pub compounds: Vec<CompoundInfo>,
}

/// Export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for generated workbooks
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_file_prefix() -> String {
    "carbon_yield".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            file_prefix: default_file_prefix(),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.analysis.rt_tolerance, 0.15);
        assert_eq!(config.analysis.substrate, "GALD");
        assert_eq!(config.sheets.standard[0], "汇总");
        assert_eq!(config.sheets.reaction[0], "反应数据");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[analysis]
rt_tolerance = 0.2
standard_selection = "strict"

[[reference.compounds]]
name = "Xylose"
molecular_weight = 150.13
carbon_count = 5
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.analysis.rt_tolerance, 0.2);
        assert_eq!(config.analysis.standard_selection, StandardSelection::Strict);
        assert_eq!(config.analysis.substrate, "GALD");
        assert_eq!(config.reference.compounds.len(), 1);
        assert!(!config.columns.area.is_empty());
        assert_eq!(config.path, file.path());
    }

    #[test]
    fn test_rejects_bad_tolerance() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[analysis]\nrt_tolerance = -1.0\n").unwrap();
        assert!(Config::load_from(file.path()).is_err());
    }

    #[test]
    fn test_rejects_empty_keywords() {
        let mut config = Config::default();
        config.columns.area.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::load(Some(&missing)).is_err());
    }
}
