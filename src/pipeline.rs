//! End-to-end analysis: resolve -> calibrate -> match -> parse -> compute.
//!
//! Each run builds its own calibration and reaction map; nothing is shared
//! between runs. The first failing stage aborts the run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use uuid::Uuid;

use crate::calibration;
use crate::compounds::CompoundTable;
use crate::config::{AnalysisConfig, Config, StandardSelection};
use crate::error::AnalysisResult;
use crate::matcher::{RtMatcher, RtReference};
use crate::metrics::{YieldCalculator, GALD_CARBON_FRACTION};
use crate::reaction::ReactionParser;
use crate::resolver::Resolver;
use crate::types::{CalibrationParams, ColumnRole, RtDiagnostic, YieldResult};
use crate::workbook::{SourceInfo, Workbook};

/// Complete result of one run, handed to the report renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub source: Option<SourceInfo>,
    pub standard_sheet: String,
    pub reaction_sheet: String,
    /// Substrate label (GALD)
    pub substrate: String,
    pub rt_tolerance: f64,
    pub standard_selection: StandardSelection,
    pub calibration: CalibrationParams,
    pub c4_carbon_fraction: f64,
    pub gald_carbon_fraction: f64,
    /// Ranked by yield, highest first
    pub results: Vec<YieldResult>,
    /// Present when the reaction sheet has a retention-time column
    pub rt_diagnostics: Option<Vec<RtDiagnostic>>,
}

/// Pipeline runner holding the per-process static inputs.
pub struct Analyzer {
    settings: AnalysisConfig,
    resolver: Resolver,
    compounds: CompoundTable,
}

impl Analyzer {
    pub fn new(config: &Config) -> AnalysisResult<Self> {
        Ok(Self {
            settings: config.analysis.clone(),
            resolver: Resolver::new(&config.sheets, &config.columns)?,
            compounds: CompoundTable::from_config(&config.reference)?,
        })
    }

    pub fn settings(&self) -> &AnalysisConfig {
        &self.settings
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Load a spreadsheet file and run the full pipeline on it.
    pub fn analyze_file(&self, path: &Path) -> AnalysisResult<Analysis> {
        let workbook = Workbook::open(path)?;
        self.analyze(&workbook)
    }

    /// Run the full pipeline on an in-memory workbook.
    pub fn analyze(&self, workbook: &Workbook) -> AnalysisResult<Analysis> {
        let resolved = self.resolver.resolve(workbook)?;

        let standards = calibration::read_standards(&resolved.standard, &self.settings)?;
        let params = calibration::build_calibration(&standards, &self.settings)?;

        let matcher = RtMatcher::new(
            RtReference::from_standards(&standards),
            self.settings.rt_tolerance,
        );

        let parsed =
            ReactionParser::new(&matcher, &self.settings.substrate).parse(&resolved.reaction)?;

        let calculator = YieldCalculator::new(&self.compounds, params);
        let results = calculator.compute_all(&parsed.reactions);

        let rt_diagnostics = resolved
            .reaction
            .columns
            .contains(ColumnRole::RetentionTime)
            .then(|| matcher.diagnostics(&parsed.observed_rts));

        info!(
            enzymes = results.len(),
            best = results.first().map(|r| r.enzyme.as_str()).unwrap_or("-"),
            "Analysis complete"
        );

        Ok(Analysis {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            source: workbook.source().cloned(),
            standard_sheet: resolved.standard.sheet.name.clone(),
            reaction_sheet: resolved.reaction.sheet.name.clone(),
            substrate: self.settings.substrate.clone(),
            rt_tolerance: self.settings.rt_tolerance,
            standard_selection: self.settings.standard_selection,
            calibration: params,
            c4_carbon_fraction: self.compounds.default_carbon_fraction(),
            gald_carbon_fraction: GALD_CARBON_FRACTION,
            results,
            rt_diagnostics,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::{CalibrationError, WorkbookError, YieldError};
    use crate::workbook::{Cell, Sheet};

    fn sheet(name: &str, headers: &[&str], rows: &[&[&str]]) -> Sheet {
        Sheet::new(
            name,
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| Cell::guess(s)).collect())
                .collect(),
        )
    }

    /// A workbook laid out like the lab's hand-prepared files.
    pub(crate) fn sample_workbook() -> Workbook {
        Workbook::from_sheets(vec![
            sheet(
                "汇总",
                &["4C标品名称", "峰面积", "浓度（mg/ml）", "保留时间"],
                &[
                    &["赤藓糖", "100", "10", "5.0"],
                    &["苏阿糖", "200", "20", "6.0"],
                    &["GALD", "50", "5", "3.0"],
                    &["", "", "", ""],
                    &["样品名称", "", "", ""],
                ],
            ),
            sheet(
                "反应数据",
                &["酶名称", "对应物质", "保留时间", "峰面积"],
                &[
                    &["E1", "", "", ""],
                    &["", "GALD", "3.02", "50"],
                    &["", "Glucose", "", "200"],
                    &["E2", "", "", ""],
                    &["", "GALD", "", "30"],
                    &["E3", "", "", ""],
                    &["", "", "3.01", "10"],
                    &["", "", "5.08", "40"],
                    &["", "", "8.00", "5"],
                ],
            ),
        ])
    }

    fn analyzer() -> Analyzer {
        Analyzer::new(&Config::default()).unwrap()
    }

    #[test]
    fn test_full_pipeline() {
        let analysis = analyzer().analyze(&sample_workbook()).unwrap();

        assert_eq!(analysis.calibration.c4_response_factor, 10.0);
        assert_eq!(analysis.calibration.gald_response_factor, 10.0);
        assert_eq!(analysis.standard_sheet, "汇总");
        assert_eq!(analysis.results.len(), 3);

        let order: Vec<_> = analysis.results.iter().map(|r| r.enzyme.as_str()).collect();
        assert_eq!(order, vec!["E3", "E1", "E2"]);

        let e3 = &analysis.results[0];
        assert_eq!(e3.products.len(), 2);
        assert_eq!(e3.products[0].name, "赤藓糖");
        assert!(e3.products[0].is_predicted);
        assert_eq!(e3.products[1].name, "unmatched");
        assert_eq!(e3.substrate_peak_area, 10.0);

        let diags = analysis.rt_diagnostics.as_ref().unwrap();
        assert_eq!(diags.len(), 3);
        let erythrose = diags.iter().find(|d| d.compound_name == "赤藓糖").unwrap();
        assert!(erythrose.within_tolerance);
        let threose = diags.iter().find(|d| d.compound_name == "苏阿糖").unwrap();
        assert!(!threose.within_tolerance);
    }

    #[test]
    fn test_analyze_missing_file_is_workbook_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = analyzer().analyze_file(&dir.path().join("missing.xlsx"));
        assert!(matches!(
            result,
            Err(YieldError::Workbook(WorkbookError::Open { .. }))
        ));
    }

    #[test]
    fn test_idempotent() {
        let a = analyzer();
        let wb = sample_workbook();
        let first = a.analyze(&wb).unwrap();
        let second = a.analyze(&wb).unwrap();
        assert_eq!(first.results, second.results);
        assert_eq!(first.calibration, second.calibration);
    }

    #[test]
    fn test_missing_gald_standard_stops_run() {
        let wb = Workbook::from_sheets(vec![
            sheet(
                "汇总",
                &["4C标品名称", "峰面积", "浓度（mg/ml）"],
                &[&["赤藓糖", "100", "10"]],
            ),
            sheet(
                "反应数据",
                &["酶名称", "对应物质", "峰面积"],
                &[&["E1", "GALD", "5"]],
            ),
        ]);
        assert!(matches!(
            analyzer().analyze(&wb),
            Err(YieldError::Calibration(CalibrationError::CalibrationDataMissing(_)))
        ));
    }

    #[test]
    fn test_no_rt_column_means_no_diagnostics() {
        let wb = Workbook::from_sheets(vec![
            sheet(
                "Standards",
                &["Compound", "Peak Area", "Conc (mg/mL)"],
                &[&["Erythrose", "100", "10"], &["GALD", "50", "5"]],
            ),
            sheet(
                "Reactions",
                &["Enzyme", "Compound", "Peak Area"],
                &[&["TK-1", "GALD", "10"], &["", "Erythrose", "10"]],
            ),
        ]);
        let analysis = analyzer().analyze(&wb).unwrap();
        assert!(analysis.rt_diagnostics.is_none());
        assert_eq!(analysis.results[0].enzyme, "TK-1");
        assert!(analysis.source.is_none());
    }
}
