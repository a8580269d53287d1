//! Response-factor calibration from the standard sheet.
//!
//! Two factors are derived: the mean peak-area/concentration ratio over the
//! C4 standards, and the same ratio for the substrate (GALD) row.

use tracing::{debug, info, warn};

use crate::config::{AnalysisConfig, StandardSelection};
use crate::error::{AnalysisResult, CalibrationError, ValueError};
use crate::resolver::ResolvedSheet;
use crate::types::{CalibrationParams, ColumnRole, StandardRow};

/// Read calibration rows from the resolved standard sheet.
///
/// Rows without a compound label and rows labelled with an excluded
/// placeholder are skipped. Every other row must carry a numeric peak area
/// and a positive concentration.
pub fn read_standards(
    standard: &ResolvedSheet<'_>,
    config: &AnalysisConfig,
) -> AnalysisResult<Vec<StandardRow>> {
    let sheet = standard.sheet;
    let compound_col = standard.column(ColumnRole::Compound)?;
    let area_col = standard.column(ColumnRole::Area)?;
    let conc_col = standard.column(ColumnRole::Concentration)?;
    let rt_col = standard.columns.index(ColumnRole::RetentionTime);

    let mut rows = Vec::new();

    for i in 0..sheet.rows.len() {
        let Some(name) = sheet.text(i, compound_col) else {
            continue;
        };
        if config.excluded_labels.iter().any(|x| x.trim() == name) {
            debug!(row = sheet.spreadsheet_row(i), label = %name, "Excluded label skipped");
            continue;
        }

        let peak_area = sheet.required_number(i, area_col, ColumnRole::Area)?;
        let concentration = sheet.required_number(i, conc_col, ColumnRole::Concentration)?;
        if concentration <= 0.0 {
            return Err(ValueError::NonPositive {
                sheet: sheet.name.clone(),
                row: sheet.spreadsheet_row(i),
                role: ColumnRole::Concentration,
                value: concentration,
            }
            .into());
        }
        let retention_time = match rt_col {
            Some(col) => sheet.number(i, col, ColumnRole::RetentionTime)?,
            None => None,
        };

        rows.push(StandardRow {
            compound_name: name,
            peak_area,
            concentration,
            retention_time,
        });
    }

    debug!(sheet = %sheet.name, standards = rows.len(), "Standard rows read");
    Ok(rows)
}

/// Whether a standard row belongs to the C4 calibration subset.
///
/// Excluded placeholder rows never reach this point, so the permissive mode
/// takes every remaining row, the substrate row included.
fn is_c4_standard(row: &StandardRow, config: &AnalysisConfig) -> bool {
    match config.standard_selection {
        StandardSelection::Permissive => true,
        StandardSelection::Strict => config
            .c4_standards
            .iter()
            .any(|c| c.trim() == row.compound_name),
    }
}

/// Compute both response factors.
pub fn build_calibration(
    rows: &[StandardRow],
    config: &AnalysisConfig,
) -> Result<CalibrationParams, CalibrationError> {
    let c4_ratios: Vec<f64> = rows
        .iter()
        .filter(|r| is_c4_standard(r, config))
        .map(|r| r.peak_area / r.concentration)
        .collect();

    if c4_ratios.is_empty() {
        return Err(CalibrationError::CalibrationDataMissing("C4".to_string()));
    }

    let mut substrate_rows = rows.iter().filter(|r| r.compound_name == config.substrate);
    let substrate = substrate_rows
        .next()
        .ok_or_else(|| CalibrationError::CalibrationDataMissing(config.substrate.clone()))?;

    let extra = substrate_rows.count();
    if extra > 0 {
        warn!(
            substrate = %config.substrate,
            ignored = extra,
            "Multiple substrate standard rows; using the first"
        );
    }

    let params = CalibrationParams {
        c4_response_factor: mean(&c4_ratios),
        gald_response_factor: substrate.peak_area / substrate.concentration,
    };

    check_positive("C4", params.c4_response_factor)?;
    check_positive(&config.substrate, params.gald_response_factor)?;

    info!(
        c4_standards = c4_ratios.len(),
        c4_response = params.c4_response_factor,
        gald_response = params.gald_response_factor,
        selection = %config.standard_selection,
        "Calibration built"
    );

    Ok(params)
}

fn check_positive(name: &str, value: f64) -> Result<(), CalibrationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CalibrationError::NonPositiveResponse {
            name: name.to_string(),
            value,
        })
    }
}

/// Calculate mean of a slice.
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColumnConfig, SheetConfig};
    use crate::error::YieldError;
    use crate::resolver::Resolver;
    use crate::types::SheetKind;
    use crate::workbook::{Cell, Sheet, Workbook};

    fn std_row(name: &str, area: f64, conc: f64) -> StandardRow {
        StandardRow {
            compound_name: name.to_string(),
            peak_area: area,
            concentration: conc,
            retention_time: None,
        }
    }

    #[test]
    fn test_reference_calibration() {
        let rows = vec![
            std_row("C4", 100.0, 10.0),
            std_row("C4", 200.0, 20.0),
            std_row("GALD", 50.0, 5.0),
        ];
        let params = build_calibration(&rows, &AnalysisConfig::default()).unwrap();
        assert_eq!(params.c4_response_factor, 10.0);
        assert_eq!(params.gald_response_factor, 10.0);
    }

    #[test]
    fn test_permissive_c4_mean_includes_substrate_row() {
        let rows = vec![std_row("赤藓糖", 300.0, 10.0), std_row("GALD", 1000.0, 10.0)];
        let params = build_calibration(&rows, &AnalysisConfig::default()).unwrap();
        assert_eq!(params.c4_response_factor, 65.0);
        assert_eq!(params.gald_response_factor, 100.0);
    }

    #[test]
    fn test_permissive_substrate_only_standards() {
        let rows = vec![std_row("GALD", 50.0, 5.0)];
        let params = build_calibration(&rows, &AnalysisConfig::default()).unwrap();
        assert_eq!(params.c4_response_factor, 10.0);
        assert_eq!(params.gald_response_factor, 10.0);
    }

    #[test]
    fn test_strict_c4_mean_excludes_substrate_row() {
        let config = AnalysisConfig {
            standard_selection: StandardSelection::Strict,
            ..AnalysisConfig::default()
        };
        let rows = vec![std_row("赤藓糖", 300.0, 10.0), std_row("GALD", 1000.0, 10.0)];
        let params = build_calibration(&rows, &config).unwrap();
        assert_eq!(params.c4_response_factor, 30.0);
    }

    #[test]
    fn test_strict_selection() {
        let config = AnalysisConfig {
            standard_selection: StandardSelection::Strict,
            ..AnalysisConfig::default()
        };
        let rows = vec![
            std_row("Erythrose", 100.0, 10.0),
            std_row("Glucose", 900.0, 10.0),
            std_row("GALD", 50.0, 5.0),
        ];
        let params = build_calibration(&rows, &config).unwrap();
        assert_eq!(params.c4_response_factor, 10.0);

        let rows = vec![std_row("Glucose", 900.0, 10.0), std_row("GALD", 50.0, 5.0)];
        assert!(matches!(
            build_calibration(&rows, &config),
            Err(CalibrationError::CalibrationDataMissing(s)) if s == "C4"
        ));
    }

    #[test]
    fn test_missing_gald() {
        let rows = vec![std_row("赤藓糖", 100.0, 10.0)];
        assert!(matches!(
            build_calibration(&rows, &AnalysisConfig::default()),
            Err(CalibrationError::CalibrationDataMissing(s)) if s == "GALD"
        ));
    }

    #[test]
    fn test_zero_area_response_rejected() {
        let rows = vec![std_row("赤藓糖", 0.0, 10.0), std_row("GALD", 0.0, 5.0)];
        assert!(matches!(
            build_calibration(&rows, &AnalysisConfig::default()),
            Err(CalibrationError::NonPositiveResponse { .. })
        ));
    }

    fn standard_sheet(rows: &[&[&str]]) -> Workbook {
        let grid = rows
            .iter()
            .map(|r| r.iter().map(|s| Cell::guess(s)).collect())
            .collect();
        Workbook::from_sheets(vec![Sheet::new(
            "汇总",
            vec![
                "4C标品名称".into(),
                "峰面积".into(),
                "浓度（mg/ml）".into(),
                "保留时间".into(),
            ],
            grid,
        )])
    }

    #[test]
    fn test_read_standards_skips_blank_and_excluded() {
        let wb = standard_sheet(&[
            &["赤藓糖", "100", "10", "5.0"],
            &["", "", "", ""],
            &["6C标品名称", "峰面积", "浓度", ""],
            &["GALD", "50", "5", ""],
        ]);
        let resolver = Resolver::new(&SheetConfig::default(), &ColumnConfig::default()).unwrap();
        let resolved = resolver.resolve_sheet(&wb, SheetKind::Standard).unwrap();

        let rows = read_standards(&resolved, &AnalysisConfig::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].retention_time, Some(5.0));
        assert_eq!(rows[1].compound_name, "GALD");
        assert_eq!(rows[1].retention_time, None);
    }

    #[test]
    fn test_read_standards_zero_concentration() {
        let wb = standard_sheet(&[&["赤藓糖", "100", "0", ""]]);
        let resolver = Resolver::new(&SheetConfig::default(), &ColumnConfig::default()).unwrap();
        let resolved = resolver.resolve_sheet(&wb, SheetKind::Standard).unwrap();

        match read_standards(&resolved, &AnalysisConfig::default()) {
            Err(YieldError::Value(ValueError::NonPositive { row, role, .. })) => {
                assert_eq!(row, 2);
                assert_eq!(role, ColumnRole::Concentration);
            }
            other => panic!("expected NonPositive, got {:?}", other),
        }
    }

    #[test]
    fn test_read_standards_missing_area() {
        let wb = standard_sheet(&[&["赤藓糖", "", "10", ""]]);
        let resolver = Resolver::new(&SheetConfig::default(), &ColumnConfig::default()).unwrap();
        let resolved = resolver.resolve_sheet(&wb, SheetKind::Standard).unwrap();

        assert!(matches!(
            read_standards(&resolved, &AnalysisConfig::default()),
            Err(YieldError::Value(ValueError::MissingValue {
                role: ColumnRole::Area,
                ..
            }))
        ));
    }
}
