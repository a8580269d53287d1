//! Carbon-yield computation.
//!
//! Peak areas become concentrations through the response factors, then
//! carbon masses through each compound's carbon fraction. The yield is the
//! share of total carbon found in products.

use tracing::debug;

use crate::compounds::CompoundTable;
use crate::types::{round_to, CalibrationParams, EnzymeReaction, ProductCarbon, YieldResult};

/// Carbon fraction of glycolaldehyde (C2H4O2, 60.05 g/mol).
pub const GALD_CARBON_FRACTION: f64 = 2.0 * 12.0 / 60.05;

const PCT_PLACES: i32 = 2;
const MASS_PLACES: i32 = 4;

/// Percentage of total carbon held by products. Zero when there is no
/// carbon at all.
pub fn carbon_yield_pct(product_carbon: f64, substrate_carbon: f64) -> f64 {
    let total = product_carbon + substrate_carbon;
    if total > 0.0 {
        product_carbon / total * 100.0
    } else {
        0.0
    }
}

/// Per-enzyme yield calculator.
pub struct YieldCalculator<'a> {
    compounds: &'a CompoundTable,
    calibration: CalibrationParams,
}

impl<'a> YieldCalculator<'a> {
    pub fn new(compounds: &'a CompoundTable, calibration: CalibrationParams) -> Self {
        Self {
            compounds,
            calibration,
        }
    }

    /// Yield for one enzyme. Accumulation is done at full precision; only
    /// the stored values are rounded.
    pub fn compute(&self, reaction: &EnzymeReaction) -> YieldResult {
        let substrate_concentration =
            reaction.substrate_residual_peak / self.calibration.gald_response_factor;
        let substrate_carbon = substrate_concentration * GALD_CARBON_FRACTION;

        let mut total_product_carbon = 0.0;
        let mut products = Vec::with_capacity(reaction.products.len());

        for peak in &reaction.products {
            let fraction = self.compounds.carbon_fraction(&peak.compound_name);
            let concentration = peak.peak_area / self.calibration.c4_response_factor;
            let carbon = concentration * fraction;
            total_product_carbon += carbon;

            products.push(ProductCarbon {
                name: peak.compound_name.clone(),
                peak_area: peak.peak_area,
                concentration: round_to(concentration, MASS_PLACES),
                carbon_mass: round_to(carbon, MASS_PLACES),
                is_predicted: peak.is_predicted,
                rt_deviation: peak.rt_deviation,
            });
        }

        let yield_pct = round_to(
            carbon_yield_pct(total_product_carbon, substrate_carbon),
            PCT_PLACES,
        );

        debug!(
            enzyme = %reaction.enzyme_name,
            product_carbon = total_product_carbon,
            substrate_carbon,
            yield_pct,
            "Yield computed"
        );

        YieldResult {
            enzyme: reaction.enzyme_name.clone(),
            yield_pct,
            conversion_pct: round_to(100.0 - yield_pct, PCT_PLACES),
            product_carbon_mass: round_to(total_product_carbon, MASS_PLACES),
            substrate_carbon_mass: round_to(substrate_carbon, MASS_PLACES),
            substrate_peak_area: reaction.substrate_residual_peak,
            substrate_concentration: round_to(substrate_concentration, MASS_PLACES),
            products,
        }
    }

    /// Yields for all enzymes, highest first. Equal yields keep input order.
    pub fn compute_all(&self, reactions: &[EnzymeReaction]) -> Vec<YieldResult> {
        let mut results: Vec<YieldResult> = reactions.iter().map(|r| self.compute(r)).collect();
        results.sort_by(|a, b| b.yield_pct.total_cmp(&a.yield_pct));
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReactionPeak;
    use approx::assert_relative_eq;

    fn calibration() -> CalibrationParams {
        CalibrationParams {
            c4_response_factor: 10.0,
            gald_response_factor: 10.0,
        }
    }

    fn reaction(name: &str, gald: f64, products: &[(&str, f64)]) -> EnzymeReaction {
        EnzymeReaction {
            enzyme_name: name.to_string(),
            substrate_residual_peak: gald,
            products: products
                .iter()
                .map(|(c, a)| ReactionPeak {
                    enzyme: name.to_string(),
                    compound_name: c.to_string(),
                    peak_area: *a,
                    is_predicted: false,
                    rt_deviation: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_zero_guard() {
        assert_eq!(carbon_yield_pct(0.0, 0.0), 0.0);

        let table = CompoundTable::builtin().unwrap();
        let calc = YieldCalculator::new(&table, calibration());
        let r = calc.compute(&reaction("E0", 0.0, &[]));
        assert_eq!(r.yield_pct, 0.0);
        assert_eq!(r.conversion_pct, 100.0);
        assert!(!r.yield_pct.is_nan());
    }

    #[test]
    fn test_grouped_example() {
        let table = CompoundTable::builtin().unwrap();
        let calc = YieldCalculator::new(&table, calibration());
        let results = calc.compute_all(&[
            reaction("E1", 50.0, &[("Glucose", 200.0)]),
            reaction("E2", 30.0, &[]),
        ]);

        let substrate = 5.0 * GALD_CARBON_FRACTION;
        let product = 20.0 * 72.0 / 180.16;
        let expected = round_to(product / (product + substrate) * 100.0, 2);

        assert_eq!(results[0].enzyme, "E1");
        assert_eq!(results[0].yield_pct, expected);
        assert_relative_eq!(results[0].product_carbon_mass, product, epsilon = 1e-4);
        assert_relative_eq!(results[0].substrate_carbon_mass, substrate, epsilon = 1e-4);
        assert_eq!(results[0].products[0].concentration, 20.0);

        assert_eq!(results[1].enzyme, "E2");
        assert_eq!(results[1].yield_pct, 0.0);
        assert_eq!(results[1].product_carbon_mass, 0.0);
    }

    #[test]
    fn test_yield_and_conversion_sum_to_100() {
        let table = CompoundTable::builtin().unwrap();
        let calc = YieldCalculator::new(&table, calibration());

        for (gald, area) in [(1.0, 2.0), (7.0, 3.0), (50.0, 123.456), (0.0, 9.0), (33.3, 0.01)] {
            let r = calc.compute(&reaction("E", gald, &[("赤藓糖", area)]));
            assert_relative_eq!(r.yield_pct + r.conversion_pct, 100.0, epsilon = 1e-9);
            assert!((0.0..=100.0).contains(&r.yield_pct));
        }
    }

    #[test]
    fn test_unknown_product_uses_c4_fraction() {
        let table = CompoundTable::builtin().unwrap();
        let calc = YieldCalculator::new(&table, calibration());
        let r = calc.compute(&reaction("E", 0.0, &[("unmatched", 120.10)]));
        // 12.01 mg/mL * 48/120.10 = 4.8
        assert_relative_eq!(r.products[0].carbon_mass, 4.8, epsilon = 1e-9);
        assert_eq!(r.yield_pct, 100.0);
    }

    #[test]
    fn test_ties_keep_encounter_order() {
        let table = CompoundTable::builtin().unwrap();
        let calc = YieldCalculator::new(&table, calibration());
        let results = calc.compute_all(&[
            reaction("B", 10.0, &[("赤藓糖", 10.0)]),
            reaction("A", 10.0, &[("赤藓糖", 10.0)]),
            reaction("C", 0.0, &[("赤藓糖", 10.0)]),
        ]);
        let order: Vec<_> = results.iter().map(|r| r.enzyme.as_str()).collect();
        assert_eq!(order, vec!["C", "B", "A"]);
    }
}
