//! Plain-text report on stdout.

use crate::pipeline::Analysis;

const BAR_WIDTH: f64 = 40.0;

/// Print the ranked summary, per-enzyme details, chart and calibration.
pub fn print_report(analysis: &Analysis) {
    let substrate = analysis.substrate.as_str();
    println!();
    println!("Carbon Yield Ranking");
    println!("====================");
    if let Some(ref source) = analysis.source {
        println!("File: {}", source.file_name);
    }
    println!(
        "Sheets: {} / {}",
        analysis.standard_sheet, analysis.reaction_sheet
    );
    println!();

    println!(
        "{:>4}  {:<24} {:>10} {:>12} {:>14} {:>14}",
        "Rank", "Enzyme", "Yield %", "Conversion %", "Product C", "Substrate C"
    );
    println!("{}", "-".repeat(84));
    for (i, r) in analysis.results.iter().enumerate() {
        println!(
            "{:>4}  {:<24} {:>10.2} {:>12.2} {:>14.4} {:>14.4}",
            i + 1,
            r.enzyme,
            r.yield_pct,
            r.conversion_pct,
            r.product_carbon_mass,
            r.substrate_carbon_mass
        );
    }

    println!();
    println!("Yield Chart");
    println!("-----------");
    for r in &analysis.results {
        let len = (r.yield_pct / 100.0 * BAR_WIDTH).round().max(0.0) as usize;
        println!("{:<24} {:<40} {:.2}%", r.enzyme, "#".repeat(len), r.yield_pct);
    }

    println!();
    println!("Details");
    println!("-------");
    let mut any_predicted = false;
    for r in &analysis.results {
        println!("{}", r.enzyme);
        println!(
            "  {:<20} peak {:>12.2}  conc {:>10.4}  carbon {:>10.4}  (substrate)",
            substrate, r.substrate_peak_area, r.substrate_concentration, r.substrate_carbon_mass
        );
        for p in &r.products {
            let flag = if p.is_predicted {
                any_predicted = true;
                match p.rt_deviation {
                    Some(d) => format!("  *RT {:+.3}", d),
                    None => "  *RT".to_string(),
                }
            } else {
                String::new()
            };
            println!(
                "  {:<20} peak {:>12.2}  conc {:>10.4}  carbon {:>10.4}{}",
                p.name, p.peak_area, p.concentration, p.carbon_mass, flag
            );
        }
        if r.products.is_empty() {
            println!("  (no products)");
        }
    }
    if any_predicted {
        println!();
        println!("* identified by retention time (tolerance {:.2})", analysis.rt_tolerance);
    }

    println!();
    println!("Calibration");
    println!("-----------");
    println!(
        "C4 response factor:   {:.2}  (carbon fraction {:.4}, {} selection)",
        analysis.calibration.c4_response_factor,
        analysis.c4_carbon_fraction,
        analysis.standard_selection
    );
    println!(
        "{} response factor: {:.2}  (carbon fraction {:.4})",
        substrate, analysis.calibration.gald_response_factor, analysis.gald_carbon_fraction
    );

    if let Some(ref diags) = analysis.rt_diagnostics {
        println!();
        println!("Retention Time Matching");
        println!("-----------------------");
        for d in diags {
            match (d.best_retention_time, d.deviation) {
                (Some(rt), Some(dev)) => println!(
                    "{:<20} std {:>7.3}  best {:>7.3}  dev {:>+7.3}  {}",
                    d.compound_name,
                    d.standard_retention_time,
                    rt,
                    dev,
                    if d.within_tolerance { "matched" } else { "unmatched" }
                ),
                _ => println!(
                    "{:<20} std {:>7.3}  (no reaction peaks)",
                    d.compound_name, d.standard_retention_time
                ),
            }
        }
    }

    println!();
}
