//! Retention-time matching of unlabelled reaction peaks.
//!
//! A reaction peak is assigned to the standard compound with the closest
//! reference retention time, provided the deviation is within tolerance.
//! Equal deviations resolve to the reference inserted first. This is a
//! nearest-neighbour heuristic, not a chemical identification.

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::types::{RtDiagnostic, RtReferenceEntry, StandardRow};

/// Slack so a deviation printed as exactly the tolerance still matches.
const TOLERANCE_EPSILON: f64 = 1e-9;

/// Ordered compound -> reference retention time table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RtReference {
    entries: Vec<RtReferenceEntry>,
}

impl RtReference {
    /// Collect reference times from standards that carry one.
    pub fn from_standards(rows: &[StandardRow]) -> Self {
        let mut reference = Self::default();
        for row in rows {
            if let Some(rt) = row.retention_time {
                reference.insert(&row.compound_name, rt);
            }
        }
        reference
    }

    /// Insert or update a compound. A repeated compound takes the newer time
    /// but keeps its original position. Returns the replaced time.
    pub fn insert(&mut self, compound: &str, retention_time: f64) -> Option<f64> {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.compound_name == compound)
        {
            let previous = entry.standard_retention_time;
            entry.standard_retention_time = retention_time;
            warn!(
                compound = %compound,
                previous,
                current = retention_time,
                "Duplicate reference retention time; keeping the last one"
            );
            return Some(previous);
        }

        self.entries.push(RtReferenceEntry {
            compound_name: compound.to_string(),
            standard_retention_time: retention_time,
        });
        None
    }

    pub fn entries(&self) -> &[RtReferenceEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Outcome of matching one retention time.
#[derive(Debug, Clone, PartialEq)]
pub enum RtMatch {
    Matched {
        compound: String,
        deviation: f64,
    },
    Unmatched {
        /// Deviation to the closest reference, if any reference exists
        nearest_deviation: Option<f64>,
    },
}

/// Nearest-retention-time matcher.
#[derive(Debug, Clone)]
pub struct RtMatcher {
    reference: RtReference,
    tolerance: f64,
}

impl RtMatcher {
    pub fn new(reference: RtReference, tolerance: f64) -> Self {
        Self {
            reference,
            tolerance,
        }
    }

    pub fn reference(&self) -> &RtReference {
        &self.reference
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    fn within(&self, deviation: f64) -> bool {
        deviation.abs() <= self.tolerance + TOLERANCE_EPSILON
    }

    /// Resolve a reaction retention time to a reference compound.
    pub fn match_rt(&self, retention_time: f64) -> RtMatch {
        let mut best: Option<(&RtReferenceEntry, f64)> = None;

        for entry in self.reference.entries() {
            let deviation = retention_time - entry.standard_retention_time;
            // Strict comparison: on ties the earlier entry stays
            if best.is_none_or(|(_, d)| deviation.abs() < d.abs()) {
                best = Some((entry, deviation));
            }
        }

        match best {
            Some((entry, deviation)) if self.within(deviation) => {
                trace!(
                    rt = retention_time,
                    compound = %entry.compound_name,
                    deviation,
                    "RT matched"
                );
                RtMatch::Matched {
                    compound: entry.compound_name.clone(),
                    deviation,
                }
            }
            Some((_, deviation)) => RtMatch::Unmatched {
                nearest_deviation: Some(deviation),
            },
            None => RtMatch::Unmatched {
                nearest_deviation: None,
            },
        }
    }

    /// For every reference compound, the closest reaction retention time
    /// and whether it falls within tolerance. Display only.
    pub fn diagnostics(&self, reaction_rts: &[f64]) -> Vec<RtDiagnostic> {
        self.reference
            .entries()
            .iter()
            .map(|entry| {
                let best = reaction_rts.iter().copied().fold(None, |best: Option<f64>, rt| {
                    let closer = best.is_none_or(|b| {
                        (rt - entry.standard_retention_time).abs()
                            < (b - entry.standard_retention_time).abs()
                    });
                    if closer {
                        Some(rt)
                    } else {
                        best
                    }
                });
                let deviation = best.map(|rt| rt - entry.standard_retention_time);

                RtDiagnostic {
                    compound_name: entry.compound_name.clone(),
                    standard_retention_time: entry.standard_retention_time,
                    best_retention_time: best,
                    deviation,
                    within_tolerance: deviation.is_some_and(|d| self.within(d)),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(items: &[(&str, f64)]) -> RtReference {
        let mut r = RtReference::default();
        for (name, rt) in items {
            r.insert(name, *rt);
        }
        r
    }

    #[test]
    fn test_tolerance_boundary() {
        let m = RtMatcher::new(reference(&[("赤藓糖", 5.00)]), 0.15);

        match m.match_rt(5.10) {
            RtMatch::Matched {
                compound,
                deviation,
            } => {
                assert_eq!(compound, "赤藓糖");
                assert!((deviation - 0.10).abs() < 1e-9);
            }
            other => panic!("expected match, got {:?}", other),
        }

        assert!(matches!(m.match_rt(5.20), RtMatch::Unmatched { .. }));
        assert!(matches!(m.match_rt(4.85), RtMatch::Matched { .. }));
    }

    #[test]
    fn test_nearest_wins() {
        let m = RtMatcher::new(reference(&[("A", 5.0), ("B", 5.2)]), 0.15);
        match m.match_rt(5.12) {
            RtMatch::Matched { compound, .. } => assert_eq!(compound, "B"),
            other => panic!("expected match, got {:?}", other),
        }
    }

    #[test]
    fn test_tie_goes_to_first_inserted() {
        let m = RtMatcher::new(reference(&[("B", 6.0), ("A", 5.0)]), 0.6);
        match m.match_rt(5.5) {
            RtMatch::Matched { compound, .. } => assert_eq!(compound, "B"),
            other => panic!("expected match, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_reference() {
        let m = RtMatcher::new(RtReference::default(), 0.15);
        assert_eq!(
            m.match_rt(5.0),
            RtMatch::Unmatched {
                nearest_deviation: None
            }
        );
    }

    #[test]
    fn test_duplicate_keeps_position_takes_last_time() {
        let mut r = reference(&[("A", 5.0), ("B", 7.0)]);
        assert_eq!(r.insert("A", 5.5), Some(5.0));
        assert_eq!(r.len(), 2);
        assert_eq!(r.entries()[0].compound_name, "A");
        assert_eq!(r.entries()[0].standard_retention_time, 5.5);
    }

    #[test]
    fn test_from_standards_skips_missing_rt() {
        let rows = vec![
            StandardRow {
                compound_name: "A".into(),
                peak_area: 1.0,
                concentration: 1.0,
                retention_time: Some(4.2),
            },
            StandardRow {
                compound_name: "GALD".into(),
                peak_area: 1.0,
                concentration: 1.0,
                retention_time: None,
            },
        ];
        let r = RtReference::from_standards(&rows);
        assert_eq!(r.len(), 1);
        assert_eq!(r.entries()[0].compound_name, "A");
    }

    #[test]
    fn test_diagnostics() {
        let m = RtMatcher::new(reference(&[("A", 5.0), ("B", 9.0)]), 0.15);
        let diags = m.diagnostics(&[5.3, 5.1, 7.0]);

        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].best_retention_time, Some(5.1));
        assert!(diags[0].within_tolerance);
        assert!((diags[0].deviation.unwrap() - 0.1).abs() < 1e-9);

        assert_eq!(diags[1].best_retention_time, Some(7.0));
        assert!(!diags[1].within_tolerance);
        assert!((diags[1].deviation.unwrap() + 2.0).abs() < 1e-9);

        let none = m.diagnostics(&[]);
        assert_eq!(none[0].best_retention_time, None);
        assert!(!none[0].within_tolerance);
    }
}
