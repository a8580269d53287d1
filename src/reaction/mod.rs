//! Reaction-sheet parsing.
//!
//! Enzyme labels appear only on the first row of each block; following rows
//! belong to the most recent label. The "current enzyme" is carried through
//! an explicit fold accumulator.

use tracing::{debug, info, trace, warn};

use crate::error::{AnalysisResult, ReactionError};
use crate::matcher::{RtMatch, RtMatcher};
use crate::resolver::ResolvedSheet;
use crate::types::{ColumnRole, EnzymeReaction, ReactionPeak, UNMATCHED};
use crate::workbook::Sheet;

/// Output of parsing the reaction sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReactions {
    /// One record per distinct enzyme, in first-encounter order
    pub reactions: Vec<EnzymeReaction>,
    /// Retention times seen on contributing rows, for diagnostics
    pub observed_rts: Vec<f64>,
}

/// Fold accumulator.
#[derive(Default)]
struct ParseState {
    current: Option<usize>,
    reactions: Vec<EnzymeReaction>,
    observed_rts: Vec<f64>,
}

impl ParseState {
    /// Start (or restart) the block for `enzyme` and make it current.
    fn begin(mut self, enzyme: String, row: usize) -> Self {
        match self.reactions.iter().position(|r| r.enzyme_name == enzyme) {
            Some(idx) => {
                warn!(enzyme = %enzyme, row, "Enzyme label repeated; restarting its block");
                self.reactions[idx] = EnzymeReaction::new(enzyme);
                self.current = Some(idx);
            }
            None => {
                trace!(enzyme = %enzyme, row, "Enzyme block started");
                self.reactions.push(EnzymeReaction::new(enzyme));
                self.current = Some(self.reactions.len() - 1);
            }
        }
        self
    }
}

/// Column positions used while folding.
struct Columns {
    enzyme: usize,
    area: usize,
    compound: Option<usize>,
    retention_time: Option<usize>,
}

/// How a row's compound was identified.
struct Identity {
    compound: String,
    is_predicted: bool,
    rt_deviation: Option<f64>,
}

/// Reaction-sheet parser.
pub struct ReactionParser<'a> {
    matcher: &'a RtMatcher,
    substrate: &'a str,
}

impl<'a> ReactionParser<'a> {
    pub fn new(matcher: &'a RtMatcher, substrate: &'a str) -> Self {
        Self { matcher, substrate }
    }

    /// Group reaction rows into enzyme records.
    pub fn parse(&self, reaction: &ResolvedSheet<'_>) -> AnalysisResult<ParsedReactions> {
        let sheet = reaction.sheet;
        let columns = Columns {
            enzyme: reaction.column(ColumnRole::Enzyme)?,
            area: reaction.column(ColumnRole::Area)?,
            compound: reaction.columns.index(ColumnRole::Compound),
            retention_time: reaction.columns.index(ColumnRole::RetentionTime),
        };

        if columns.retention_time.is_some() && self.matcher.reference().is_empty() {
            warn!("Reaction sheet has retention times but no standard carries one");
        }

        let state = (0..sheet.rows.len()).try_fold(ParseState::default(), |state, i| {
            self.step(state, sheet, &columns, i)
        })?;

        if state.reactions.is_empty() {
            return Err(ReactionError::NoReactionsFound(sheet.name.clone()).into());
        }

        info!(
            enzymes = state.reactions.len(),
            peaks = state
                .reactions
                .iter()
                .map(|r| r.products.len())
                .sum::<usize>(),
            "Reaction sheet parsed"
        );

        Ok(ParsedReactions {
            reactions: state.reactions,
            observed_rts: state.observed_rts,
        })
    }

    fn step(
        &self,
        state: ParseState,
        sheet: &Sheet,
        columns: &Columns,
        i: usize,
    ) -> AnalysisResult<ParseState> {
        let row = sheet.spreadsheet_row(i);

        let mut state = match sheet.text(i, columns.enzyme) {
            Some(enzyme) => state.begin(enzyme, row),
            None => state,
        };

        let Some(current) = state.current else {
            trace!(row, "Row before any enzyme label skipped");
            return Ok(state);
        };

        let Some(identity) = self.identify(sheet, columns, i, &mut state.observed_rts)? else {
            trace!(row, "Row without compound identity skipped");
            return Ok(state);
        };

        let peak_area = sheet.required_number(i, columns.area, ColumnRole::Area)?;
        let record = &mut state.reactions[current];

        if identity.compound == self.substrate {
            record.substrate_residual_peak = peak_area;
            debug!(enzyme = %record.enzyme_name, peak_area, "Substrate residual recorded");
        } else {
            debug!(
                enzyme = %record.enzyme_name,
                compound = %identity.compound,
                peak_area,
                predicted = identity.is_predicted,
                "Product peak recorded"
            );
            record.products.push(ReactionPeak {
                enzyme: record.enzyme_name.clone(),
                compound_name: identity.compound,
                peak_area,
                is_predicted: identity.is_predicted,
                rt_deviation: identity.rt_deviation,
            });
        }

        Ok(state)
    }

    /// Explicit label first, then retention-time matching.
    fn identify(
        &self,
        sheet: &Sheet,
        columns: &Columns,
        i: usize,
        observed_rts: &mut Vec<f64>,
    ) -> AnalysisResult<Option<Identity>> {
        let explicit = columns.compound.and_then(|col| sheet.text(i, col));

        if let Some(compound) = explicit {
            // Explicit rows still feed diagnostics when their RT parses
            if let Some(rt) = columns
                .retention_time
                .and_then(|col| sheet.number(i, col, ColumnRole::RetentionTime).ok().flatten())
            {
                observed_rts.push(rt);
            }
            return Ok(Some(Identity {
                compound,
                is_predicted: false,
                rt_deviation: None,
            }));
        }

        let Some(rt_col) = columns.retention_time else {
            return Ok(None);
        };
        let Some(rt) = sheet.number(i, rt_col, ColumnRole::RetentionTime)? else {
            return Ok(None);
        };
        observed_rts.push(rt);

        let identity = match self.matcher.match_rt(rt) {
            RtMatch::Matched {
                compound,
                deviation,
            } => Identity {
                compound,
                is_predicted: true,
                rt_deviation: Some(deviation),
            },
            RtMatch::Unmatched { nearest_deviation } => {
                warn!(
                    row = sheet.spreadsheet_row(i),
                    rt,
                    nearest_deviation = ?nearest_deviation,
                    tolerance = self.matcher.tolerance(),
                    "No standard within RT tolerance"
                );
                Identity {
                    compound: UNMATCHED.to_string(),
                    is_predicted: true,
                    rt_deviation: nearest_deviation,
                }
            }
        };

        Ok(Some(identity))
    }
}
