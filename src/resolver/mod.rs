//! Sheet and column resolution.
//!
//! Input workbooks are prepared by hand and labelled inconsistently between
//! batches. All header fuzziness lives here: sheets are picked from an
//! ordered alias list and headers are classified into canonical roles by an
//! ordered keyword table. Later stages only see the resulting `ColumnMap`.

use regex::Regex;
use tracing::{debug, trace};

use crate::config::{ColumnConfig, SheetConfig};
use crate::error::ResolveError;
use crate::types::{ColumnMap, ColumnRole, SheetKind};
use crate::workbook::{Sheet, Workbook};

/// A located sheet together with its role mapping.
#[derive(Debug, Clone)]
pub struct ResolvedSheet<'a> {
    pub kind: SheetKind,
    pub sheet: &'a Sheet,
    pub columns: ColumnMap,
}

impl ResolvedSheet<'_> {
    /// Column index for a role that must be present.
    pub fn column(&self, role: ColumnRole) -> Result<usize, ResolveError> {
        self.columns
            .index(role)
            .ok_or_else(|| self.missing(role.as_str()))
    }

    fn missing(&self, role: &str) -> ResolveError {
        ResolveError::MissingColumn {
            sheet: self.kind,
            sheet_name: self.sheet.name.clone(),
            role: role.to_string(),
        }
    }

    /// Fail unless every role in `roles` is mapped.
    pub fn require(&self, roles: &[ColumnRole]) -> Result<(), ResolveError> {
        roles.iter().try_for_each(|&r| self.column(r).map(|_| ()))
    }
}

/// Both logical sheets of a workbook.
#[derive(Debug, Clone)]
pub struct ResolvedWorkbook<'a> {
    pub standard: ResolvedSheet<'a>,
    pub reaction: ResolvedSheet<'a>,
}

/// Resolver for sheets and column roles.
pub struct Resolver {
    // Pre-compiled keyword patterns, in role priority order
    roles: Vec<(ColumnRole, Vec<Regex>)>,
    standard_aliases: Vec<String>,
    reaction_aliases: Vec<String>,
}

impl Resolver {
    pub fn new(sheets: &SheetConfig, columns: &ColumnConfig) -> Result<Self, ResolveError> {
        let roles = ColumnRole::ALL
            .iter()
            .map(|&role| {
                let patterns = columns
                    .keywords(role)
                    .iter()
                    .map(|k| keyword_pattern(k))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((role, patterns))
            })
            .collect::<Result<Vec<_>, ResolveError>>()?;

        Ok(Self {
            roles,
            standard_aliases: sheets.standard.clone(),
            reaction_aliases: sheets.reaction.clone(),
        })
    }

    fn aliases(&self, kind: SheetKind) -> &[String] {
        match kind {
            SheetKind::Standard => &self.standard_aliases,
            SheetKind::Reaction => &self.reaction_aliases,
        }
    }

    /// Pick the first alias of `kind` present in the workbook.
    pub fn locate_sheet<'a>(
        &self,
        workbook: &'a Workbook,
        kind: SheetKind,
    ) -> Result<&'a Sheet, ResolveError> {
        let aliases = self.aliases(kind);

        for alias in aliases {
            let alias = alias.trim();
            let found = workbook
                .sheet(alias)
                .or_else(|| {
                    workbook
                        .sheet_names()
                        .into_iter()
                        .find(|n| n.trim() == alias)
                        .and_then(|n| workbook.sheet(n))
                });
            if let Some(sheet) = found {
                debug!(kind = %kind, sheet = %sheet.name, "Sheet located");
                return Ok(sheet);
            }
        }

        Err(ResolveError::MissingSheet {
            sheet: kind,
            tried: aliases.to_vec(),
        })
    }

    /// Classify one header. First matching role wins.
    pub fn classify_header(&self, header: &str) -> Option<ColumnRole> {
        let header = header.trim();
        if header.is_empty() {
            return None;
        }
        self.roles
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|p| p.is_match(header)))
            .map(|(role, _)| *role)
    }

    /// Build the role map for a sheet. When two headers share a role the
    /// leftmost one is kept.
    pub fn map_columns(&self, sheet: &Sheet) -> ColumnMap {
        let mut map = ColumnMap::default();

        for (index, header) in sheet.headers.iter().enumerate() {
            match self.classify_header(header) {
                Some(role) => {
                    if map.insert_first(role, header, index) {
                        debug!(sheet = %sheet.name, header = %header, role = %role, "Column mapped");
                    } else {
                        debug!(sheet = %sheet.name, header = %header, role = %role, "Duplicate role ignored");
                    }
                }
                None => trace!(sheet = %sheet.name, header = %header, "Column unclassified"),
            }
        }

        map
    }

    /// Locate and map a sheet without checking required roles.
    pub fn resolve_sheet<'a>(
        &self,
        workbook: &'a Workbook,
        kind: SheetKind,
    ) -> Result<ResolvedSheet<'a>, ResolveError> {
        let sheet = self.locate_sheet(workbook, kind)?;
        Ok(ResolvedSheet {
            kind,
            sheet,
            columns: self.map_columns(sheet),
        })
    }

    /// Locate both sheets and check the roles the pipeline needs.
    pub fn resolve<'a>(&self, workbook: &'a Workbook) -> Result<ResolvedWorkbook<'a>, ResolveError> {
        let standard = self.resolve_sheet(workbook, SheetKind::Standard)?;
        standard.require(&[
            ColumnRole::Compound,
            ColumnRole::Area,
            ColumnRole::Concentration,
        ])?;

        let reaction = self.resolve_sheet(workbook, SheetKind::Reaction)?;
        reaction.require(&[ColumnRole::Enzyme, ColumnRole::Area])?;
        if !reaction.columns.contains(ColumnRole::Compound)
            && !reaction.columns.contains(ColumnRole::RetentionTime)
        {
            return Err(reaction.missing("compound or retention_time"));
        }

        Ok(ResolvedWorkbook { standard, reaction })
    }
}

/// Case-insensitive substring pattern. Very short ASCII keywords such as
/// "rt" must stand alone as a token.
fn keyword_pattern(keyword: &str) -> Result<Regex, regex::Error> {
    let keyword = keyword.trim();
    let escaped = regex::escape(keyword);
    let short_token = keyword.len() <= 2 && keyword.chars().all(|c| c.is_ascii_alphanumeric());

    if short_token {
        Regex::new(&format!(r"(?i)(?:^|[^a-z0-9]){}(?:$|[^a-z0-9])", escaped))
    } else {
        Regex::new(&format!(r"(?i){}", escaped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::Cell;

    fn make_resolver() -> Resolver {
        Resolver::new(&SheetConfig::default(), &ColumnConfig::default()).unwrap()
    }

    fn sheet(name: &str, headers: &[&str]) -> Sheet {
        Sheet::new(
            name,
            headers.iter().map(|h| h.to_string()).collect(),
            Vec::<Vec<Cell>>::new(),
        )
    }

    #[test]
    fn test_header_variants() {
        let r = make_resolver();

        let cases = [
            ("酶名称", Some(ColumnRole::Enzyme)),
            ("Enzyme", Some(ColumnRole::Enzyme)),
            ("峰面积", Some(ColumnRole::Area)),
            ("Peak Area", Some(ColumnRole::Area)),
            ("浓度（mg/ml）", Some(ColumnRole::Concentration)),
            ("Conc. (mg/mL)", Some(ColumnRole::Concentration)),
            ("保留时间", Some(ColumnRole::RetentionTime)),
            ("RT (min)", Some(ColumnRole::RetentionTime)),
            ("Retention Time", Some(ColumnRole::RetentionTime)),
            ("4C标品名称", Some(ColumnRole::Compound)),
            ("对应物质", Some(ColumnRole::Compound)),
            ("Compound", Some(ColumnRole::Compound)),
            ("Substrate", None),
            ("备注", None),
            ("", None),
        ];

        for (header, expected) in cases {
            assert_eq!(r.classify_header(header), expected, "Failed for: {}", header);
        }
    }

    #[test]
    fn test_leftmost_header_wins_role() {
        let r = make_resolver();
        let s = sheet("汇总", &["4C标品名称", "峰面积", "峰面积2", "浓度（mg/ml）"]);
        let map = r.map_columns(&s);
        assert_eq!(map.index(ColumnRole::Area), Some(1));
        assert_eq!(map.index(ColumnRole::Compound), Some(0));
        assert_eq!(map.index(ColumnRole::Concentration), Some(3));
    }

    #[test]
    fn test_locate_sheet_alias_order() {
        let r = make_resolver();
        let wb = Workbook::from_sheets(vec![
            sheet("Standards", &["Compound"]),
            sheet("汇总", &["4C标品名称"]),
            sheet("Reactions ", &["Enzyme"]),
        ]);

        assert_eq!(r.locate_sheet(&wb, SheetKind::Standard).unwrap().name, "汇总");
        assert_eq!(
            r.locate_sheet(&wb, SheetKind::Reaction).unwrap().name,
            "Reactions "
        );
    }

    #[test]
    fn test_missing_sheet() {
        let r = make_resolver();
        let wb = Workbook::from_sheets(vec![sheet("汇总", &["4C标品名称"])]);
        match r.locate_sheet(&wb, SheetKind::Reaction) {
            Err(ResolveError::MissingSheet { sheet, tried }) => {
                assert_eq!(sheet, SheetKind::Reaction);
                assert!(tried.contains(&"反应数据".to_string()));
            }
            other => panic!("expected MissingSheet, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_required_column() {
        let r = make_resolver();
        let wb = Workbook::from_sheets(vec![
            sheet("汇总", &["4C标品名称", "峰面积"]),
            sheet("反应数据", &["酶名称", "峰面积", "对应物质"]),
        ]);
        match r.resolve(&wb) {
            Err(ResolveError::MissingColumn { sheet, role, .. }) => {
                assert_eq!(sheet, SheetKind::Standard);
                assert_eq!(role, "concentration");
            }
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_reaction_needs_compound_or_rt() {
        let r = make_resolver();
        let wb = Workbook::from_sheets(vec![
            sheet("汇总", &["4C标品名称", "峰面积", "浓度"]),
            sheet("反应数据", &["酶名称", "峰面积"]),
        ]);
        match r.resolve(&wb) {
            Err(ResolveError::MissingColumn { sheet, role, .. }) => {
                assert_eq!(sheet, SheetKind::Reaction);
                assert_eq!(role, "compound or retention_time");
            }
            other => panic!("expected MissingColumn, got {:?}", other),
        }

        let wb = Workbook::from_sheets(vec![
            sheet("汇总", &["4C标品名称", "峰面积", "浓度"]),
            sheet("反应数据", &["酶名称", "峰面积", "保留时间"]),
        ]);
        let resolved = r.resolve(&wb).unwrap();
        assert!(resolved.reaction.columns.contains(ColumnRole::RetentionTime));
        assert!(!resolved.reaction.columns.contains(ColumnRole::Compound));
    }
}
