// src/extractors/spreadsheet.rs
//! Cross-reference spreadsheets.
//!
//! No schema is assumed. Each sheet is searched for a header row, its
//! columns are assigned roles by name, and every data row contributes one
//! control plus one mapping per cross-reference found in its cell.

use std::collections::HashMap;

use super::context::{truncate_chars, ExtractionContext};
use super::grammar;
use super::sources::{CalamineWorkbook, SheetRows, Workbook};
use crate::catalog::models::{ControlCandidate, ParseResult};
use crate::config::ExtractConfig;
use crate::utils::error::ExtractError;

const HEADER_KEYWORDS: [&str; 4] = ["ref", "title", "criteria", "description"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Reference,
    Title,
    Description,
    CrossReference,
}

fn is_reference_name(name: &str) -> bool {
    name.contains("ref") && !name.contains("iso")
}

fn is_title_name(name: &str) -> bool {
    name.contains("title")
}

fn is_description_name(name: &str) -> bool {
    ["criteria", "description", "basic"]
        .iter()
        .any(|kw| name.contains(kw))
}

fn is_cross_reference_name(name: &str) -> bool {
    name.contains("iso") || name.contains("27001")
}

/// Evaluated top to bottom against the lower-cased column name; the first
/// predicate that holds decides the column's role. `Reference` must stay
/// first: a second reference-like column becomes the cross-reference before
/// any "iso" column is considered.
const ROLE_RULES: [(fn(&str) -> bool, ColumnRole); 4] = [
    (is_reference_name, ColumnRole::Reference),
    (is_title_name, ColumnRole::Title),
    (is_description_name, ColumnRole::Description),
    (is_cross_reference_name, ColumnRole::CrossReference),
];

/// Column indices for each role of a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRoles {
    pub reference: usize,
    pub title: Option<usize>,
    pub description: Option<usize>,
    pub cross_reference: usize,
}

pub fn classify_column(name: &str) -> Option<ColumnRole> {
    let lower = name.to_lowercase();
    ROLE_RULES
        .iter()
        .find(|(matches, _)| matches(&lower))
        .map(|(_, role)| *role)
}

/// Assigns roles by column name, falling back to the positional layout
/// (reference, title, description, cross-reference) for sheets with at least
/// four columns. `None` means the sheet cannot be interpreted.
pub fn infer_column_roles(columns: &[String]) -> Option<ColumnRoles> {
    let mut reference = None;
    let mut title = None;
    let mut description = None;
    let mut cross_reference = None;
    let mut reference_like = 0;

    for (idx, name) in columns.iter().enumerate() {
        match classify_column(name) {
            Some(ColumnRole::Reference) => {
                if reference_like == 0 {
                    reference.get_or_insert(idx);
                } else {
                    cross_reference.get_or_insert(idx);
                }
                reference_like += 1;
            }
            Some(ColumnRole::Title) => {
                title.get_or_insert(idx);
            }
            Some(ColumnRole::Description) => {
                description.get_or_insert(idx);
            }
            Some(ColumnRole::CrossReference) => {
                cross_reference.get_or_insert(idx);
            }
            None => {}
        }
    }

    if let (Some(reference), Some(cross_reference)) = (reference, cross_reference) {
        return Some(ColumnRoles {
            reference,
            title,
            description,
            cross_reference,
        });
    }

    if columns.len() >= 4 {
        tracing::debug!("Falling back to positional columns for {:?}", columns);
        return Some(ColumnRoles {
            reference: 0,
            title: Some(1),
            description: Some(2),
            cross_reference: 3,
        });
    }

    None
}

/// Keyword hits across the row's non-empty cells. A cell can hit more than
/// one keyword.
pub fn header_score(row: &[String]) -> usize {
    row.iter()
        .filter(|cell| !cell.trim().is_empty())
        .map(|cell| {
            let lower = cell.trim().to_lowercase();
            HEADER_KEYWORDS.iter().filter(|kw| lower.contains(*kw)).count()
        })
        .sum()
}

/// Index of the best-scoring row among the first `max_rows`; ties go to the
/// earlier row.
pub fn find_header_row(rows: &[Vec<String>], max_rows: usize, min_score: usize) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (idx, row) in rows.iter().take(max_rows).enumerate() {
        let score = header_score(row);
        if score > best.map_or(0, |(_, s)| s) {
            best = Some((idx, score));
        }
    }
    best.filter(|(_, score)| *score >= min_score)
        .map(|(idx, _)| idx)
}

/// Header names with repeats suffixed `_1`, `_2`, ... and blank headers named
/// after their position.
pub fn dedup_columns(header: &[String]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .iter()
        .enumerate()
        .map(|(idx, raw)| {
            let name = match raw.trim() {
                "" => format!("column_{}", idx),
                trimmed => trimmed.to_string(),
            };
            match seen.get_mut(&name) {
                Some(count) => {
                    *count += 1;
                    format!("{}_{}", name, count)
                }
                None => {
                    seen.insert(name.clone(), 0);
                    name
                }
            }
        })
        .collect()
}

/// Sheets whose name contains one of the hints, or every sheet if none does.
pub fn select_sheets(names: &[String], hints: &[String]) -> Vec<String> {
    let preferred: Vec<String> = names
        .iter()
        .filter(|name| {
            let lower = name.to_lowercase();
            hints.iter().any(|hint| lower.contains(&hint.to_lowercase()))
        })
        .cloned()
        .collect();

    if preferred.is_empty() {
        names.to_vec()
    } else {
        preferred
    }
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|c| c.trim()).unwrap_or("")
}

fn category_for(reference: &str, doc_type: &str) -> String {
    let criteria = grammar::criteria_prefix(reference);
    if doc_type.contains("C5") || criteria.is_some() {
        criteria.unwrap_or("").to_string()
    } else {
        grammar::leading_letters(reference).to_string()
    }
}

/// Spreadsheet strategy.
pub struct TabularExtractor {
    config: ExtractConfig,
}

impl TabularExtractor {
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    pub fn extract(&self, content: &[u8], doc_type: &str) -> Result<ParseResult, ExtractError> {
        let mut workbook = CalamineWorkbook::open(content)?;
        Ok(self.extract_workbook(&mut workbook, doc_type))
    }

    pub fn extract_workbook(&self, workbook: &mut dyn Workbook, doc_type: &str) -> ParseResult {
        let mut ctx = ExtractionContext::new();
        let names = workbook.sheet_names();
        let targets = select_sheets(&names, &self.config.sheet_hints);
        tracing::debug!("Scanning sheets {:?} of {:?}", targets, names);

        for name in &targets {
            match workbook.sheet_rows(name) {
                Ok(rows) => self.extract_sheet(&mut ctx, name, &rows, doc_type),
                Err(e) => tracing::warn!("Skipping unreadable sheet '{}': {}", name, e),
            }
        }

        let summary = format!(
            "Parsed {} sheets, {} controls, {} mappings",
            names.len(),
            ctx.control_count(),
            ctx.mapping_count()
        );
        tracing::info!("{}", summary);
        ctx.into_result(truncate_chars(&summary, self.config.raw_text_limit))
    }

    fn extract_sheet(&self, ctx: &mut ExtractionContext, name: &str, rows: &SheetRows, doc_type: &str) {
        if rows.len() < self.config.min_sheet_rows {
            tracing::debug!("Skipping sheet '{}': only {} rows", name, rows.len());
            return;
        }

        let Some(header_idx) =
            find_header_row(rows, self.config.header_scan_rows, self.config.min_header_score)
        else {
            tracing::debug!("Skipping sheet '{}': no header row found", name);
            return;
        };

        let columns = dedup_columns(&rows[header_idx]);
        let Some(roles) = infer_column_roles(&columns) else {
            tracing::debug!("Skipping sheet '{}': columns {:?} have no usable roles", name, columns);
            return;
        };
        tracing::debug!(
            "Sheet '{}': header row {}, reference '{}', cross-reference '{}'",
            name,
            header_idx,
            columns[roles.reference],
            columns[roles.cross_reference]
        );

        for row in &rows[header_idx + 1..] {
            let reference = cell(row, roles.reference);
            if reference.is_empty() || reference == "nan" {
                continue;
            }

            let title = roles.title.map(|idx| cell(row, idx)).unwrap_or("");
            let description = roles.description.map(|idx| cell(row, idx)).unwrap_or("");
            let title = if title.is_empty() {
                format!("Control {}", reference)
            } else {
                title.to_string()
            };
            ctx.register_control(ControlCandidate::new(
                reference,
                title,
                description,
                category_for(reference, doc_type),
            ));

            for cross_ref in grammar::cross_references(cell(row, roles.cross_reference)) {
                ctx.add_mapping(&cross_ref, reference);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::sources::GridWorkbook;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn c5_sheet() -> Vec<Vec<&'static str>> {
        vec![
            vec!["C5:2020 Cross Reference", "", "", ""],
            vec!["Ref", "Title", "Basic Criteria", "Ref"],
            vec!["OIS-01", "Information Security Management System", "The provider operates an ISMS.", "4.1 - 10.2"],
            vec!["IDM-01", "Policy for user accounts", "", "A.5.15, A.8.3\nA.8.5"],
            vec!["CRY-01", "Policy for cryptography", "", "A.5.14, A.5.31, A.8.24"],
            vec!["CRY-01", "Duplicate row", "", "A.8.24"],
            vec!["", "blank reference", "", "A.5.1"],
            vec!["nan", "missing reference", "", "A.5.2"],
            vec!["SIM-01", "", "", "-"],
        ]
    }

    fn extract(workbook: &mut GridWorkbook, doc_type: &str) -> ParseResult {
        TabularExtractor::new(ExtractConfig::default()).extract_workbook(workbook, doc_type)
    }

    #[test]
    fn dual_ref_columns() {
        let columns = strings(&["Ref", "Title", "Basic Criteria", "Ref_1"]);
        let roles = infer_column_roles(&columns).unwrap();
        assert_eq!(columns[roles.reference], "Ref");
        assert_eq!(roles.title.map(|i| columns[i].as_str()), Some("Title"));
        assert_eq!(roles.description.map(|i| columns[i].as_str()), Some("Basic Criteria"));
        assert_eq!(columns[roles.cross_reference], "Ref_1");
    }

    #[test]
    fn second_ref_column_wins_over_later_iso_column() {
        let columns = strings(&["Reference", "Title", "Cross Ref", "ISO 27001"]);
        let roles = infer_column_roles(&columns).unwrap();
        assert_eq!(roles.reference, 0);
        assert_eq!(roles.cross_reference, 2);
    }

    #[test]
    fn iso_named_reference_is_cross_reference() {
        assert_eq!(classify_column("ISO Reference"), Some(ColumnRole::CrossReference));
        assert_eq!(classify_column("Reference title"), Some(ColumnRole::Reference));
        assert_eq!(classify_column("Basic"), Some(ColumnRole::Description));
        assert_eq!(classify_column("Notes"), None);

        let roles = infer_column_roles(&strings(&["Ref", "ISO Reference", "Title"])).unwrap();
        assert_eq!((roles.reference, roles.cross_reference), (0, 1));
    }

    #[test]
    fn positional_fallback_needs_four_columns() {
        let roles = infer_column_roles(&strings(&["Kennung", "Title", "Description", "Zuordnung"])).unwrap();
        assert_eq!(
            roles,
            ColumnRoles {
                reference: 0,
                title: Some(1),
                description: Some(2),
                cross_reference: 3
            }
        );
        assert!(infer_column_roles(&strings(&["Title", "Description", "Notes"])).is_none());
    }

    #[test]
    fn duplicate_headers_are_suffixed() {
        assert_eq!(
            dedup_columns(&strings(&["Ref", "Title", "Ref", " ", "Ref"])),
            strings(&["Ref", "Title", "Ref_1", "column_3", "Ref_2"])
        );
    }

    #[test]
    fn header_row_scoring() {
        let rows = vec![
            strings(&["Cloud criteria catalogue", ""]),
            strings(&["Ref", "Title", "Criteria description"]),
            strings(&["Ref", "Title", "Description"]),
        ];
        assert_eq!(header_score(&rows[1]), 4);
        assert_eq!(find_header_row(&rows, 5, 2), Some(1));
        assert_eq!(find_header_row(&rows, 1, 2), None);
    }

    #[test]
    fn extracts_cross_reference_sheet() {
        let mut wb = GridWorkbook::new().with_sheet("C5 ISO Mapping", c5_sheet());
        let result = extract(&mut wb, "C5 Cross-Reference");

        assert!(result.success);
        let ids: Vec<_> = result.controls.iter().map(|c| c.control_id.as_str()).collect();
        assert_eq!(ids, vec!["OIS-01", "IDM-01", "CRY-01", "SIM-01"]);

        let cry = result.control("CRY-01").unwrap();
        assert_eq!(cry.title, "Policy for cryptography");
        assert_eq!(cry.category, "CRY");
        assert_eq!(result.control("SIM-01").unwrap().title, "Control SIM-01");
        assert_eq!(
            result.control("OIS-01").unwrap().description,
            "The provider operates an ISMS."
        );

        let pairs: Vec<_> = result
            .mappings
            .iter()
            .map(|m| (m.source.as_str(), m.target.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("4.1", "OIS-01"),
                ("10.2", "OIS-01"),
                ("A.5.15", "IDM-01"),
                ("A.8.3", "IDM-01"),
                ("A.8.5", "IDM-01"),
                ("A.5.14", "CRY-01"),
                ("A.5.31", "CRY-01"),
                ("A.8.24", "CRY-01"),
            ]
        );
        assert!(!result.has_mapping("5.15", "IDM-01"));
        assert_eq!(result.raw_text, "Parsed 1 sheets, 4 controls, 8 mappings");
    }

    #[test]
    fn low_scoring_sheet_is_skipped() {
        let mut wb = GridWorkbook::new().with_sheet(
            "Mapping",
            vec![
                vec!["Catalogue", "", ""],
                vec!["Version 2020", "", ""],
                vec!["", "", ""],
                vec!["Notes", "Title", ""],
                vec!["", "", ""],
                vec!["Ref", "Title", "Description"],
                vec!["OIS-01", "ISMS", "A.5.1"],
            ],
        );
        let result = extract(&mut wb, "C5");
        assert!(result.success);
        assert!(result.controls.is_empty());
        assert!(result.mappings.is_empty());
    }

    #[test]
    fn hinted_sheets_are_preferred() {
        let data = vec![
            vec!["Ref", "Title", "Description", "ISO 27001"],
            vec!["OIS-01", "ISMS", "", "A.5.1"],
            vec!["OIS-02", "Roles", "", "A.5.2"],
        ];
        let mut wb = GridWorkbook::new()
            .with_sheet("Introduction", data.clone())
            .with_sheet("Reference Table", vec![
                vec!["Ref", "Title", "Description", "ISO 27001"],
                vec!["PSS-01", "Guidelines", "", "A.5.7"],
                vec!["PSS-02", "Notes", "", ""],
            ]);
        let result = extract(&mut wb, "C5");
        let ids: Vec<_> = result.controls.iter().map(|c| c.control_id.as_str()).collect();
        assert_eq!(ids, vec!["PSS-01", "PSS-02"]);

        let mut single = GridWorkbook::new().with_sheet("Sheet1", data);
        assert_eq!(extract(&mut single, "C5").mappings.len(), 2);
    }

    #[test]
    fn short_sheets_are_skipped() {
        let mut wb = GridWorkbook::new().with_sheet(
            "Mapping",
            vec![vec!["Ref", "Title", "Description", "ISO"], vec!["OIS-01", "ISMS", "", "A.5.1"]],
        );
        assert!(extract(&mut wb, "C5").controls.is_empty());
    }

    #[test]
    fn category_depends_on_doc_type_hint() {
        assert_eq!(category_for("CRY-01", "anything"), "CRY");
        assert_eq!(category_for("Special", "C5:2020"), "");
        assert_eq!(category_for("APP.1", "BSI"), "APP");
    }

    struct BrokenWorkbook;

    impl Workbook for BrokenWorkbook {
        fn sheet_names(&self) -> Vec<String> {
            vec!["Mapping".to_string()]
        }

        fn sheet_rows(&mut self, name: &str) -> Result<SheetRows, ExtractError> {
            Err(ExtractError::Spreadsheet(format!("corrupt sheet {}", name)))
        }
    }

    #[test]
    fn unreadable_sheet_does_not_fail_document() {
        let result = TabularExtractor::new(ExtractConfig::default())
            .extract_workbook(&mut BrokenWorkbook, "C5");
        assert!(result.success);
        assert!(result.controls.is_empty());
    }

    #[test]
    fn malformed_workbook_is_an_error() {
        let result = TabularExtractor::new(ExtractConfig::default()).extract(b"garbage", "C5");
        assert!(matches!(result, Err(ExtractError::Spreadsheet(_))));
    }
}
