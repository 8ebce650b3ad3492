// src/extractors/delimited.rs
//! Two-column correspondence exports (CSV).

use csv::ReaderBuilder;

use super::context::{truncate_chars, ExtractionContext};
use crate::catalog::models::{ControlCandidate, ParseResult};
use crate::config::ExtractConfig;
use crate::utils::error::ExtractError;

const SOURCE_KEYWORDS: [&str; 3] = ["ISO", "27001", "SOURCE"];
const TARGET_KEYWORDS: [&str; 3] = ["BSI", "C5", "TARGET"];

/// Source and target column indices. The first matching column wins per
/// role; a column that matches a source keyword is never a target.
pub fn infer_source_target(headers: &[String]) -> (Option<usize>, Option<usize>) {
    let mut source = None;
    let mut target = None;

    for (idx, name) in headers.iter().enumerate() {
        let upper = name.to_uppercase();
        if SOURCE_KEYWORDS.iter().any(|kw| upper.contains(kw)) {
            source.get_or_insert(idx);
        } else if TARGET_KEYWORDS.iter().any(|kw| upper.contains(kw)) {
            target.get_or_insert(idx);
        }
    }
    (source, target)
}

fn usable(value: &str) -> bool {
    !value.is_empty() && value != "nan"
}

/// CSV strategy.
pub struct DelimitedExtractor {
    config: ExtractConfig,
}

impl DelimitedExtractor {
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    pub fn extract(&self, content: &[u8]) -> Result<ParseResult, ExtractError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut ctx = ExtractionContext::new();
        let mut row_count = 0;

        match infer_source_target(&headers) {
            (Some(source_idx), Some(target_idx)) => {
                for record in reader.records() {
                    let record = match record {
                        Ok(record) => record,
                        Err(e) => {
                            tracing::warn!("Skipping unreadable CSV row: {}", e);
                            continue;
                        }
                    };
                    row_count += 1;
                    let source = record.get(source_idx).unwrap_or("").trim();
                    let target = record.get(target_idx).unwrap_or("").trim();
                    if !usable(source) || !usable(target) {
                        continue;
                    }
                    ctx.add_mapping(source, target);
                    ctx.register_control(ControlCandidate::new(
                        target,
                        format!("Control {}", target),
                        "",
                        "",
                    ));
                }
            }
            _ => {
                tracing::debug!("No source/target columns among {:?}", headers);
                for record in reader.records() {
                    match record {
                        Ok(_) => row_count += 1,
                        Err(e) => tracing::warn!("Skipping unreadable CSV row: {}", e),
                    }
                }
            }
        }

        tracing::info!(
            "Delimited extraction: {} rows, {} mappings",
            row_count,
            ctx.mapping_count()
        );
        let summary = format!("Parsed {} rows, columns: {:?}", row_count, headers);
        Ok(ctx.into_result(truncate_chars(&summary, self.config.raw_text_limit)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(csv: &str) -> ParseResult {
        DelimitedExtractor::new(ExtractConfig::default())
            .extract(csv.as_bytes())
            .unwrap()
    }

    #[test]
    fn source_target_columns() {
        let result = extract("Source,Target\nA.8.24,CRY-01\nnan,CRY-02\nA.5.1,nan\n,OIS-01\n");

        assert!(result.success);
        assert_eq!(result.controls.len(), 1);
        let ctrl = &result.controls[0];
        assert_eq!(ctrl.control_id, "CRY-01");
        assert_eq!(ctrl.title, "Control CRY-01");
        assert_eq!(ctrl.category, "");
        assert_eq!(result.mappings.len(), 1);
        assert!(result.has_mapping("A.8.24", "CRY-01"));
        assert_eq!(
            result.raw_text,
            r#"Parsed 4 rows, columns: ["Source", "Target"]"#
        );
    }

    #[test]
    fn keyword_columns_are_case_insensitive() {
        let headers: Vec<String> = ["id", "iso 27001 control", "bsi requirement", "C5 criterion"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(infer_source_target(&headers), (Some(1), Some(2)));
    }

    #[test]
    fn repeated_rows_yield_one_mapping() {
        let result = extract("ISO,BSI\nA.5.1,ISMS.1.A1\nA.5.1,ISMS.1.A1\nA.5.2,ISMS.1.A1\n");
        assert_eq!(result.mappings.len(), 2);
        assert_eq!(result.controls.len(), 1);
    }

    #[test]
    fn unrecognized_columns_yield_nothing() {
        let result = extract("left,right\nA.5.1,CRY-01\n");
        assert!(result.success);
        assert!(result.controls.is_empty());
        assert!(result.mappings.is_empty());
    }

    #[test]
    fn short_rows_are_tolerated() {
        let result = extract("Source,Target,Note\nA.5.1\nA.5.2,OIS-01\n");
        assert_eq!(result.mappings.len(), 1);
        assert!(result.has_mapping("A.5.2", "OIS-01"));
    }

    #[test]
    fn unreadable_row_does_not_abort_the_document() {
        let content = b"Source,Target\nA.8.24,CRY-01\nA.5.1,\xff\xfe\nA.5.2,OIS-01\n";
        let result = DelimitedExtractor::new(ExtractConfig::default())
            .extract(content)
            .unwrap();

        assert!(result.success);
        assert_eq!(result.mappings.len(), 2);
        assert!(result.has_mapping("A.8.24", "CRY-01"));
        assert!(result.has_mapping("A.5.2", "OIS-01"));
        assert!(result.raw_text.starts_with("Parsed 2 rows"));

        let unmapped = DelimitedExtractor::new(ExtractConfig::default())
            .extract(b"left,right\nx,\xff\ny,z\n")
            .unwrap();
        assert!(unmapped.success);
        assert!(unmapped.mappings.is_empty());
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let result = extract("\u{feff}Source,Target\nA.8.24,CRY-01\n");
        assert!(result.has_mapping("A.8.24", "CRY-01"));
    }
}
