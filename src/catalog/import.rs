// src/catalog/import.rs
//! The record handed to the import step: extracted candidates resolved to
//! catalogs and tagged with provenance.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::models::{Catalog, ParseResult};

/// Confidence attached to every machine-extracted correspondence.
pub const MACHINE_EXTRACTED_CONFIDENCE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Published cross-reference tables.
    Official,
    /// Curated by an analyst.
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportControl {
    pub catalog: Catalog,
    pub control_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportMapping {
    pub source_catalog: Catalog,
    pub source: String,
    pub target_catalog: Catalog,
    pub target: String,
    pub confidence: f64,
    pub source_type: SourceType,
    pub source_document: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub source_catalog: Catalog,
    pub target_catalog: Catalog,
    pub source_document: String,
    pub controls: Vec<ImportControl>,
    pub mappings: Vec<ImportMapping>,
}

impl ImportBatch {
    /// Builds an import batch from a finished extraction.
    ///
    /// Target-side controls come straight from the result. Source-side
    /// identifiers that only appear in mappings (clauses, Annex controls)
    /// get a placeholder record so every mapping resolves on both ends.
    /// A failed result produces an empty batch.
    pub fn from_result(result: &ParseResult, doc_type: &str, source_document: &str) -> Self {
        let target_catalog = Catalog::from_doc_type(doc_type);
        let source_catalog = Catalog::Iso27001;
        let source_document = if source_document.is_empty() {
            doc_type.to_string()
        } else {
            source_document.to_string()
        };

        let mut batch = ImportBatch {
            source_catalog,
            target_catalog,
            source_document,
            controls: Vec::new(),
            mappings: Vec::new(),
        };

        if !result.success {
            tracing::debug!("Skipping import batch for failed result: {:?}", result.error);
            return batch;
        }

        let mut seen: HashSet<(Catalog, &str)> = HashSet::new();
        for ctrl in &result.controls {
            if seen.insert((target_catalog, ctrl.control_id.as_str())) {
                batch.controls.push(ImportControl {
                    catalog: target_catalog,
                    control_id: ctrl.control_id.clone(),
                    title: ctrl.title.clone(),
                    description: ctrl.description.clone(),
                    category: ctrl.category.clone(),
                });
            }
        }

        for mapping in &result.mappings {
            if mapping.source.is_empty() {
                continue;
            }
            if seen.insert((source_catalog, mapping.source.as_str())) {
                let category = if mapping.source.starts_with("A.") {
                    "Annex A"
                } else {
                    "Clause"
                };
                batch.controls.push(ImportControl {
                    catalog: source_catalog,
                    control_id: mapping.source.clone(),
                    title: format!("ISO {}", mapping.source),
                    description: String::new(),
                    category: category.to_string(),
                });
            }
            batch.mappings.push(ImportMapping {
                source_catalog,
                source: mapping.source.clone(),
                target_catalog,
                target: mapping.target.clone(),
                confidence: MACHINE_EXTRACTED_CONFIDENCE,
                source_type: SourceType::Official,
                source_document: batch.source_document.clone(),
            });
        }

        tracing::info!(
            "Import batch for '{}': {} controls, {} mappings ({} -> {})",
            batch.source_document,
            batch.controls.len(),
            batch.mappings.len(),
            source_catalog.short_name(),
            target_catalog.short_name()
        );
        batch
    }
}
