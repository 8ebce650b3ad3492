// src/catalog/models.rs
use serde::{Deserialize, Serialize};

/// One catalog entry discovered during extraction, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlCandidate {
    pub control_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
}

impl ControlCandidate {
    pub fn new(
        control_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            control_id: control_id.into(),
            title: title.into(),
            description: description.into(),
            category: category.into(),
        }
    }
}

/// A correspondence between a source-catalog identifier and a target-catalog
/// identifier, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MappingCandidate {
    pub source: String,
    pub target: String,
}

impl MappingCandidate {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Outcome of a single extraction call. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub success: bool,
    #[serde(default)]
    pub controls: Vec<ControlCandidate>,
    #[serde(default)]
    pub mappings: Vec<MappingCandidate>,
    /// Diagnostic only.
    #[serde(default)]
    pub raw_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ParseResult {
    pub fn success(
        controls: Vec<ControlCandidate>,
        mappings: Vec<MappingCandidate>,
        raw_text: String,
    ) -> Self {
        Self {
            success: true,
            controls,
            mappings,
            raw_text,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            controls: Vec::new(),
            mappings: Vec::new(),
            raw_text: String::new(),
            error: Some(error.into()),
        }
    }

    pub fn control(&self, control_id: &str) -> Option<&ControlCandidate> {
        self.controls.iter().find(|c| c.control_id == control_id)
    }

    pub fn has_mapping(&self, source: &str, target: &str) -> bool {
        self.mappings
            .iter()
            .any(|m| m.source == source && m.target == target)
    }
}

/// The catalog families a document can feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Catalog {
    #[serde(rename = "ISO27001")]
    Iso27001,
    #[serde(rename = "BSI")]
    Bsi,
    #[serde(rename = "C5")]
    C5,
}

impl Catalog {
    /// Infers the target catalog from a free-text document type label.
    pub fn from_doc_type(doc_type: &str) -> Self {
        if doc_type.contains("BSI") && !doc_type.contains("C5") {
            Catalog::Bsi
        } else if doc_type.contains("C5") {
            Catalog::C5
        } else {
            Catalog::Iso27001
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Catalog::Iso27001 => "ISO27001",
            Catalog::Bsi => "BSI",
            Catalog::C5 => "C5",
        }
    }
}
