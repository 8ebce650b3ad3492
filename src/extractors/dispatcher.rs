// src/extractors/dispatcher.rs
use std::panic::{self, AssertUnwindSafe};

use super::delimited::DelimitedExtractor;
use super::pdf::TextTableExtractor;
use super::spreadsheet::TabularExtractor;
use crate::catalog::models::ParseResult;
use crate::config::ExtractConfig;
use crate::utils::error::ExtractError;

/// Input formats the dispatcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Spreadsheet,
    Delimited,
}

/// Filename suffixes per format, matched case-insensitively in this order.
const FORMAT_SUFFIXES: [(&[&str], DocumentFormat); 3] = [
    (&[".pdf"], DocumentFormat::Pdf),
    (&[".xlsx", ".xls"], DocumentFormat::Spreadsheet),
    (&[".csv"], DocumentFormat::Delimited),
];

impl DocumentFormat {
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        FORMAT_SUFFIXES
            .iter()
            .find(|(suffixes, _)| suffixes.iter().any(|s| lower.ends_with(s)))
            .map(|(_, format)| *format)
    }
}

/// A format-specific way of turning document bytes into a `ParseResult`.
pub trait ExtractionStrategy {
    fn name(&self) -> &'static str;
    fn extract(&self, content: &[u8], doc_type: &str) -> Result<ParseResult, ExtractError>;
}

impl ExtractionStrategy for TextTableExtractor {
    fn name(&self) -> &'static str {
        "text-table"
    }

    fn extract(&self, content: &[u8], _doc_type: &str) -> Result<ParseResult, ExtractError> {
        TextTableExtractor::extract(self, content)
    }
}

impl ExtractionStrategy for TabularExtractor {
    fn name(&self) -> &'static str {
        "tabular"
    }

    fn extract(&self, content: &[u8], doc_type: &str) -> Result<ParseResult, ExtractError> {
        TabularExtractor::extract(self, content, doc_type)
    }
}

impl ExtractionStrategy for DelimitedExtractor {
    fn name(&self) -> &'static str {
        "delimited"
    }

    fn extract(&self, content: &[u8], _doc_type: &str) -> Result<ParseResult, ExtractError> {
        DelimitedExtractor::extract(self, content)
    }
}

/// Entry point for all documents. Picks a strategy by filename suffix and
/// never fails: every error comes back as an unsuccessful `ParseResult`.
#[derive(Debug, Clone, Default)]
pub struct DocumentParser {
    config: ExtractConfig,
}

impl DocumentParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ExtractConfig) -> Self {
        Self { config }
    }

    fn strategy_for(&self, format: DocumentFormat) -> Box<dyn ExtractionStrategy> {
        match format {
            DocumentFormat::Pdf => Box::new(TextTableExtractor::new(self.config.clone())),
            DocumentFormat::Spreadsheet => Box::new(TabularExtractor::new(self.config.clone())),
            DocumentFormat::Delimited => Box::new(DelimitedExtractor::new(self.config.clone())),
        }
    }

    pub fn parse(&self, content: &[u8], filename: &str, doc_type: &str) -> ParseResult {
        let Some(format) = DocumentFormat::from_filename(filename) else {
            let err = ExtractError::UnsupportedFormat(filename.to_lowercase());
            tracing::warn!("{}", err);
            return ParseResult::failure(err.to_string());
        };

        let strategy = self.strategy_for(format);
        tracing::info!(
            "Extracting '{}' ({} bytes) with {} strategy",
            filename,
            content.len(),
            strategy.name()
        );

        match run_contained(strategy.as_ref(), content, doc_type) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Extraction of '{}' failed: {}", filename, e);
                ParseResult::failure(e.to_string())
            }
        }
    }
}

/// Runs a strategy, turning a panic inside a third-party reader into an error.
fn run_contained(
    strategy: &dyn ExtractionStrategy,
    content: &[u8],
    doc_type: &str,
) -> Result<ParseResult, ExtractError> {
    panic::catch_unwind(AssertUnwindSafe(|| strategy.extract(content, doc_type)))
        .unwrap_or_else(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(ExtractError::Panicked(message))
        })
}

/// Parses raw document bytes with the default configuration.
pub fn parse_uploaded_bytes(content: &[u8], filename: &str, doc_type: &str) -> ParseResult {
    DocumentParser::new().parse(content, filename, doc_type)
}
