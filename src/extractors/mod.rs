// src/extractors/mod.rs
pub mod context;
pub mod delimited;
pub mod dispatcher;
pub mod grammar;
pub mod pdf;
pub mod sources;
pub mod spreadsheet;

// Re-export key extraction types for convenience
pub use context::ExtractionContext;
pub use delimited::DelimitedExtractor;
pub use dispatcher::{parse_uploaded_bytes, DocumentFormat, DocumentParser, ExtractionStrategy};
pub use pdf::TextTableExtractor;
pub use sources::{CalamineWorkbook, GridWorkbook, LopdfPageSource, PageTextSource, Workbook};
pub use spreadsheet::TabularExtractor;
