// src/lib.rs
//! Extraction of control catalogs and cross-references from compliance
//! mapping documents (PDF tables, spreadsheets, CSV exports).

pub mod catalog;
pub mod config;
pub mod extractors;
pub mod storage;
pub mod utils;

pub use catalog::{ControlCandidate, ImportBatch, MappingCandidate, ParseResult};
pub use config::ExtractConfig;
pub use extractors::{parse_uploaded_bytes, DocumentParser};
