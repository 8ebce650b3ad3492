// src/catalog/mod.rs
pub mod import;
pub mod models;

pub use import::{ImportBatch, ImportControl, ImportMapping, SourceType, MACHINE_EXTRACTED_CONFIDENCE};
pub use models::{Catalog, ControlCandidate, MappingCandidate, ParseResult};
