// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::catalog::import::ImportBatch;
use crate::catalog::models::ParseResult;
use crate::utils::error::StorageError;

/// Writes extraction outputs below a base directory, one folder per document.
pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    /// Directory holding every output of one document: /base_dir/<stem>/
    pub fn document_dir(&self, stem: &str) -> Result<PathBuf, StorageError> {
        let target_dir = self.base_dir.join(stem);
        if !target_dir.exists() {
            fs::create_dir_all(&target_dir).map_err(StorageError::IoError)?;
        }
        Ok(target_dir)
    }

    fn write_json<T: Serialize>(&self, stem: &str, suffix: &str, value: &T) -> Result<PathBuf, StorageError> {
        let file_path = self.document_dir(stem)?.join(format!("{}_{}.json", stem, suffix));

        let json = serde_json::to_string_pretty(value)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, json).map_err(StorageError::IoError)?;

        tracing::info!("Saved {} to {}", suffix, file_path.display());
        Ok(file_path)
    }

    /// Saves the full extraction result.
    pub fn save_result(&self, stem: &str, result: &ParseResult) -> Result<PathBuf, StorageError> {
        self.write_json(stem, "result", result)
    }

    /// Saves a summary of the extraction in JSON format
    pub fn save_result_metadata(
        &self,
        stem: &str,
        filename: &str,
        doc_type: &str,
        result: &ParseResult,
    ) -> Result<PathBuf, StorageError> {
        let metadata = serde_json::json!({
            "filename": filename,
            "doc_type": doc_type,
            "success": result.success,
            "control_count": result.controls.len(),
            "mapping_count": result.mappings.len(),
            "error": result.error,
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });
        self.write_json(stem, "meta", &metadata)
    }

    /// Saves the batch destined for the import step.
    pub fn save_import_batch(&self, stem: &str, batch: &ImportBatch) -> Result<PathBuf, StorageError> {
        self.write_json(stem, "import", batch)
    }
}
