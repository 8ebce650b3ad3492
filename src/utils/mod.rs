// src/utils/mod.rs
pub mod error;
pub mod logging;
pub mod text_debug;

pub use error::{AppError, ExtractError, StorageError}; // Re-export error types for convenience
