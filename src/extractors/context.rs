// src/extractors/context.rs
use std::collections::HashSet;

use crate::catalog::models::{ControlCandidate, MappingCandidate, ParseResult};

/// Per-invocation accumulator. Every extraction call builds its own and
/// consumes it into a `ParseResult`; nothing outlives the call.
///
/// Controls are keyed by `control_id` (first registration wins) and mappings
/// by their ordered `(source, target)` pair. Both keep first-seen order.
#[derive(Debug, Default)]
pub struct ExtractionContext {
    controls: Vec<ControlCandidate>,
    seen_controls: HashSet<String>,
    mappings: Vec<MappingCandidate>,
    seen_mappings: HashSet<(String, String)>,
}

impl ExtractionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a control unless its id is already known. Returns true if added.
    pub fn register_control(&mut self, candidate: ControlCandidate) -> bool {
        if self.seen_controls.contains(&candidate.control_id) {
            tracing::trace!("Control already registered: {}", candidate.control_id);
            return false;
        }
        self.seen_controls.insert(candidate.control_id.clone());
        self.controls.push(candidate);
        true
    }

    /// Records a mapping unless the same pair was already seen. Returns true if added.
    pub fn add_mapping(&mut self, source: &str, target: &str) -> bool {
        let key = (source.to_string(), target.to_string());
        if self.seen_mappings.contains(&key) {
            return false;
        }
        tracing::trace!("New mapping: {} -> {}", source, target);
        self.seen_mappings.insert(key);
        self.mappings.push(MappingCandidate::new(source, target));
        true
    }

    pub fn control_count(&self) -> usize {
        self.controls.len()
    }

    pub fn mapping_count(&self) -> usize {
        self.mappings.len()
    }

    pub fn into_result(self, raw_text: String) -> ParseResult {
        ParseResult::success(self.controls, self.mappings, raw_text)
    }
}

/// Truncates diagnostic text to at most `limit` characters.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
