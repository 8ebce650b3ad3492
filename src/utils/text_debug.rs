// src/utils/text_debug.rs
use std::fs;
use std::path::Path;

use regex::Regex;

use crate::utils::error::StorageError;

/// Identifier families highlighted in debug output: (pattern, family).
pub const IDENTIFIER_PATTERNS: [(&str, &str); 5] = [
    (r"A\.\d+\.\d+", "annex"),
    (r"\b[A-Z]{2,5}\.\d+(?:\.\d+)?\.A\d+\b", "requirement"),
    (r"BSI-Standard\s+200-[1-4]", "standard"),
    (r"(?m)^\d+(?:\.\d+)+\s", "clause"),
    (r"\b[A-Z]{2,4}-\d{2}\b", "criteria"),
];

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Renders extracted text as an HTML page with every pattern match wrapped
/// in a highlighted span. Where matches overlap, the earliest one wins.
pub fn annotate_text(text: &str, patterns: &[(&str, &str)]) -> Result<String, regex::Error> {
    let mut highlights: Vec<(usize, usize, &str)> = Vec::new();
    for (pattern, family) in patterns {
        let re = Regex::new(pattern)?;
        for mat in re.find_iter(text) {
            highlights.push((mat.start(), mat.end(), *family));
        }
    }
    highlights.sort_by_key(|h| (h.0, std::cmp::Reverse(h.1)));

    let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<style>\n");
    html.push_str("body { font-family: monospace; white-space: pre-wrap; }\n");
    html.push_str(".hl-annex { background-color: #90EE90; }\n");
    html.push_str(".hl-requirement { background-color: #ADD8E6; }\n");
    html.push_str(".hl-standard { background-color: #FFA500; }\n");
    html.push_str(".hl-clause { background-color: #FFFF00; }\n");
    html.push_str(".hl-criteria { background-color: #FFC0CB; }\n");
    html.push_str("</style>\n</head>\n<body>\n");

    let mut last_pos = 0;
    for (start, end, family) in highlights {
        if start < last_pos {
            continue;
        }
        html.push_str(&escape_html(&text[last_pos..start]));
        html.push_str(&format!(
            "<span class=\"hl-{}\" title=\"{} {}-{}\">",
            family, family, start, end
        ));
        html.push_str(&escape_html(&text[start..end]));
        html.push_str("</span>");
        last_pos = end;
    }
    html.push_str(&escape_html(&text[last_pos..]));
    html.push_str("\n</body>\n</html>");

    Ok(html)
}

/// Writes the annotated page for `text` to `path`.
pub fn save_annotated_text(text: &str, path: &Path) -> Result<(), StorageError> {
    let html = annotate_text(text, &IDENTIFIER_PATTERNS)
        .map_err(|e| StorageError::SerializationError(format!("Invalid highlight pattern: {}", e)))?;
    fs::write(path, html)?;
    tracing::info!("Saved annotated debug text to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_identifier_families() {
        let html = annotate_text("A.5.1 <Policy> ISMS.1.A3", &IDENTIFIER_PATTERNS).unwrap();
        assert!(html.contains("<span class=\"hl-annex\" title=\"annex 0-5\">A.5.1</span>"));
        assert!(html.contains("&lt;Policy&gt;"));
        assert!(html.contains("hl-requirement"));
    }

    #[test]
    fn overlapping_matches_keep_the_first() {
        let html = annotate_text("abcdef", &[("abcd", "annex"), ("cdef", "clause")]).unwrap();
        assert!(html.contains(">abcd</span>ef"));
        assert!(!html.contains("hl-clause\""));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        assert!(annotate_text("x", &[("(", "broken")]).is_err());
    }

    #[test]
    fn writes_debug_file() -> Result<(), StorageError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("raw_text_annotated.html");
        save_annotated_text("6.2 Objectives BSI-Standard 200-2", &path)?;
        assert!(fs::read_to_string(path)?.contains("hl-standard"));
        Ok(())
    }
}
