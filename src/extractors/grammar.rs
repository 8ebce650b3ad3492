// src/extractors/grammar.rs
//! Identifier vocabularies of the supported catalog families.
//!
//! Every recognizer returns non-overlapping matches in text order. None of
//! them hold state.

use once_cell::sync::Lazy;
use regex::Regex;

// --- Regex Patterns (Lazy Static) ---
static ANNEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"A\.(\d+)\.(\d+)").expect("Failed to compile ANNEX_RE"));

static CLAUSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\.\d+").expect("Failed to compile CLAUSE_RE"));

static REQUIREMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z]{2,5}\.\d+(?:\.\d+)?\.A\d+\b").expect("Failed to compile REQUIREMENT_RE")
});

static MODULE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z]{2,5}\.\d+(?:\.\d+)?\b").expect("Failed to compile MODULE_RE")
});

static STANDARD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"BSI-Standard\s+200-([1-4])").expect("Failed to compile STANDARD_RE")
});

static ELEMENTARY_THREAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Elementare\s+Gef").expect("Failed to compile ELEMENTARY_THREAT_RE")
});

static CRITERIA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]{2,4})-(\d{2})").expect("Failed to compile CRITERIA_RE"));

static LEADING_LETTERS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]+").expect("Failed to compile LEADING_LETTERS_RE"));

/// Synthetic control standing in for "elementary threat" mentions.
pub const ELEMENTARY_THREAT_ID: &str = "BSI-ElemGef";

pub const STANDARD_CATEGORY: &str = "BSI-Standard";
pub const ANNEX_CATEGORY: &str = "Annex A";
pub const CLAUSE_CATEGORY: &str = "Clause";

/// The standard-reference vocabulary, pre-registered by the PDF extractor.
pub const STANDARD_REFERENCES: [(&str, &str); 5] = [
    (
        "BSI-Std-200-1",
        "BSI-Standard 200-1: Managementsysteme fuer Informationssicherheit (ISMS)",
    ),
    ("BSI-Std-200-2", "BSI-Standard 200-2: IT-Grundschutz-Methodik"),
    (
        "BSI-Std-200-3",
        "BSI-Standard 200-3: Risikoanalyse auf der Basis von IT-Grundschutz",
    ),
    ("BSI-Std-200-4", "BSI-Standard 200-4: Business Continuity Management"),
    (
        ELEMENTARY_THREAT_ID,
        "Elementare Gefaehrdungen (G0) des IT-Grundschutz-Kompendiums",
    ),
];

/// A recognized token and its byte span in the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdMatch {
    pub id: String,
    pub start: usize,
    pub end: usize,
}

impl IdMatch {
    fn overlaps(&self, other: &IdMatch) -> bool {
        self.start < other.end && other.start < self.end
    }
}

fn find_all(re: &Regex, text: &str) -> Vec<IdMatch> {
    re.find_iter(text)
        .map(|m| IdMatch {
            id: m.as_str().to_string(),
            start: m.start(),
            end: m.end(),
        })
        .collect()
}

/// `A.<major>.<minor>` Annex controls.
pub fn annex_ids(text: &str) -> Vec<IdMatch> {
    find_all(&ANNEX_RE, text)
}

/// Bare `<major>.<minor>` clauses. A clause overlapping an Annex match in the
/// same text is excluded, so `A.5.15` never also yields `5.15`.
pub fn clause_ids(text: &str) -> Vec<IdMatch> {
    let annex = annex_ids(text);
    find_all(&CLAUSE_RE, text)
        .into_iter()
        .filter(|clause| !annex.iter().any(|a| a.overlaps(clause)))
        .collect()
}

/// Requirement identifiers such as `ISMS.1.A3` or `OPS.1.1.A12`.
pub fn requirement_ids(text: &str) -> Vec<IdMatch> {
    find_all(&REQUIREMENT_RE, text)
}

/// Module identifiers such as `ISMS.1` or `APP.3.2`. The module prefix of a
/// requirement identifier is not reported on its own.
pub fn module_ids(text: &str) -> Vec<IdMatch> {
    let requirements = requirement_ids(text);
    find_all(&MODULE_RE, text)
        .into_iter()
        .filter(|module| !requirements.iter().any(|r| r.overlaps(module)))
        .collect()
}

/// Standard references in order of first mention, normalized to
/// `BSI-Std-200-<n>`, followed by the elementary-threat sentinel if the text
/// mentions elementary threats.
pub fn standard_refs(text: &str) -> Vec<String> {
    let mut refs: Vec<String> = Vec::new();
    for caps in STANDARD_RE.captures_iter(text) {
        let id = format!("BSI-Std-200-{}", &caps[1]);
        if !refs.contains(&id) {
            refs.push(id);
        }
    }
    if ELEMENTARY_THREAT_RE.is_match(text) {
        refs.push(ELEMENTARY_THREAT_ID.to_string());
    }
    refs
}

/// Criteria-style prefix (`CRY` for `CRY-01`) when the value starts with one.
pub fn criteria_prefix(value: &str) -> Option<&str> {
    CRITERIA_RE
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// The leading run of capital letters, or "" if there is none.
pub fn leading_letters(value: &str) -> &str {
    LEADING_LETTERS_RE
        .find(value)
        .map(|m| m.as_str())
        .unwrap_or("")
}

pub fn standard_title(id: &str) -> Option<&'static str> {
    STANDARD_REFERENCES
        .iter()
        .find(|(ref_id, _)| *ref_id == id)
        .map(|(_, title)| *title)
}

/// Derives a category label from an identifier.
pub fn category_of(id: &str) -> String {
    if standard_title(id).is_some() {
        return STANDARD_CATEGORY.to_string();
    }
    if let Some(annex) = ANNEX_RE.find(id) {
        if annex.start() == 0 && annex.end() == id.len() {
            return ANNEX_CATEGORY.to_string();
        }
    }
    if let Some(prefix) = criteria_prefix(id) {
        return prefix.to_string();
    }
    let letters = leading_letters(id);
    if letters.is_empty() && CLAUSE_RE.is_match(id) {
        return CLAUSE_CATEGORY.to_string();
    }
    letters.to_string()
}

/// `A.<major>.<minor>` at the very start of a line, if present.
pub fn leading_annex(line: &str) -> Option<IdMatch> {
    ANNEX_RE
        .find(line)
        .filter(|m| m.start() == 0)
        .map(|m| IdMatch {
            id: m.as_str().to_string(),
            start: m.start(),
            end: m.end(),
        })
}

fn ids(matches: Vec<IdMatch>) -> Vec<String> {
    matches.into_iter().map(|m| m.id).collect()
}

/// Splits a cross-reference cell into Annex and clause identifiers.
/// "-", "n/a", "nan" and empty cells mean no correspondence. A clause whose
/// text already occurs inside an Annex id of the same cell is dropped.
pub fn cross_references(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if matches!(trimmed, "-" | "n/a" | "nan" | "") {
        return Vec::new();
    }

    let annex = ids(annex_ids(trimmed));
    let mut refs = annex.clone();
    for clause in ids(clause_ids(trimmed)) {
        if annex.iter().any(|a| a.contains(clause.as_str())) || refs.contains(&clause) {
            continue;
        }
        refs.push(clause);
    }
    refs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annex_and_clause_do_not_overlap() {
        assert_eq!(ids(annex_ids("A.5.15, A.8.3")), vec!["A.5.15", "A.8.3"]);
        assert!(clause_ids("A.5.15, A.8.3").is_empty());
        assert_eq!(ids(clause_ids("4.1 - 10.2, A.6.8")), vec!["4.1", "10.2"]);
    }

    #[test]
    fn requirement_is_not_counted_as_module() {
        let text = "ISMS.1.A3 and OPS.1.1.A12 relate to module CON.3";
        assert_eq!(ids(requirement_ids(text)), vec!["ISMS.1.A3", "OPS.1.1.A12"]);
        assert_eq!(ids(module_ids(text)), vec!["CON.3"]);
    }

    #[test]
    fn single_letter_prefix_is_not_a_module() {
        assert!(module_ids("A.5.1 Policies").is_empty());
    }

    #[test]
    fn standard_refs_are_normalized_and_deduplicated() {
        let text = "see BSI-Standard 200-2 and BSI-Standard  200-3, again BSI-Standard 200-2; \
                    Elementare Gefaehrdungen";
        assert_eq!(
            standard_refs(text),
            vec!["BSI-Std-200-2", "BSI-Std-200-3", ELEMENTARY_THREAT_ID]
        );
        assert!(standard_refs("BSI-Standard 200-5").is_empty());
    }

    #[test]
    fn categories() {
        assert_eq!(category_of("CRY-01"), "CRY");
        assert_eq!(category_of("ISMS.1.A3"), "ISMS");
        assert_eq!(category_of("A.5.1"), ANNEX_CATEGORY);
        assert_eq!(category_of("BSI-Std-200-4"), STANDARD_CATEGORY);
        assert_eq!(category_of(ELEMENTARY_THREAT_ID), STANDARD_CATEGORY);
        assert_eq!(category_of("6.2"), CLAUSE_CATEGORY);
    }

    #[test]
    fn criteria_prefix_requires_two_digits() {
        assert_eq!(criteria_prefix("IDM-01"), Some("IDM"));
        assert_eq!(criteria_prefix("IDM-1"), None);
        assert_eq!(criteria_prefix("x IDM-01"), None);
    }

    #[test]
    fn cross_reference_sentinels() {
        for sentinel in ["-", "n/a", "nan", "", "  "] {
            assert!(cross_references(sentinel).is_empty(), "{sentinel:?}");
        }
        assert_eq!(cross_references("A.5.15, A.8.3"), vec!["A.5.15", "A.8.3"]);
        assert_eq!(
            cross_references("A.5.14\nA.8.24\n6.2"),
            vec!["A.5.14", "A.8.24", "6.2"]
        );
    }

    #[test]
    fn clause_inside_an_annex_id_is_dropped() {
        assert_eq!(cross_references("A.5.15, 5.1"), vec!["A.5.15"]);
        assert_eq!(cross_references("5.1\nA.5.15"), vec!["A.5.15"]);
        assert_eq!(cross_references("A.5.15, 6.2"), vec!["A.5.15", "6.2"]);
    }

    #[test]
    fn leading_annex_only_at_line_start() {
        assert_eq!(leading_annex("A.5.1 Policy").unwrap().id, "A.5.1");
        assert!(leading_annex("see A.5.1").is_none());
    }
}
