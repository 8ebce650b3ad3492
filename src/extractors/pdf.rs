// src/extractors/pdf.rs
//! Correspondence tables published as PDF.
//!
//! The document has two halves: a clause section where numbered clauses cite
//! methodology standards in prose, and an Annex section where each
//! `A.<x>.<y>` control lists the baseline requirements covering it. The text
//! is scanned in several passes that all feed one `ExtractionContext`, so a
//! pair found twice is only reported once, in the order it was first seen.

use once_cell::sync::Lazy;
use regex::Regex;

use super::context::{truncate_chars, ExtractionContext};
use super::grammar::{self, STANDARD_CATEGORY, STANDARD_REFERENCES};
use super::sources::{LopdfPageSource, PageTextSource};
use crate::catalog::models::{ControlCandidate, ParseResult};
use crate::config::ExtractConfig;
use crate::utils::error::ExtractError;

// --- Regex Patterns (Lazy Static) ---
// "6.1.2 Information security risk assessment", "4 Context of the organization"
static CLAUSE_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)*)\s+[A-Z]").expect("Failed to compile CLAUSE_HEADER_RE")
});

static SUB_CLAUSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+").expect("Failed to compile SUB_CLAUSE_RE"));

// Annex marker plus the whitespace that separates it from its body.
static ANNEX_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"A\.(\d+)\.(\d+)\s").expect("Failed to compile ANNEX_MARKER_RE"));

static ANNEX_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^A\.(\d+)\.(\d+)\s+(.+)").expect("Failed to compile ANNEX_LINE_RE")
});

/// Text-table strategy over a pluggable page text source.
pub struct TextTableExtractor<S = LopdfPageSource> {
    source: S,
    config: ExtractConfig,
}

impl TextTableExtractor<LopdfPageSource> {
    pub fn new(config: ExtractConfig) -> Self {
        Self::with_source(LopdfPageSource, config)
    }
}

impl<S: PageTextSource> TextTableExtractor<S> {
    pub fn with_source(source: S, config: ExtractConfig) -> Self {
        Self { source, config }
    }

    /// Reads every page and extracts correspondences from the joined text.
    /// Pages without text contribute an empty line.
    pub fn extract(&self, content: &[u8]) -> Result<ParseResult, ExtractError> {
        let pages = self.source.page_texts(content)?;
        let empty_pages = pages.iter().filter(|p| p.is_none()).count();
        if empty_pages > 0 {
            tracing::debug!("{} of {} pages yielded no text", empty_pages, pages.len());
        }

        let full_text = pages
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect::<Vec<_>>()
            .join("\n");

        Ok(self.extract_text(&full_text))
    }

    /// Runs all passes over already extracted text.
    pub fn extract_text(&self, full_text: &str) -> ParseResult {
        let mut ctx = ExtractionContext::new();

        preseed_standards(&mut ctx);
        clause_pass(&mut ctx, full_text);
        tracing::debug!("After clause pass: {} mappings", ctx.mapping_count());
        annex_section_pass(&mut ctx, full_text);
        tracing::debug!("After annex section pass: {} mappings", ctx.mapping_count());
        annex_line_pass(&mut ctx, full_text);

        tracing::info!(
            "Text-table extraction found {} controls, {} mappings",
            ctx.control_count(),
            ctx.mapping_count()
        );
        ctx.into_result(truncate_chars(full_text, self.config.raw_text_limit))
    }
}

fn preseed_standards(ctx: &mut ExtractionContext) {
    for (id, title) in STANDARD_REFERENCES {
        ctx.register_control(ControlCandidate::new(id, title, "", STANDARD_CATEGORY));
    }
}

fn add_standard(ctx: &mut ExtractionContext, standard_id: &str, source: &str) {
    let title = grammar::standard_title(standard_id).unwrap_or(standard_id);
    ctx.register_control(ControlCandidate::new(
        standard_id,
        title,
        "",
        STANDARD_CATEGORY,
    ));
    ctx.add_mapping(source, standard_id);
}

fn add_requirement(ctx: &mut ExtractionContext, requirement_id: &str, annex: &str) {
    ctx.register_control(ControlCandidate::new(
        requirement_id,
        format!("BSI {}", requirement_id),
        "",
        grammar::leading_letters(requirement_id),
    ));
    ctx.add_mapping(annex, requirement_id);
}

fn flush_clause(ctx: &mut ExtractionContext, clause: Option<&str>, buffer: &mut Vec<&str>) {
    if let Some(clause) = clause {
        if !buffer.is_empty() {
            let block = buffer.join(" ");
            for standard_id in grammar::standard_refs(&block) {
                tracing::trace!("Clause {} cites {}", clause, standard_id);
                add_standard(ctx, &standard_id, clause);
            }
        }
    }
    buffer.clear();
}

/// Clause section: numbered clauses citing standards. Ends at the first line
/// opening with an Annex marker.
fn clause_pass(ctx: &mut ExtractionContext, text: &str) {
    let mut current: Option<String> = None;
    let mut buffer: Vec<&str> = Vec::new();

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() {
            continue;
        }
        if grammar::leading_annex(stripped).is_some() {
            tracing::debug!("Clause section ends at '{}'", stripped);
            break;
        }

        if let Some(caps) = CLAUSE_HEADER_RE.captures(stripped) {
            flush_clause(ctx, current.as_deref(), &mut buffer);
            let number = &caps[1];
            // Top-level headers ("6 Planning") keep the previous sub-clause.
            if SUB_CLAUSE_RE.is_match(number) {
                current = Some(number.to_string());
            }
            buffer.push(stripped);
        } else if current.is_some() {
            buffer.push(stripped);
        }
    }

    flush_clause(ctx, current.as_deref(), &mut buffer);
}

fn scan_annex_body(ctx: &mut ExtractionContext, annex: &str, body: &str) {
    if body.trim().is_empty() {
        return;
    }
    for requirement in grammar::requirement_ids(body) {
        add_requirement(ctx, &requirement.id, annex);
    }
    // A bare module mention names a control but establishes no correspondence.
    for module in grammar::module_ids(body) {
        ctx.register_control(ControlCandidate::new(
            module.id.as_str(),
            format!("BSI Module {}", module.id),
            "",
            grammar::leading_letters(&module.id),
        ));
    }
    for standard_id in grammar::standard_refs(body) {
        add_standard(ctx, &standard_id, annex);
    }
}

/// Annex section: the text between consecutive Annex markers belongs to the
/// earlier marker. Text before the first marker is ignored.
fn annex_section_pass(ctx: &mut ExtractionContext, text: &str) {
    let mut current: Option<String> = None;
    let mut body_start = 0;

    for caps in ANNEX_MARKER_RE.captures_iter(text) {
        let Some(marker) = caps.get(0) else {
            continue;
        };
        if let Some(annex) = current.as_deref() {
            scan_annex_body(ctx, annex, &text[body_start..marker.start()]);
        }
        current = Some(format!("A.{}.{}", &caps[1], &caps[2]));
        body_start = marker.end();
    }

    if let Some(annex) = current.as_deref() {
        scan_annex_body(ctx, annex, &text[body_start..]);
    }
}

/// Line-oriented re-scan for requirements that wrapped outside clean section
/// boundaries. A line-start marker moves the cursor; every other line is
/// attributed to the current cursor.
fn annex_line_pass(ctx: &mut ExtractionContext, text: &str) {
    let mut current: Option<String> = None;

    for line in text.lines() {
        if let Some(caps) = ANNEX_LINE_RE.captures(line) {
            let annex = format!("A.{}.{}", &caps[1], &caps[2]);
            for requirement in grammar::requirement_ids(&caps[3]) {
                add_requirement(ctx, &requirement.id, &annex);
            }
            current = Some(annex);
        } else if let Some(annex) = current.as_deref() {
            for requirement in grammar::requirement_ids(line) {
                add_requirement(ctx, &requirement.id, annex);
            }
        }
    }
}
