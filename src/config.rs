// src/config.rs
use std::str::FromStr;

pub const DEFAULT_RAW_TEXT_LIMIT: usize = 10_000;
pub const DEFAULT_HEADER_SCAN_ROWS: usize = 5;
pub const DEFAULT_MIN_HEADER_SCORE: usize = 2;
pub const DEFAULT_MIN_SHEET_ROWS: usize = 3;

/// Tunables shared by all extraction strategies.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractConfig {
    /// Maximum characters of diagnostic text kept in a result.
    pub raw_text_limit: usize,
    /// Rows inspected when looking for a spreadsheet header.
    pub header_scan_rows: usize,
    /// Keyword hits a header row needs before the sheet is processed.
    pub min_header_score: usize,
    /// Sheets shorter than this are skipped.
    pub min_sheet_rows: usize,
    /// Case-insensitive sheet name fragments preferred over other sheets.
    pub sheet_hints: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            raw_text_limit: DEFAULT_RAW_TEXT_LIMIT,
            header_scan_rows: DEFAULT_HEADER_SCAN_ROWS,
            min_header_score: DEFAULT_MIN_HEADER_SCORE,
            min_sheet_rows: DEFAULT_MIN_SHEET_ROWS,
            sheet_hints: vec!["map".to_string(), "reference".to_string()],
        }
    }
}

impl ExtractConfig {
    /// Defaults, overridden by `RAW_TEXT_LIMIT`, `HEADER_SCAN_ROWS`,
    /// `MIN_HEADER_SCORE` and `MIN_SHEET_ROWS` when set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            raw_text_limit: parse_or(&lookup, "RAW_TEXT_LIMIT", defaults.raw_text_limit),
            header_scan_rows: parse_or(&lookup, "HEADER_SCAN_ROWS", defaults.header_scan_rows),
            min_header_score: parse_or(&lookup, "MIN_HEADER_SCORE", defaults.min_header_score),
            min_sheet_rows: parse_or(&lookup, "MIN_SHEET_ROWS", defaults.min_sheet_rows),
            sheet_hints: defaults.sheet_hints,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display + Copy,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => {
                tracing::debug!("Using {} = {} from environment", key, value);
                value
            }
            Err(_) => {
                tracing::warn!("Ignoring invalid {}='{}', using {}", key, raw, default);
                default
            }
        },
        None => default,
    }
}
