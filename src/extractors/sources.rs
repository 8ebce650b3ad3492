// src/extractors/sources.rs
//! Capabilities the extractors read documents through.
//!
//! Both are best-effort: a document that cannot be opened at all is an
//! error, but a page without text or a sheet that cannot be read is reported
//! as empty and left to the extractor to skip.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets};
use lopdf::Document;

use crate::utils::error::ExtractError;

/// Yields the plain text of every page, in page order.
pub trait PageTextSource {
    /// `None` marks a page that produced no text.
    fn page_texts(&self, content: &[u8]) -> Result<Vec<Option<String>>, ExtractError>;
}

/// Page text through `lopdf`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfPageSource;

impl PageTextSource for LopdfPageSource {
    fn page_texts(&self, content: &[u8]) -> Result<Vec<Option<String>>, ExtractError> {
        let document = Document::load_mem(content)?;
        let pages = document.get_pages();
        tracing::debug!("Loaded PDF with {} pages", pages.len());

        let texts = pages
            .keys()
            .map(|&page_num| match document.extract_text(&[page_num]) {
                Ok(text) if !text.trim().is_empty() => Some(text),
                Ok(_) => {
                    tracing::debug!("Page {} has no extractable text", page_num);
                    None
                }
                Err(e) => {
                    tracing::warn!("Could not extract text from page {}: {}", page_num, e);
                    None
                }
            })
            .collect();
        Ok(texts)
    }
}

/// A single sheet as trimmed cell strings; empty cells are "".
pub type SheetRows = Vec<Vec<String>>;

/// A multi-sheet spreadsheet.
pub trait Workbook {
    fn sheet_names(&self) -> Vec<String>;
    fn sheet_rows(&mut self, name: &str) -> Result<SheetRows, ExtractError>;
}

/// XLSX/XLS/ODS workbooks through `calamine`.
pub struct CalamineWorkbook {
    sheets: Sheets<Cursor<Vec<u8>>>,
}

impl CalamineWorkbook {
    pub fn open(content: &[u8]) -> Result<Self, ExtractError> {
        let sheets = open_workbook_auto_from_rs(Cursor::new(content.to_vec()))?;
        Ok(Self { sheets })
    }
}

impl Workbook for CalamineWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    fn sheet_rows(&mut self, name: &str) -> Result<SheetRows, ExtractError> {
        let range = self.sheets.worksheet_range(name)?;
        let rows = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect::<Vec<String>>());
        Ok(anchor_at_origin(range.start(), rows))
    }
}

/// `worksheet_range` starts at the first used cell. Pads the grid with empty
/// rows and leading cells so indices count from A1.
fn anchor_at_origin<I>(start: Option<(u32, u32)>, rows: I) -> SheetRows
where
    I: Iterator<Item = Vec<String>>,
{
    let (row_offset, col_offset) = start.map_or((0, 0), |(r, c)| (r as usize, c as usize));
    let mut grid: SheetRows = vec![Vec::new(); row_offset];
    grid.extend(rows.map(|row| {
        let mut cells = vec![String::new(); col_offset];
        cells.extend(row);
        cells
    }));
    grid
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// In-memory workbook for callers that already hold the grids.
#[derive(Debug, Default, Clone)]
pub struct GridWorkbook {
    sheets: Vec<(String, SheetRows)>,
}

impl GridWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet<R, C>(mut self, name: &str, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| {
                        let cell: String = cell.into();
                        cell.trim().to_string()
                    })
                    .collect()
            })
            .collect();
        self.sheets.push((name.to_string(), rows));
        self
    }
}

impl Workbook for GridWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn sheet_rows(&mut self, name: &str) -> Result<SheetRows, ExtractError> {
        self.sheets
            .iter()
            .find(|(sheet, _)| sheet == name)
            .map(|(_, rows)| rows.clone())
            .ok_or_else(|| ExtractError::Spreadsheet(format!("Worksheet not found: {}", name)))
    }
}
