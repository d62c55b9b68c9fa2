//! Standings table detection.
//!
//! A page usually carries several tables (navigation, tournament details,
//! crosstables). The standings table is the first one whose header row names
//! a round, a board, a player and a points column.

use scraper::{ElementRef, Html, Selector};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{AppError, Result};
use crate::models::ExtractionConfig;
use crate::services::columns::any_header_matches;
use crate::utils::normalize_whitespace;

/// Token groups a standings header row must all hit.
const REQUIRED_GROUPS: [(&str, &[&str]); 4] = [
    ("round", &["rd", "round"]),
    ("board", &["bo", "board"]),
    ("name", &["name", "player"]),
    ("points", &["pts", "points", "score"]),
];

/// A table reduced to cell texts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Position of the table among all tables in the document
    pub index: usize,
    pub headers: Vec<String>,
    /// Data rows, header row excluded
    pub rows: Vec<Vec<String>>,
}

/// Picks the standings table out of a parsed document.
pub struct TableLocator {
    min_headers: usize,
    max_header_chars: usize,
    table_sel: Selector,
    row_sel: Selector,
}

impl TableLocator {
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        Ok(Self {
            min_headers: config.min_headers,
            max_header_chars: config.max_header_chars,
            table_sel: parse_selector("table")?,
            row_sel: parse_selector("tr")?,
        })
    }

    /// Return the first qualifying table in document order.
    pub fn locate(&self, document: &Html) -> Result<RawTable> {
        let mut seen = 0;

        for (index, table) in document.select(&self.table_sel).enumerate() {
            seen += 1;
            let rows = self.table_rows(table);
            let Some((headers, data)) = rows.split_first() else {
                log::debug!("Table {} has no rows", index);
                continue;
            };

            if !self.qualifies(index, headers) {
                continue;
            }

            log::debug!(
                "Table {} selected as standings ({} headers, {} rows)",
                index,
                headers.len(),
                data.len()
            );
            return Ok(RawTable {
                index,
                headers: headers.clone(),
                rows: data.to_vec(),
            });
        }

        Err(AppError::MissingTable(format!(
            "none of {seen} tables has round, board, name and points headers"
        )))
    }

    /// Whether a header row looks like standings column titles.
    pub fn qualifies(&self, index: usize, headers: &[String]) -> bool {
        if headers.is_empty() {
            log::debug!("Table {} skipped: empty header row", index);
            return false;
        }
        if headers.len() < self.min_headers {
            log::debug!(
                "Table {} skipped: {} headers < {}",
                index,
                headers.len(),
                self.min_headers
            );
            return false;
        }
        if let Some(long) = headers
            .iter()
            .find(|h| h.graphemes(true).count() > self.max_header_chars)
        {
            log::debug!("Table {} skipped: metadata-like header '{}'", index, long);
            return false;
        }

        match REQUIRED_GROUPS
            .iter()
            .find(|(_, tokens)| !any_header_matches(headers, tokens))
        {
            Some((group, _)) => {
                log::debug!("Table {} skipped: no {}-like header", index, group);
                false
            }
            None => true,
        }
    }

    /// Rows that belong to this table, not to tables nested inside it.
    fn table_rows(&self, table: ElementRef<'_>) -> Vec<Vec<String>> {
        table
            .select(&self.row_sel)
            .filter(|row| nearest_table(*row).map(|t| t.id()) == Some(table.id()))
            .map(row_cells)
            .collect()
    }
}

fn nearest_table(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "table")
}

/// Text of the direct `td`/`th` children of a row.
fn row_cells(row: ElementRef<'_>) -> Vec<String> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
        .map(|cell| normalize_whitespace(&cell.text().collect::<String>()))
        .collect()
}

/// Source name from the first non-empty h1, h2 or title element.
pub fn document_title(document: &Html) -> Option<String> {
    ["h1", "h2", "title"].iter().find_map(|tag| {
        let sel = Selector::parse(tag).ok()?;
        document
            .select(&sel)
            .map(|e| normalize_whitespace(&e.text().collect::<String>()))
            .find(|text| !text.is_empty())
    })
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
