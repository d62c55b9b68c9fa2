//! Tolerant row parsing.
//!
//! Turns the data rows of the standings table into [`Record`]s. Rows that do
//! not look like player rows are skipped quietly; rows that fail to parse are
//! logged and skipped. One bad row never aborts the batch.

use crate::error::{AppError, Result};
use crate::models::{CanonicalField, ExtractionConfig, Record};
use crate::services::columns::ColumnMapping;

/// Narrowest row still treated as a player row.
const MIN_ROW_CELLS: usize = 3;

/// Slack around the header width for plausible row widths.
const ROW_WIDTH_SLACK: usize = 2;

/// Inclusive cell-count range for player rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBounds {
    pub min: usize,
    pub max: usize,
}

impl RowBounds {
    /// Bounds derived from the header width.
    pub fn from_header_count(headers: usize) -> Self {
        let min = headers.saturating_sub(ROW_WIDTH_SLACK).max(MIN_ROW_CELLS);
        let max = (headers + ROW_WIDTH_SLACK).max(min);
        Self { min, max }
    }

    /// Apply the configured overrides, if any.
    pub fn with_overrides(self, config: &ExtractionConfig) -> Self {
        Self {
            min: config.min_cells.unwrap_or(self.min),
            max: config.max_cells.unwrap_or(self.max),
        }
    }

    pub fn contains(&self, cells: usize) -> bool {
        (self.min..=self.max).contains(&cells)
    }
}

/// Parse a points cell. Accepts either decimal separator and a trailing "½".
///
/// Returns `None` for anything that is not a finite number.
pub fn parse_score(raw: &str) -> Option<f64> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    let (whole, half) = match text.strip_suffix('½') {
        Some(rest) => (rest.trim(), 0.5),
        None => (text, 0.0),
    };

    let value = if whole.is_empty() {
        if half > 0.0 { 0.0 } else { return None }
    } else {
        whole.replace(',', ".").parse::<f64>().ok()?
    };

    let score = value + half;
    score.is_finite().then_some(score)
}

/// Strip the leading "- " marker from a result cell.
///
/// A marker without a result (`"- "`, or `"-"` once the cell was trimmed)
/// means the game is pending.
pub fn normalize_result(raw: &str) -> Option<String> {
    let text = raw.trim_start();
    let text = match text.strip_prefix('-') {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest,
        _ => text,
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Converts table rows into records using a column mapping.
#[derive(Debug, Clone)]
pub struct RowParser {
    mapping: ColumnMapping,
    bounds: RowBounds,
    validate_round: bool,
}

impl RowParser {
    pub fn new(mapping: ColumnMapping, bounds: RowBounds) -> Self {
        Self {
            mapping,
            bounds,
            validate_round: false,
        }
    }

    /// Require a round number in each row: the mapped Round cell, or the
    /// first non-empty cell when no Round column is mapped.
    pub fn with_round_validation(mut self, enabled: bool) -> Self {
        self.validate_round = enabled;
        self
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    /// Parse all rows, keeping source order and skipping the unusable ones.
    pub fn parse_rows(&self, rows: &[Vec<String>]) -> Vec<Record> {
        let mut records = Vec::with_capacity(rows.len());
        let mut failures = 0;

        for (index, cells) in rows.iter().enumerate() {
            match self.parse_row(index, cells) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => {
                    failures += 1;
                    log::warn!("Skipping row {}: {}", index, e);
                }
            }
        }

        if failures > 0 {
            log::warn!(
                "Parsed {} records, {} rows failed to parse",
                records.len(),
                failures
            );
        }
        records
    }

    /// Parse one row.
    ///
    /// `Ok(None)` means the row is not a player row. `Err` means it looked
    /// like one but could not be read.
    pub fn parse_row(&self, index: usize, cells: &[String]) -> Result<Option<Record>> {
        if cells.is_empty() {
            return Ok(None);
        }

        if !self.bounds.contains(cells.len()) {
            log::debug!(
                "Row {} skipped: {} cells outside {}..={}",
                index,
                cells.len(),
                self.bounds.min,
                self.bounds.max
            );
            return Ok(None);
        }

        if self.validate_round && !self.has_round(cells) {
            log::debug!("Row {} skipped: no round number", index);
            return Ok(None);
        }

        let cell = |field| self.cell(index, cells, field);

        let Some(name) = cell(CanonicalField::Name)? else {
            log::debug!("Row {} skipped: no name", index);
            return Ok(None);
        };
        let mut record = Record::new(name)?;

        record.board = cell(CanonicalField::Board)?.map(str::to_string);
        record.round_index = cell(CanonicalField::Round)?.and_then(|s| s.parse().ok());
        record.starting_number = cell(CanonicalField::StartingNumber)?.map(str::to_string);
        record.rating = cell(CanonicalField::Rating)?.and_then(|s| s.parse().ok());
        record.federation = cell(CanonicalField::Federation)?.map(str::to_string);
        record.affiliation = cell(CanonicalField::ClubCity)?
            .map(str::to_string)
            .or_else(|| record.federation.clone());
        record.score = cell(CanonicalField::Points)?.and_then(parse_score);
        record.outcome = cell(CanonicalField::Result)?.and_then(normalize_result);

        Ok(Some(record))
    }

    fn has_round(&self, cells: &[String]) -> bool {
        match self.mapping.get(CanonicalField::Round) {
            Some(column) => cells.get(column).is_some_and(|c| is_round_number(c)),
            None => cells
                .iter()
                .find(|c| !c.trim().is_empty())
                .is_some_and(|c| is_round_number(c)),
        }
    }

    /// Trimmed text of the mapped cell; `None` when unmapped or blank.
    fn cell<'a>(
        &self,
        index: usize,
        cells: &'a [String],
        field: CanonicalField,
    ) -> Result<Option<&'a str>> {
        let Some(column) = self.mapping.get(field) else {
            return Ok(None);
        };
        let text = cells.get(column).ok_or_else(|| {
            AppError::row_parse(
                index,
                format!(
                    "column {} ({}) missing from {} cells",
                    column,
                    field,
                    cells.len()
                ),
            )
        })?;
        let text = text.trim();
        Ok((!text.is_empty()).then_some(text))
    }
}

fn is_round_number(cell: &str) -> bool {
    cell.trim().parse::<u32>().is_ok()
}
