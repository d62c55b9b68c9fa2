//! Extraction pipeline: document → table → column mapping → records.

use scraper::Html;

use crate::error::Result;
use crate::models::{CanonicalField, ExtractionConfig, Record, Snapshot};
use crate::services::columns::ColumnMapper;
use crate::services::rows::{RowBounds, RowParser};
use crate::services::table::{TableLocator, document_title};

/// Turns a raw standings document into a [`Snapshot`].
pub struct StandingsExtractor {
    locator: TableLocator,
    mapper: ColumnMapper,
    config: ExtractionConfig,
    fallback_name: String,
}

impl StandingsExtractor {
    /// Create an extractor; `fallback_name` names snapshots of untitled pages.
    pub fn new(config: &ExtractionConfig, fallback_name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            locator: TableLocator::new(config)?,
            mapper: ColumnMapper::default(),
            config: config.clone(),
            fallback_name: fallback_name.into(),
        })
    }

    /// Replace the header rules.
    pub fn with_mapper(mut self, mapper: ColumnMapper) -> Self {
        self.mapper = mapper;
        self
    }

    /// Extract a snapshot, never failing.
    ///
    /// A page without a standings table yields an empty snapshot that still
    /// carries the page's title.
    pub fn extract(&self, html: &str) -> Snapshot {
        let document = Html::parse_document(html);
        let source_name = document_title(&document).unwrap_or_else(|| self.fallback_name.clone());

        match self.extract_records(&document) {
            Ok(records) => {
                log::debug!("Extracted {} records for '{}'", records.len(), source_name);
                Snapshot::new(source_name, records)
            }
            Err(e) => {
                log::warn!("{}; using empty snapshot for '{}'", e, source_name);
                Snapshot::empty(source_name)
            }
        }
    }

    /// Locate the table and parse its rows.
    pub fn extract_records(&self, document: &Html) -> Result<Vec<Record>> {
        let table = self.locator.locate(document)?;
        let mapping = self.mapper.map(&table.headers);

        let bounds =
            RowBounds::from_header_count(table.headers.len()).with_overrides(&self.config);
        let validate_round =
            self.config.validate_round && mapping.contains(CanonicalField::Round);

        let parser = RowParser::new(mapping, bounds).with_round_validation(validate_round);
        Ok(parser.parse_rows(&table.rows))
    }
}
