//! Standings record and canonical field definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Semantic role a raw table header is mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Round,
    Board,
    StartingNumber,
    Name,
    Rating,
    Federation,
    ClubCity,
    Points,
    Result,
}

impl CanonicalField {
    /// Every canonical field, in header-rule order.
    pub const ALL: [CanonicalField; 9] = [
        CanonicalField::Round,
        CanonicalField::Board,
        CanonicalField::StartingNumber,
        CanonicalField::Name,
        CanonicalField::Rating,
        CanonicalField::Federation,
        CanonicalField::ClubCity,
        CanonicalField::Points,
        CanonicalField::Result,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Round => "round",
            CanonicalField::Board => "board",
            CanonicalField::StartingNumber => "starting_number",
            CanonicalField::Name => "name",
            CanonicalField::Rating => "rating",
            CanonicalField::Federation => "federation",
            CanonicalField::ClubCity => "club_city",
            CanonicalField::Points => "points",
            CanonicalField::Result => "result",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One competitor's row in the standings table.
///
/// `name` is the identity key used for diffing and can only be set through
/// [`Record::new`], which refuses blank names. Deserialization goes through
/// the same check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RecordData")]
pub struct Record {
    /// Board as printed in the source (kept verbatim, may be non-numeric)
    pub board: Option<String>,

    name: String,

    /// Club/city, or federation when the table has no club column
    pub affiliation: Option<String>,

    /// Points, parsed from either decimal separator
    pub score: Option<f64>,

    /// Result text with the leading "- " marker stripped
    pub outcome: Option<String>,

    pub round_index: Option<u32>,

    pub starting_number: Option<String>,

    pub rating: Option<u32>,

    pub federation: Option<String>,
}

impl Record {
    /// Create a record for the named competitor.
    ///
    /// The name is trimmed; a blank name is rejected.
    pub fn new(name: impl AsRef<str>) -> Result<Self, AppError> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(AppError::InvalidRecord("name is empty".into()));
        }

        Ok(Self {
            board: None,
            name: name.to_string(),
            affiliation: None,
            score: None,
            outcome: None,
            round_index: None,
            starting_number: None,
            rating: None,
            federation: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_board(mut self, board: impl Into<String>) -> Self {
        self.board = Some(board.into());
        self
    }

    pub fn with_affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.affiliation = Some(affiliation.into());
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcome = Some(outcome.into());
        self
    }

    pub fn with_round(mut self, round: u32) -> Self {
        self.round_index = Some(round);
        self
    }
}

/// Wire shape of a record, validated into [`Record`].
#[derive(Deserialize)]
struct RecordData {
    #[serde(default)]
    board: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    affiliation: Option<String>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    outcome: Option<String>,
    #[serde(default)]
    round_index: Option<u32>,
    #[serde(default)]
    starting_number: Option<String>,
    #[serde(default)]
    rating: Option<u32>,
    #[serde(default)]
    federation: Option<String>,
}

impl TryFrom<RecordData> for Record {
    type Error = AppError;

    fn try_from(data: RecordData) -> Result<Self, Self::Error> {
        let mut record = Record::new(&data.name)?;
        record.board = data.board;
        record.affiliation = data.affiliation;
        record.score = data.score;
        record.outcome = data.outcome;
        record.round_index = data.round_index;
        record.starting_number = data.starting_number;
        record.rating = data.rating;
        record.federation = data.federation;
        Ok(record)
    }
}
