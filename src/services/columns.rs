//! Header-to-field mapping.
//!
//! Maps the free-form header cells of a standings table onto canonical
//! fields using an ordered rule list. The first rule matching a header wins;
//! headers no rule matches are ignored.

use std::collections::BTreeMap;

use crate::models::CanonicalField;

/// Whether a header cell contains the given token.
///
/// Headers are lowercased and split into alphanumeric words. A token with a
/// space must appear as a phrase; a short token (up to three characters)
/// must equal a whole word, so "rd" matches "Rd." but not "Board"; a longer
/// token must prefix a word, so "result" matches "Results".
pub fn header_matches(header: &str, token: &str) -> bool {
    let lower = header.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let token = token.to_lowercase();

    if token.contains(' ') {
        words.join(" ").contains(&token)
    } else if token.chars().count() <= 3 {
        words.iter().any(|w| *w == token)
    } else {
        words.iter().any(|w| w.starts_with(&token))
    }
}

/// Whether any of the headers contains any of the tokens.
pub fn any_header_matches<S: AsRef<str>>(headers: &[S], tokens: &[&str]) -> bool {
    headers
        .iter()
        .any(|h| tokens.iter().any(|t| header_matches(h.as_ref(), t)))
}

/// A header rule: the canonical field and the tokens that select it.
#[derive(Debug, Clone)]
pub struct HeaderRule {
    pub field: CanonicalField,
    pub tokens: Vec<String>,
}

impl HeaderRule {
    pub fn new(field: CanonicalField, tokens: &[&str]) -> Self {
        Self {
            field,
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn matches(&self, header: &str) -> bool {
        self.tokens.iter().any(|t| header_matches(header, t))
    }
}

/// Default rule order for standings headers.
pub fn default_rules() -> Vec<HeaderRule> {
    use CanonicalField::*;

    vec![
        HeaderRule::new(Round, &["rd", "round"]),
        HeaderRule::new(Board, &["bo", "board"]),
        HeaderRule::new(StartingNumber, &["sno", "starting number", "no"]),
        HeaderRule::new(Name, &["name", "player"]),
        HeaderRule::new(Rating, &["rtg", "rating"]),
        HeaderRule::new(Federation, &["fed", "federation", "country"]),
        HeaderRule::new(ClubCity, &["club", "city"]),
        HeaderRule::new(Points, &["pts", "points", "score"]),
        HeaderRule::new(Result, &["res", "result"]),
    ]
}

/// Canonical field to column index association for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    columns: BTreeMap<CanonicalField, usize>,
}

impl ColumnMapping {
    pub fn get(&self, field: CanonicalField) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    pub fn contains(&self, field: CanonicalField) -> bool {
        self.columns.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, usize)> + '_ {
        self.columns.iter().map(|(f, i)| (*f, *i))
    }

    /// Record a column unless the field is already mapped.
    fn insert_first(&mut self, field: CanonicalField, index: usize) -> bool {
        if self.columns.contains_key(&field) {
            return false;
        }
        self.columns.insert(field, index);
        true
    }
}

impl FromIterator<(CanonicalField, usize)> for ColumnMapping {
    fn from_iter<I: IntoIterator<Item = (CanonicalField, usize)>>(iter: I) -> Self {
        let mut mapping = ColumnMapping::default();
        for (field, index) in iter {
            mapping.insert_first(field, index);
        }
        mapping
    }
}

/// Maps header rows to canonical fields.
pub struct ColumnMapper {
    rules: Vec<HeaderRule>,
}

impl ColumnMapper {
    /// Create a mapper with the given rule order.
    pub fn new(rules: Vec<HeaderRule>) -> Self {
        Self { rules }
    }

    /// Map each header to the first matching rule's field.
    ///
    /// When two headers resolve to the same field the leftmost column is
    /// kept.
    pub fn map<S: AsRef<str>>(&self, headers: &[S]) -> ColumnMapping {
        let mut mapping = ColumnMapping::default();

        for (index, header) in headers.iter().enumerate() {
            let header = header.as_ref();
            match self.rules.iter().find(|rule| rule.matches(header)) {
                Some(rule) => {
                    if !mapping.insert_first(rule.field, index) {
                        log::debug!(
                            "Header '{}' at column {} repeats field '{}'; keeping first",
                            header,
                            index,
                            rule.field
                        );
                    }
                }
                None => log::debug!("Header '{}' at column {} not mapped", header, index),
            }
        }

        mapping
    }
}

impl Default for ColumnMapper {
    fn default() -> Self {
        Self::new(default_rules())
    }
}
