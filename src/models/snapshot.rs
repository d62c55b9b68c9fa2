//! Immutable standings snapshot and its content fingerprint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::Record;

// Field and record separators for the fingerprint input.
const FIELD_SEP: u8 = 0x1f;
const RECORD_SEP: u8 = 0x1e;

/// Captured state of the standings table at one point in time.
///
/// Fields are only readable; the fingerprint is always computed from the
/// records, including when loading from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SnapshotData")]
pub struct Snapshot {
    source_name: String,
    captured_at: DateTime<Utc>,
    records: Vec<Record>,
    fingerprint: String,
}

impl Snapshot {
    /// Build a snapshot captured now.
    pub fn new(source_name: impl Into<String>, records: Vec<Record>) -> Self {
        Self::with_capture_time(source_name, Utc::now(), records)
    }

    /// Build a snapshot with an explicit capture time.
    pub fn with_capture_time(
        source_name: impl Into<String>,
        captured_at: DateTime<Utc>,
        records: Vec<Record>,
    ) -> Self {
        let fingerprint = fingerprint(&records);
        Self {
            source_name: source_name.into(),
            captured_at,
            records,
            fingerprint,
        }
    }

    /// A snapshot without records.
    pub fn empty(source_name: impl Into<String>) -> Self {
        Self::new(source_name, Vec::new())
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Short fingerprint prefix for log lines.
    pub fn short_fingerprint(&self) -> &str {
        &self.fingerprint[..self.fingerprint.len().min(12)]
    }
}

/// Hash the ordered (board, name, affiliation, score, outcome) tuples.
///
/// A missing value and an empty string hash differently.
pub fn fingerprint(records: &[Record]) -> String {
    let mut hasher = Sha256::new();

    for record in records {
        hash_opt(&mut hasher, record.board.as_deref());
        hash_field(&mut hasher, Some(record.name().as_bytes()));
        hash_opt(&mut hasher, record.affiliation.as_deref());
        let score = record.score.map(|s| s.to_bits().to_be_bytes());
        hash_field(&mut hasher, score.as_ref().map(|b| b.as_slice()));
        hash_opt(&mut hasher, record.outcome.as_deref());
        hasher.update([RECORD_SEP]);
    }

    hex::encode(hasher.finalize())
}

fn hash_opt(hasher: &mut Sha256, value: Option<&str>) {
    hash_field(hasher, value.map(str::as_bytes));
}

fn hash_field(hasher: &mut Sha256, value: Option<&[u8]>) {
    match value {
        Some(bytes) => {
            hasher.update([1u8]);
            hasher.update((bytes.len() as u64).to_be_bytes());
            hasher.update(bytes);
        }
        None => hasher.update([0u8]),
    }
    hasher.update([FIELD_SEP]);
}

/// Persisted shape; the stored fingerprint is advisory.
#[derive(Deserialize)]
struct SnapshotData {
    #[serde(default)]
    source_name: String,
    captured_at: DateTime<Utc>,
    #[serde(default)]
    records: Vec<Record>,
    #[serde(default)]
    fingerprint: Option<String>,
}

impl From<SnapshotData> for Snapshot {
    fn from(data: SnapshotData) -> Self {
        let snapshot =
            Snapshot::with_capture_time(data.source_name, data.captured_at, data.records);
        if let Some(stored) = data.fingerprint {
            if stored != snapshot.fingerprint {
                log::warn!(
                    "Stored fingerprint {} does not match records; using {}",
                    stored,
                    snapshot.fingerprint
                );
            }
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Record> {
        vec![
            Record::new("Alpha")
                .unwrap()
                .with_board("1")
                .with_score(3.5)
                .with_outcome("1"),
            Record::new("Beta")
                .unwrap()
                .with_board("2")
                .with_affiliation("Riga")
                .with_outcome("0"),
        ]
    }

    #[test]
    fn test_identical_records_same_fingerprint() {
        let a = Snapshot::new("Open", sample());
        let b = Snapshot::new("Other name", sample());
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_any_field_change_alters_fingerprint() {
        let base = Snapshot::new("Open", sample()).fingerprint().to_string();

        let edits: [fn(&mut Record); 4] = [
            |r| r.board = Some("9".into()),
            |r| r.affiliation = Some("Oslo".into()),
            |r| r.score = Some(4.0),
            |r| r.outcome = Some("½".into()),
        ];

        for edit in edits {
            let mut records = sample();
            edit(&mut records[0]);
            assert_ne!(Snapshot::new("Open", records).fingerprint(), base);
        }

        let mut renamed = sample();
        renamed[1] = Record::new("Gamma")
            .unwrap()
            .with_board("2")
            .with_affiliation("Riga")
            .with_outcome("0");
        assert_ne!(Snapshot::new("Open", renamed).fingerprint(), base);
    }

    #[test]
    fn test_fingerprint_is_order_sensitive() {
        let mut reversed = sample();
        reversed.reverse();
        assert_ne!(fingerprint(&sample()), fingerprint(&reversed));
    }

    #[test]
    fn test_missing_differs_from_empty() {
        let none = vec![Record::new("A").unwrap()];
        let empty = vec![Record::new("A").unwrap().with_board("")];
        assert_ne!(fingerprint(&none), fingerprint(&empty));
    }

    #[test]
    fn test_fields_do_not_bleed_into_each_other() {
        let a = vec![Record::new("A").unwrap().with_board("1").with_affiliation("23")];
        let b = vec![Record::new("A").unwrap().with_board("12").with_affiliation("3")];
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_round_trip_recomputes_fingerprint() {
        let snapshot = Snapshot::new("Open", sample());
        let mut value = serde_json::to_value(&snapshot).unwrap();
        value["fingerprint"] = serde_json::Value::String("stale".into());

        let loaded: Snapshot = serde_json::from_value(value).unwrap();
        assert_eq!(loaded.fingerprint(), snapshot.fingerprint());
        assert_eq!(loaded.records(), snapshot.records());
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = Snapshot::empty("Open");
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.len(), 0);
        assert_eq!(snapshot.short_fingerprint().len(), 12);
    }
}
