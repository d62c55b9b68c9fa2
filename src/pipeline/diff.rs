//! Change detection between consecutive snapshots.
//!
//! Cases are checked in order and the first match decides:
//!
//! 1. both snapshots empty: nothing
//! 2. previous empty: one `InitialLoad`
//! 3. new empty: one `DataLost`
//! 4. equal fingerprints: nothing
//! 5. field-level diff keyed by player name
//!
//! The field-level diff emits all `NewPlayer` events (new-list order), then
//! result and board changes (previous-list order), then at most one trailing
//! `PlayerCountChanged`.

use std::collections::{HashMap, HashSet};

use crate::models::{ChangeEvent, Record, Snapshot};

/// Stateless comparison of two snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector;

impl ChangeDetector {
    pub fn new() -> Self {
        Self
    }

    /// Compute the ordered change events from `previous` to `current`.
    pub fn diff(&self, previous: &Snapshot, current: &Snapshot) -> Vec<ChangeEvent> {
        match (previous.is_empty(), current.is_empty()) {
            (true, true) => return Vec::new(),
            (true, false) => {
                return vec![ChangeEvent::InitialLoad {
                    records: current.records().to_vec(),
                }];
            }
            (false, true) => {
                return vec![ChangeEvent::DataLost {
                    records: previous.records().to_vec(),
                }];
            }
            (false, false) => {}
        }

        if previous.fingerprint() == current.fingerprint() {
            return Vec::new();
        }

        self.field_diff(previous.records(), current.records())
    }

    fn field_diff(&self, previous: &[Record], current: &[Record]) -> Vec<ChangeEvent> {
        // Later duplicates overwrite earlier ones.
        let prev_map: HashMap<&str, &Record> = previous.iter().map(|r| (r.name(), r)).collect();
        let curr_map: HashMap<&str, &Record> = current.iter().map(|r| (r.name(), r)).collect();

        let mut events = Vec::new();

        let mut seen = HashSet::new();
        for record in current {
            let name = record.name();
            if prev_map.contains_key(name) || !seen.insert(name) {
                continue;
            }
            events.push(ChangeEvent::NewPlayer {
                record: curr_map[name].clone(),
            });
        }

        let mut seen = HashSet::new();
        for record in previous {
            let name = record.name();
            if !seen.insert(name) {
                continue;
            }
            let (Some(old), Some(new)) = (prev_map.get(name), curr_map.get(name)) else {
                continue;
            };

            if old.outcome != new.outcome {
                events.push(ChangeEvent::ResultChanged {
                    name: name.to_string(),
                    old: old.outcome.clone(),
                    new: new.outcome.clone(),
                });
            }
            if old.board != new.board {
                events.push(ChangeEvent::BoardChanged {
                    name: name.to_string(),
                    old: old.board.clone(),
                    new: new.board.clone(),
                });
            }
        }

        if previous.len() != current.len() {
            events.push(ChangeEvent::PlayerCountChanged {
                old: previous.len(),
                new: current.len(),
            });
        }

        events
    }
}

/// Convenience function to diff two snapshots.
pub fn diff(previous: &Snapshot, current: &Snapshot) -> Vec<ChangeEvent> {
    ChangeDetector::new().diff(previous, current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(name: &str, board: &str, outcome: &str) -> Record {
        Record::new(name)
            .unwrap()
            .with_board(board)
            .with_outcome(outcome)
    }

    fn snap(records: Vec<Record>) -> Snapshot {
        Snapshot::new("Test", records)
    }

    #[test]
    fn test_both_empty() {
        assert!(diff(&snap(vec![]), &snap(vec![])).is_empty());
    }

    #[test]
    fn test_initial_load() {
        let new = snap(vec![
            Record::new("X")
                .unwrap()
                .with_board("6")
                .with_score(6.0)
                .with_outcome("0"),
        ]);

        let events = diff(&snap(vec![]), &new);
        assert_eq!(events.len(), 1);
        match &events[0] {
            ChangeEvent::InitialLoad { records } => assert_eq!(records.len(), 1),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_data_lost() {
        let old = snap(vec![player("X", "1", "0"), player("Y", "2", "1")]);
        let events = diff(&old, &snap(vec![]));
        assert_eq!(
            events,
            vec![ChangeEvent::DataLost {
                records: old.records().to_vec()
            }]
        );
    }

    #[test]
    fn test_same_fingerprint_no_changes() {
        let old = snap(vec![player("X", "1", "0")]);
        let new = snap(vec![player("X", "1", "0")]);
        assert!(diff(&old, &new).is_empty());
    }

    #[test]
    fn test_result_changed_only() {
        let old = snap(vec![Record::new("X").unwrap().with_outcome("0")]);
        let new = snap(vec![Record::new("X").unwrap().with_outcome("1")]);

        assert_eq!(
            diff(&old, &new),
            vec![ChangeEvent::ResultChanged {
                name: "X".into(),
                old: Some("0".into()),
                new: Some("1".into()),
            }]
        );
    }

    #[test]
    fn test_score_only_change_emits_nothing_field_level() {
        // Fingerprints differ, but score has no event of its own.
        let old = snap(vec![Record::new("X").unwrap().with_score(1.0)]);
        let new = snap(vec![Record::new("X").unwrap().with_score(2.0)]);
        assert_ne!(old.fingerprint(), new.fingerprint());
        assert!(diff(&old, &new).is_empty());
    }

    #[test]
    fn test_new_player_then_count() {
        let old_records: Vec<Record> = (1..=9)
            .map(|i| player(&format!("P{i}"), &i.to_string(), "½"))
            .collect();
        let mut new_records = old_records.clone();
        new_records.push(player("P10", "10", "½"));

        let events = diff(&snap(old_records), &snap(new_records));
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], ChangeEvent::NewPlayer { record } if record.name() == "P10"));
        assert_eq!(events[1], ChangeEvent::PlayerCountChanged { old: 9, new: 10 });
    }

    #[test]
    fn test_emission_order() {
        let old = snap(vec![
            player("A", "1", "1"),
            player("B", "2", "0"),
            player("C", "3", "½"),
        ]);
        let new = snap(vec![
            player("D", "1", "0"),
            player("C", "2", "1"),
            player("A", "3", "1"),
            player("E", "4", "1"),
        ]);

        let kinds: Vec<String> = diff(&old, &new)
            .iter()
            .map(|e| match e {
                ChangeEvent::NewPlayer { record } => format!("new:{}", record.name()),
                ChangeEvent::ResultChanged { name, .. } => format!("result:{name}"),
                ChangeEvent::BoardChanged { name, .. } => format!("board:{name}"),
                ChangeEvent::PlayerCountChanged { old, new } => format!("count:{old}->{new}"),
                other => other.kind().to_string(),
            })
            .collect();

        assert_eq!(
            kinds,
            ["new:D", "new:E", "board:A", "result:C", "board:C", "count:3->4"]
        );
    }

    #[test]
    fn test_removed_player_only_changes_count() {
        let old = snap(vec![player("A", "1", "1"), player("B", "2", "0")]);
        let new = snap(vec![player("A", "1", "1")]);
        assert_eq!(
            diff(&old, &new),
            vec![ChangeEvent::PlayerCountChanged { old: 2, new: 1 }]
        );
    }

    #[test]
    fn test_duplicate_names_last_wins() {
        let old = snap(vec![player("X", "1", "0"), player("X", "5", "1")]);
        let new = snap(vec![player("X", "5", "1"), player("X", "7", "1")]);

        // Compares the last X of each side: board 5 -> 7, result unchanged.
        assert_eq!(
            diff(&old, &new),
            vec![ChangeEvent::BoardChanged {
                name: "X".into(),
                old: Some("5".into()),
                new: Some("7".into()),
            }]
        );
    }

    #[test]
    fn test_reordering_without_field_changes() {
        let old = snap(vec![player("A", "1", "1"), player("B", "1", "0")]);
        let new = snap(vec![player("B", "1", "0"), player("A", "1", "1")]);

        assert_ne!(old.fingerprint(), new.fingerprint());
        assert!(diff(&old, &new).is_empty());
    }
}
