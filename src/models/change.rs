//! Typed differences between two snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Record;

/// One structured difference between a previous and a new snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// First data after an empty snapshot
    InitialLoad { records: Vec<Record> },

    /// The table vanished; usually an upstream fetch or parse failure
    DataLost { records: Vec<Record> },

    NewPlayer { record: Record },

    ResultChanged {
        name: String,
        old: Option<String>,
        new: Option<String>,
    },

    BoardChanged {
        name: String,
        old: Option<String>,
        new: Option<String>,
    },

    PlayerCountChanged { old: usize, new: usize },
}

impl ChangeEvent {
    /// Stable short label, matching the serialized `kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::InitialLoad { .. } => "initial_load",
            ChangeEvent::DataLost { .. } => "data_lost",
            ChangeEvent::NewPlayer { .. } => "new_player",
            ChangeEvent::ResultChanged { .. } => "result_changed",
            ChangeEvent::BoardChanged { .. } => "board_changed",
            ChangeEvent::PlayerCountChanged { .. } => "player_count_changed",
        }
    }
}

fn or_dash(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeEvent::InitialLoad { records } => {
                write!(f, "Initial load: {} players", records.len())
            }
            ChangeEvent::DataLost { records } => {
                write!(f, "Data lost: {} players no longer visible", records.len())
            }
            ChangeEvent::NewPlayer { record } => match &record.board {
                Some(board) => write!(f, "New player: {} (board {})", record.name(), board),
                None => write!(f, "New player: {}", record.name()),
            },
            ChangeEvent::ResultChanged { name, old, new } => {
                write!(f, "Result changed: {}: {} -> {}", name, or_dash(old), or_dash(new))
            }
            ChangeEvent::BoardChanged { name, old, new } => {
                write!(f, "Board changed: {}: {} -> {}", name, or_dash(old), or_dash(new))
            }
            ChangeEvent::PlayerCountChanged { old, new } => {
                write!(f, "Player count changed: {} -> {}", old, new)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let event = ChangeEvent::ResultChanged {
            name: "X".into(),
            old: Some("0".into()),
            new: None,
        };
        assert_eq!(event.to_string(), "Result changed: X: 0 -> -");

        let event = ChangeEvent::PlayerCountChanged { old: 9, new: 10 };
        assert_eq!(event.to_string(), "Player count changed: 9 -> 10");
    }

    #[test]
    fn test_serialized_kind_matches_label() {
        let event = ChangeEvent::NewPlayer {
            record: Record::new("X").unwrap().with_board("3"),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["kind"], event.kind());
        assert_eq!(value["record"]["name"], "X");
    }
}
