//! End-to-end checks through the public API: page in, events out.

use std::sync::Arc;

use scraper::Html;
use standings_crawler::models::{ChangeEvent, Config, ExtractionConfig, Record, Snapshot};
use standings_crawler::pipeline::{ChangeDetector, diff};
use standings_crawler::services::{StandingsExtractor, TableLocator};
use standings_crawler::storage::{LocalStorage, SnapshotStorage, load_or_empty};

const HEADER: &str =
    "<tr><th>Rd.</th><th>Bo.</th><th>Name</th><th>Club/City</th><th>Pts.</th><th>Res.</th></tr>";

fn row(round: u32, board: u32, name: &str, points: &str, result: &str) -> String {
    format!(
        "<tr><td>{round}</td><td>{board}</td><td>{name}</td><td>Riga</td><td>{points}</td><td>{result}</td></tr>"
    )
}

fn page(title: &str, rows: &[String]) -> String {
    format!(
        "<html><head><title>{title}</title></head><body><table>{HEADER}{}</table></body></html>",
        rows.concat()
    )
}

fn extractor() -> StandingsExtractor {
    StandingsExtractor::new(&ExtractionConfig::default(), "Fallback").unwrap()
}

fn record(name: &str) -> Record {
    Record::new(name).unwrap()
}

#[test]
fn initial_load_from_empty() {
    let previous = Snapshot::empty("Open");
    let current = Snapshot::new(
        "Open",
        vec![
            record("X")
                .with_board("6")
                .with_score(6.0)
                .with_outcome("0"),
        ],
    );

    let events = diff(&previous, &current);
    assert_eq!(events.len(), 1);
    let ChangeEvent::InitialLoad { records } = &events[0] else {
        panic!("expected initial load, got {events:?}");
    };
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].board.as_deref(), Some("6"));
}

#[test]
fn single_result_change() {
    let previous = Snapshot::new("Open", vec![record("X").with_outcome("0")]);
    let current = Snapshot::new("Open", vec![record("X").with_outcome("1")]);

    assert_eq!(
        ChangeDetector::new().diff(&previous, &current),
        vec![ChangeEvent::ResultChanged {
            name: "X".into(),
            old: Some("0".into()),
            new: Some("1".into()),
        }]
    );
}

#[test]
fn metadata_row_is_skipped() {
    let mut rows: Vec<String> = (1..=9)
        .map(|i| row(3, i, &format!("Player {i}"), "2", "½"))
        .collect();
    rows[2] = "<tr><td colspan=\"4\">Round 3 on 2026-05-02</td><td>14:00</td></tr>".to_string();

    let snapshot = extractor().extract(&page("Open", &rows));

    assert_eq!(snapshot.len(), 8);
    assert!(snapshot.records().iter().all(|r| r.name() != "Player 3"));
    assert_eq!(snapshot.records()[2].name(), "Player 4");
}

#[test]
fn standings_table_found_at_any_position() {
    let standings = format!("<table>{HEADER}{}</table>", row(1, 1, "Alpha", "1", "1"));
    let nav = "<table><tr><th>Home</th><th>Tournaments</th><th>Search</th><th>Help</th></tr></table>";
    let info = "<table><tr><th>Organizer</th><th>Federation</th><th>Director</th><th>Arbiter</th></tr>\
                <tr><td>Club</td><td>LAT</td><td>A</td><td>B</td></tr></table>";
    let locator = TableLocator::new(&ExtractionConfig::default()).unwrap();

    let layouts = [
        [standings.as_str(), nav, info],
        [nav, standings.as_str(), info],
        [nav, info, standings.as_str()],
    ];
    for (position, tables) in layouts.iter().enumerate() {
        let html = format!("<html><body>{}</body></html>", tables.concat());
        let table = locator.locate(&Html::parse_document(&html)).unwrap();
        assert_eq!(table.index, position);
        assert_eq!(table.headers[2], "Name");
        assert_eq!(table.rows.len(), 1);
    }
}

#[test]
fn added_player_reports_new_player_then_count() {
    let mut rows: Vec<String> = (1..=9)
        .map(|i| row(4, i, &format!("Player {i}"), "3", ""))
        .collect();
    let previous = extractor().extract(&page("Open", &rows));
    rows.push(row(4, 10, "Late Entry", "0", ""));
    let current = extractor().extract(&page("Open", &rows));

    let events = diff(&previous, &current);
    assert_eq!(events.len(), 2, "{events:?}");
    assert!(matches!(&events[0], ChangeEvent::NewPlayer { record } if record.name() == "Late Entry"));
    assert_eq!(events[1], ChangeEvent::PlayerCountChanged { old: 9, new: 10 });
}

#[test]
fn extraction_is_deterministic() {
    let rows: Vec<String> = (1..=4)
        .map(|i| row(2, i, &format!("P{i}"), "1,5", "- 0"))
        .collect();
    let html = page("Open", &rows);

    let first = extractor().extract(&html);
    let second = extractor().extract(&html);
    assert_eq!(first.records(), second.records());
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert!(diff(&first, &second).is_empty());
    assert_eq!(first.records()[0].score, Some(1.5));
    assert_eq!(first.records()[0].outcome.as_deref(), Some("0"));
}

#[tokio::test]
async fn stored_snapshot_survives_restart() {
    let tmp = tempfile::TempDir::new().unwrap();
    let config = Config::default();
    let rows = vec![row(1, 1, "Alpha", "1", "1"), row(1, 1, "Beta", "0", "0")];
    let snapshot = extractor().extract(&page("Open", &rows));

    let storage = LocalStorage::new(tmp.path(), &config.source.name);
    storage.save(&snapshot).await.unwrap();

    let restarted: Arc<dyn SnapshotStorage> =
        Arc::new(LocalStorage::new(tmp.path(), &config.source.name));
    let loaded = load_or_empty(restarted.as_ref(), &config.source.name).await;
    assert_eq!(loaded.fingerprint(), snapshot.fingerprint());
    assert!(diff(&loaded, &snapshot).is_empty());
}
