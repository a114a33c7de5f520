mod common;

use common::{append_n, dummy_event, numbered_event, object, seqs, temp_store};
use episodelog::{EpisodeStore, Event, EventKind, StoreError};
use serde_json::json;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_open_creates_parent_directory() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a").join("b").join("episodes.jsonl");

    let store = EpisodeStore::open(&path).unwrap();

    assert!(path.parent().unwrap().is_dir(), "parent should be created");
    assert!(!path.exists(), "log file is created by the first append");
    assert_eq!(store.path(), path);

    // Idempotent
    EpisodeStore::open(&path).unwrap();
}

#[test]
fn test_missing_file_reads_empty() {
    let (_dir, store) = temp_store();
    assert!(store.read_all().unwrap().is_empty());
    assert_eq!(store.count(), 0);
    assert!(store.read_since("2000-01-01T00:00:00Z").unwrap().is_empty());
}

#[test]
fn test_append_single_event() {
    let (_dir, store) = temp_store();
    let event = dummy_event(EventKind::FileCreate, "2026-01-01T00:00:00.000000Z");

    store.append(&event).unwrap();

    let events = store.read_all().unwrap();
    assert_eq!(events, vec![event.clone()]);

    let content = fs::read_to_string(store.path()).unwrap();
    assert_eq!(content, format!("{}\n", event.to_text()));
}

#[test]
fn test_append_order_preserved() {
    let (_dir, store) = temp_store();
    append_n(&store, 10);

    let events = store.read_all().unwrap();
    assert_eq!(seqs(&events), (0..10).collect::<Vec<_>>());
    assert_eq!(store.count(), 10);
}

#[test]
fn test_append_rejects_invalid_event() {
    let (_dir, store) = temp_store();
    let event = Event::with_timestamp(EventKind::FileCreate, "", object(json!({})), "t");

    let err = store.append(&event).unwrap_err();
    assert!(matches!(err, StoreError::Schema(_)), "{err:?}");
    assert!(!store.path().exists(), "nothing should be written");
}

#[test]
fn test_append_io_error_is_reported() {
    let dir = tempdir().unwrap();
    // A directory where the log file should be makes the open fail.
    let path = dir.path().join("episodes.jsonl");
    fs::create_dir(&path).unwrap();
    let store = EpisodeStore::open(&path).unwrap();

    let err = store.append(&numbered_event(0)).unwrap_err();
    assert!(matches!(err, StoreError::Io { .. }), "{err:?}");
    assert!(err.to_string().contains("episodes.jsonl"), "{err}");
}

#[test]
fn test_read_since_filters_inclusive() {
    let (_dir, store) = temp_store();
    for ts in [
        "2026-01-01T00:00:00.000000Z",
        "2026-01-02T00:00:00.000000Z",
        "2026-01-03T00:00:00.000000Z",
    ] {
        store.append(&dummy_event(EventKind::FileModify, ts)).unwrap();
    }

    let events = store.read_since("2026-01-02T00:00:00.000000Z").unwrap();
    let stamps: Vec<_> = events.iter().map(|e| e.timestamp()).collect();
    assert_eq!(
        stamps,
        ["2026-01-02T00:00:00.000000Z", "2026-01-03T00:00:00.000000Z"]
    );
}

#[test]
fn test_read_since_handles_mixed_precision() {
    let (_dir, store) = temp_store();
    // Same instant as the bound, written without fraction or offset.
    store
        .append(&dummy_event(EventKind::FileModify, "2026-01-02T00:00:00"))
        .unwrap();
    store
        .append(&dummy_event(EventKind::FileModify, "2026-01-01T23:59:59.5"))
        .unwrap();

    let events = store.read_since("2026-01-02T00:00:00.000000Z").unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].timestamp(), "2026-01-02T00:00:00");
}

#[test]
fn test_read_by_kind_and_producer() {
    let (_dir, store) = temp_store();
    let ts = "2026-01-01T00:00:00.000000Z";
    store.append(&dummy_event(EventKind::FileCreate, ts)).unwrap();
    store.append(&dummy_event(EventKind::ToolInvoke, ts)).unwrap();
    store
        .append(&Event::with_timestamp(
            EventKind::FileCreate,
            "cursor",
            object(json!({})),
            ts,
        ))
        .unwrap();

    let creates = store.read_by_kind(EventKind::FileCreate).unwrap();
    assert_eq!(creates.len(), 2);
    assert!(creates.iter().all(|e| e.kind() == EventKind::FileCreate));

    let cursor = store.read_by_producer("cursor").unwrap();
    assert_eq!(cursor.len(), 1);
    assert_eq!(cursor[0].producer(), "cursor");

    assert!(store.read_by_kind(EventKind::DiagnosticInfo).unwrap().is_empty());
    assert!(store.read_by_producer("nobody").unwrap().is_empty());
}

#[test]
fn test_blank_lines_skipped_and_not_counted() {
    let (_dir, store) = temp_store();
    let a = numbered_event(0);
    let b = numbered_event(1);
    fs::write(
        store.path(),
        format!("\n{}\n   \n\n{}\n\n", a.to_text(), b.to_text()),
    )
    .unwrap();

    assert_eq!(store.read_all().unwrap(), vec![a, b]);
    assert_eq!(store.count(), 2);
}

#[test]
fn test_count_includes_corrupt_lines() {
    let (_dir, store) = temp_store();
    append_n(&store, 2);
    let mut content = fs::read_to_string(store.path()).unwrap();
    content.push_str("{not json}\n");
    fs::write(store.path(), content).unwrap();

    assert_eq!(store.count(), 3);
    assert_eq!(store.read_all().unwrap().len(), 2);
}

#[test]
fn test_clear_removes_file() {
    let (_dir, store) = temp_store();
    append_n(&store, 3);

    assert!(store.clear());
    assert!(!store.path().exists());
    assert_eq!(store.count(), 0);
    assert!(store.read_all().unwrap().is_empty());

    // Clearing an absent log still succeeds.
    assert!(store.clear());
}

#[test]
fn test_clear_and_count_degrade_on_io_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("episodes.jsonl");
    // A non-empty directory where the log file should be.
    fs::create_dir_all(&path).unwrap();
    fs::write(path.join("stray"), "x").unwrap();
    let store = EpisodeStore::open(&path).unwrap();

    assert_eq!(store.count(), 0);
    assert!(!store.clear());
    assert!(path.is_dir());
    assert!(matches!(
        store.append(&numbered_event(0)),
        Err(StoreError::Io { .. })
    ));
}

#[test]
fn test_append_after_clear_starts_fresh() {
    let (_dir, store) = temp_store();
    append_n(&store, 3);
    store.clear();

    store.append(&numbered_event(7)).unwrap();
    assert_eq!(seqs(&store.read_all().unwrap()), vec![7]);
}

#[test]
fn test_clones_share_the_file() {
    let (_dir, store) = temp_store();
    let other = store.clone();
    store.append(&numbered_event(0)).unwrap();
    other.append(&numbered_event(1)).unwrap();
    assert_eq!(seqs(&store.read_all().unwrap()), vec![0, 1]);
}

#[test]
fn test_events_iterator_matches_read_all() {
    let (_dir, store) = temp_store();
    append_n(&store, 4);

    let iterated: Vec<Event> = store
        .events()
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(iterated, store.read_all().unwrap());
}
