#![allow(dead_code)]

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use episodelog::{EpisodeStore, Event, EventKind, timestamp};
use serde_json::{Map, Value, json};
use tempfile::{TempDir, tempdir};

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
}

pub fn days_before(now: DateTime<Utc>, days: i64) -> String {
    timestamp::format(now - TimeDelta::days(days))
}

pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

pub fn dummy_event(kind: EventKind, ts: &str) -> Event {
    Event::with_timestamp(kind, "universal", object(json!({"key": "value"})), ts)
}

pub fn numbered_event(i: usize) -> Event {
    Event::with_timestamp(
        EventKind::ToolInvoke,
        "universal",
        object(json!({"seq": i})),
        format!("2026-01-01T00:00:{:02}.000000Z", i % 60),
    )
}

pub fn append_n(store: &EpisodeStore, n: usize) {
    for i in 0..n {
        store.append(&numbered_event(i)).unwrap();
    }
}

pub fn temp_store() -> (TempDir, EpisodeStore) {
    let dir = tempdir().unwrap();
    let store = EpisodeStore::open(dir.path().join("memory").join("episodes.jsonl")).unwrap();
    (dir, store)
}

pub fn seqs(events: &[Event]) -> Vec<u64> {
    events
        .iter()
        .map(|e| e.metadata()["seq"].as_u64().unwrap())
        .collect()
}
