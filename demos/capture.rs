//! Capture a few workspace events, read them back, and sweep old ones.
//!
//! Writes to a temporary directory so it can be run anywhere.

use episodelog::{Event, EventKind, Recorder, Validator, timestamp};
use serde_json::{Map, json};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let recorder = Recorder::builder(dir.path().join("episodes.jsonl"))
        .ttl_days(7)
        .open()?;
    println!(
        "Recording to {} via the {} producer",
        recorder.store().path().display(),
        recorder.producer_name()
    );

    recorder.capture_file("create", "src/parser.rs")?;
    recorder.capture_terminal("execute", "cargo test", &"ok ".repeat(300), "")?;
    recorder.capture_diagnostic("warning", "src/parser.rs", 17, "unused import", None)?;
    let mut details = Map::new();
    details.insert("files_changed".into(), json!(2));
    recorder.capture_tool("complete", "formatter", "done", Some(details))?;

    // Something from last month, as if the log had been running a while.
    let stale_ts = timestamp::format(chrono::Utc::now() - chrono::TimeDelta::days(30));
    recorder.store().append(&Event::with_timestamp(
        EventKind::FileDelete,
        "universal",
        Map::new(),
        stale_ts,
    ))?;

    for event in recorder.store().read_all()? {
        println!("  {} {:<18} {}", event.timestamp(), event.kind(), event.producer());
    }

    let terminal = recorder.store().read_by_kind(EventKind::TerminalExecute)?;
    let output = terminal[0].metadata()["output"].as_str().unwrap_or("");
    println!("Terminal output stored as {} chars", output.chars().count());

    let line = Validator::validate_line("{\"event_type\":\"file_create\"}");
    println!("Validating a bad line: {:?}", line.errors);

    println!("Needs cleanup: {}", recorder.should_cleanup());
    let preview = recorder.cleanup(true);
    println!("Dry run: {}", serde_json::to_string(&preview)?);
    let report = recorder.cleanup(false);
    println!("Cleanup: {}", serde_json::to_string(&report)?);

    let stats = recorder.stats()?;
    println!("Stats: {}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}
