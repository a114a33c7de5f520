//! Event producers: assemble domain metadata and wrap it in an [`Event`].
//!
//! Producers never touch storage. Callers persist what they return.

use crate::error::SchemaError;
use crate::event::{Event, EventFamily, EventKind};
use crate::timestamp;
use serde_json::{Map, Value};

/// Upper bound, in characters, on captured terminal output and error text.
pub const MAX_CAPTURED_OUTPUT: usize = 500;

/// Producer name stamped on events built by [`UniversalProducer`].
pub const UNIVERSAL: &str = "universal";

/// A source of workspace events.
///
/// Every producer offers the same four captures and differs only in the
/// metadata it assembles. Kind arguments accept the bare action
/// (`"create"`) or the full tag (`"file_create"`); anything outside the
/// capture's family is a [`SchemaError::Value`].
pub trait Producer: Send + Sync {
    /// Value written to each event's `provider` field.
    fn name(&self) -> &str;

    /// File created, modified, or deleted.
    fn capture_file_event(&self, change: &str, path: &str) -> Result<Event, SchemaError>;

    /// Terminal command activity. `output` and `error` are truncated to
    /// [`MAX_CAPTURED_OUTPUT`] characters each.
    fn capture_terminal_event(
        &self,
        kind: &str,
        command: &str,
        output: &str,
        error: &str,
    ) -> Result<Event, SchemaError>;

    /// A compiler or linter diagnostic. When `severity` is `None` it is the
    /// kind's action (`"error"`, `"warning"`, `"info"`).
    fn capture_diagnostic_event(
        &self,
        kind: &str,
        path: &str,
        line: u32,
        message: &str,
        severity: Option<&str>,
    ) -> Result<Event, SchemaError>;

    /// A tool invocation, completion, or failure.
    fn capture_tool_event(
        &self,
        kind: &str,
        name: &str,
        status: &str,
        details: Option<Map<String, Value>>,
    ) -> Result<Event, SchemaError>;
}

/// Workspace-only producer that works without any editor integration.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniversalProducer;

impl UniversalProducer {
    pub fn new() -> Self {
        UniversalProducer
    }

    fn build(&self, kind: EventKind, ts: String, metadata: Map<String, Value>) -> Event {
        Event::with_timestamp(kind, self.name(), metadata, ts)
    }
}

impl Producer for UniversalProducer {
    fn name(&self) -> &str {
        UNIVERSAL
    }

    fn capture_file_event(&self, change: &str, path: &str) -> Result<Event, SchemaError> {
        let kind = EventKind::in_family(EventFamily::File, change)?;
        let ts = timestamp::now();

        let mut metadata = Map::new();
        metadata.insert("filepath".into(), Value::from(path));
        metadata.insert("event_type".into(), Value::from(kind.as_str()));
        metadata.insert("timestamp".into(), Value::from(ts.clone()));
        Ok(self.build(kind, ts, metadata))
    }

    fn capture_terminal_event(
        &self,
        kind: &str,
        command: &str,
        output: &str,
        error: &str,
    ) -> Result<Event, SchemaError> {
        let kind = EventKind::in_family(EventFamily::Terminal, kind)?;
        let ts = timestamp::now();

        let mut metadata = Map::new();
        metadata.insert("command".into(), Value::from(command));
        metadata.insert("output".into(), Value::from(truncate_chars(output)));
        metadata.insert("error".into(), Value::from(truncate_chars(error)));
        metadata.insert("timestamp".into(), Value::from(ts.clone()));
        Ok(self.build(kind, ts, metadata))
    }

    fn capture_diagnostic_event(
        &self,
        kind: &str,
        path: &str,
        line: u32,
        message: &str,
        severity: Option<&str>,
    ) -> Result<Event, SchemaError> {
        let kind = EventKind::in_family(EventFamily::Diagnostic, kind)?;
        let severity = severity.unwrap_or(kind.action());
        let ts = timestamp::now();

        let mut metadata = Map::new();
        metadata.insert("filepath".into(), Value::from(path));
        metadata.insert("line".into(), Value::from(line));
        metadata.insert("message".into(), Value::from(message));
        metadata.insert("severity".into(), Value::from(severity));
        metadata.insert("timestamp".into(), Value::from(ts.clone()));
        Ok(self.build(kind, ts, metadata))
    }

    fn capture_tool_event(
        &self,
        kind: &str,
        name: &str,
        status: &str,
        details: Option<Map<String, Value>>,
    ) -> Result<Event, SchemaError> {
        let kind = EventKind::in_family(EventFamily::Tool, kind)?;
        let ts = timestamp::now();

        let mut metadata = Map::new();
        metadata.insert("tool_name".into(), Value::from(name));
        metadata.insert("status".into(), Value::from(status));
        metadata.insert("timestamp".into(), Value::from(ts.clone()));
        if let Some(details) = details {
            metadata.insert("details".into(), Value::Object(details));
        }
        Ok(self.build(kind, ts, metadata))
    }
}

/// Keep at most [`MAX_CAPTURED_OUTPUT`] characters (code points, not bytes).
fn truncate_chars(text: &str) -> &str {
    match text.char_indices().nth(MAX_CAPTURED_OUTPUT) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
