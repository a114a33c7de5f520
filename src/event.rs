use crate::error::SchemaError;
use crate::timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Keys every serialized event record must carry, in on-disk order.
pub const RECORD_KEYS: [&str; 4] = ["event_type", "provider", "timestamp", "metadata"];

/// The four groups event kinds fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFamily {
    File,
    Terminal,
    Diagnostic,
    Tool,
}

impl EventFamily {
    /// Tag prefix shared by every kind in the family (`"file"`, ...).
    pub fn prefix(self) -> &'static str {
        match self {
            EventFamily::File => "file",
            EventFamily::Terminal => "terminal",
            EventFamily::Diagnostic => "diagnostic",
            EventFamily::Tool => "tool",
        }
    }
}

/// The closed set of event categories.
///
/// Serialized as its snake_case tag, e.g. `EventKind::FileCreate` is
/// `"file_create"` on disk.
///
/// # Examples
///
/// ```
/// use episodelog::{EventFamily, EventKind};
///
/// let kind: EventKind = "terminal_error".parse().unwrap();
/// assert_eq!(kind, EventKind::TerminalError);
/// assert_eq!(kind.family(), EventFamily::Terminal);
/// assert_eq!(kind.action(), "error");
/// assert!("bad_kind".parse::<EventKind>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    FileCreate,
    FileModify,
    FileDelete,
    TerminalExecute,
    TerminalOutput,
    TerminalError,
    DiagnosticError,
    DiagnosticWarning,
    DiagnosticInfo,
    ToolInvoke,
    ToolComplete,
    ToolError,
}

impl EventKind {
    pub const ALL: [EventKind; 12] = [
        EventKind::FileCreate,
        EventKind::FileModify,
        EventKind::FileDelete,
        EventKind::TerminalExecute,
        EventKind::TerminalOutput,
        EventKind::TerminalError,
        EventKind::DiagnosticError,
        EventKind::DiagnosticWarning,
        EventKind::DiagnosticInfo,
        EventKind::ToolInvoke,
        EventKind::ToolComplete,
        EventKind::ToolError,
    ];

    /// The stable string tag stored in `event_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::FileCreate => "file_create",
            EventKind::FileModify => "file_modify",
            EventKind::FileDelete => "file_delete",
            EventKind::TerminalExecute => "terminal_execute",
            EventKind::TerminalOutput => "terminal_output",
            EventKind::TerminalError => "terminal_error",
            EventKind::DiagnosticError => "diagnostic_error",
            EventKind::DiagnosticWarning => "diagnostic_warning",
            EventKind::DiagnosticInfo => "diagnostic_info",
            EventKind::ToolInvoke => "tool_invoke",
            EventKind::ToolComplete => "tool_complete",
            EventKind::ToolError => "tool_error",
        }
    }

    pub fn family(self) -> EventFamily {
        match self {
            EventKind::FileCreate | EventKind::FileModify | EventKind::FileDelete => {
                EventFamily::File
            }
            EventKind::TerminalExecute | EventKind::TerminalOutput | EventKind::TerminalError => {
                EventFamily::Terminal
            }
            EventKind::DiagnosticError
            | EventKind::DiagnosticWarning
            | EventKind::DiagnosticInfo => EventFamily::Diagnostic,
            EventKind::ToolInvoke | EventKind::ToolComplete | EventKind::ToolError => {
                EventFamily::Tool
            }
        }
    }

    /// The tag with its family prefix stripped (`"create"`, `"warning"`, ...).
    pub fn action(self) -> &'static str {
        let tag = self.as_str();
        &tag[self.family().prefix().len() + 1..]
    }

    /// Resolve a kind within one family.
    ///
    /// Accepts either the bare action (`"modify"`) or the full tag
    /// (`"file_modify"`). Anything that does not name a member of `family`
    /// is a [`SchemaError::Value`].
    ///
    /// ```
    /// use episodelog::{EventFamily, EventKind};
    ///
    /// assert_eq!(EventKind::in_family(EventFamily::File, "modify"), Ok(EventKind::FileModify));
    /// assert_eq!(EventKind::in_family(EventFamily::File, "file_delete"), Ok(EventKind::FileDelete));
    /// assert!(EventKind::in_family(EventFamily::File, "terminal_execute").is_err());
    /// ```
    pub fn in_family(family: EventFamily, name: &str) -> Result<EventKind, SchemaError> {
        let action = name
            .strip_prefix(family.prefix())
            .and_then(|rest| rest.strip_prefix('_'))
            .unwrap_or(name);
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.family() == family && kind.action() == action)
            .ok_or_else(|| {
                SchemaError::value_err(format!(
                    "unknown {} event type: {name}",
                    family.prefix()
                ))
            })
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| SchemaError::value_err(format!("unknown event type: {s}")))
    }
}

/// An immutable, schema-checked record of one workspace occurrence.
///
/// Serialized as a single JSON line with exactly the keys `event_type`,
/// `provider`, `timestamp` and `metadata`. Fields are private: once built,
/// an event is never mutated. Equality is structural over all four fields.
///
/// # Examples
///
/// ```
/// use episodelog::{Event, EventKind};
/// use serde_json::{json, Map};
///
/// let mut metadata = Map::new();
/// metadata.insert("filepath".into(), json!("src/main.rs"));
///
/// let event = Event::new(EventKind::FileModify, "universal", metadata);
/// assert_eq!(event.kind(), EventKind::FileModify);
/// assert_eq!(event.producer(), "universal");
/// assert!(!event.timestamp().is_empty());
///
/// let line = event.to_text();
/// assert!(!line.contains('\n'));
/// assert_eq!(Event::from_text(&line).unwrap(), event);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct Event {
    #[serde(rename = "event_type")]
    kind: EventKind,

    /// Serialized as `"provider"`.
    #[serde(rename = "provider")]
    producer: String,

    timestamp: String,

    metadata: Map<String, Value>,
}

impl Event {
    /// Create an event stamped with the current UTC time.
    pub fn new(kind: EventKind, producer: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self::with_timestamp(kind, producer, metadata, timestamp::now())
    }

    /// Create an event with an explicit timestamp.
    ///
    /// No validation happens here; call [`Event::validate`] to check for
    /// empty fields.
    pub fn with_timestamp(
        kind: EventKind,
        producer: impl Into<String>,
        metadata: Map<String, Value>,
        timestamp: impl Into<String>,
    ) -> Self {
        Event {
            kind,
            producer: producer.into(),
            timestamp: timestamp.into(),
            metadata,
        }
    }

    /// Create an event from loosely typed parts.
    ///
    /// Fails with [`SchemaError::Type`] if `kind` is not a recognized tag or
    /// `metadata` is not a JSON object. A missing timestamp is filled in with
    /// the current time.
    ///
    /// ```
    /// use episodelog::{Event, SchemaError};
    /// use serde_json::json;
    ///
    /// let err = Event::try_new("bad_kind", "universal", json!({}), None).unwrap_err();
    /// assert!(matches!(err, SchemaError::Type(_)));
    ///
    /// let err = Event::try_new("file_create", "universal", json!([1, 2]), None).unwrap_err();
    /// assert!(matches!(err, SchemaError::Type(_)));
    /// ```
    pub fn try_new(
        kind: &str,
        producer: &str,
        metadata: Value,
        timestamp: Option<&str>,
    ) -> Result<Self, SchemaError> {
        let kind: EventKind = kind.parse().map_err(|_| {
            SchemaError::type_err(format!("event_type must be a known event kind, got {kind:?}"))
        })?;
        let metadata = match metadata {
            Value::Object(map) => map,
            other => {
                return Err(SchemaError::type_err(format!(
                    "metadata must be an object, got {}",
                    json_type_name(&other)
                )));
            }
        };
        Ok(match timestamp {
            Some(ts) if !ts.is_empty() => Self::with_timestamp(kind, producer, metadata, ts),
            _ => Self::new(kind, producer, metadata),
        })
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Identifier of the source that produced the event (e.g. `"universal"`).
    pub fn producer(&self) -> &str {
        &self.producer
    }

    /// ISO-8601 UTC timestamp.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Check field-level invariants.
    ///
    /// Fails with [`SchemaError::Value`] on the first empty `provider` or
    /// `timestamp`. See [`Validator`](crate::Validator) for a report that
    /// collects every violation.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.producer.is_empty() {
            return Err(SchemaError::value_err("provider cannot be empty"));
        }
        if self.timestamp.is_empty() {
            return Err(SchemaError::value_err("timestamp cannot be empty"));
        }
        Ok(())
    }

    /// The event as a JSON object with the four record keys.
    pub fn to_record(&self) -> Map<String, Value> {
        let mut record = Map::with_capacity(RECORD_KEYS.len());
        record.insert("event_type".into(), Value::from(self.kind.as_str()));
        record.insert("provider".into(), Value::from(self.producer.clone()));
        record.insert("timestamp".into(), Value::from(self.timestamp.clone()));
        record.insert("metadata".into(), Value::Object(self.metadata.clone()));
        record
    }

    /// Canonical single-line JSON encoding.
    ///
    /// Newlines inside strings are escaped by JSON, so the result never
    /// contains a raw line break.
    pub fn to_text(&self) -> String {
        Value::Object(self.to_record()).to_string()
    }

    /// Parse a record produced by [`Event::to_record`].
    ///
    /// Missing keys and unknown `event_type` tags are
    /// [`SchemaError::Value`]; wrongly typed fields are
    /// [`SchemaError::Type`]. The result is validated before it is returned.
    pub fn from_record(record: &Map<String, Value>) -> Result<Self, SchemaError> {
        Self::from_owned_record(record.clone())
    }

    /// Parse a single JSON line.
    pub fn from_text(text: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| SchemaError::value_err(format!("invalid JSON: {e}")))?;
        match value {
            Value::Object(record) => Self::from_owned_record(record),
            other => Err(SchemaError::value_err(format!(
                "event record must be an object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    fn from_owned_record(mut record: Map<String, Value>) -> Result<Self, SchemaError> {
        for key in RECORD_KEYS {
            if !record.contains_key(key) {
                return Err(missing_field(key));
            }
        }

        let kind = match record.remove("event_type") {
            Some(Value::String(tag)) => tag.parse::<EventKind>()?,
            Some(other) => {
                return Err(SchemaError::value_err(format!(
                    "unknown event type: {other}"
                )));
            }
            None => return Err(missing_field("event_type")),
        };
        let producer = take_string(&mut record, "provider")?;
        let timestamp = take_string(&mut record, "timestamp")?;
        let metadata = match record.remove("metadata") {
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(SchemaError::type_err(format!(
                    "metadata must be an object, got {}",
                    json_type_name(&other)
                )));
            }
            None => return Err(missing_field("metadata")),
        };

        let event = Event::with_timestamp(kind, producer, metadata, timestamp);
        event.validate()?;
        Ok(event)
    }
}

impl TryFrom<Map<String, Value>> for Event {
    type Error = SchemaError;

    fn try_from(record: Map<String, Value>) -> Result<Self, Self::Error> {
        Event::from_owned_record(record)
    }
}

fn take_string(record: &mut Map<String, Value>, key: &str) -> Result<String, SchemaError> {
    match record.remove(key) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(SchemaError::type_err(format!(
            "{key} must be a string, got {}",
            json_type_name(&other)
        ))),
        None => Err(missing_field(key)),
    }
}

fn missing_field(key: &str) -> SchemaError {
    SchemaError::value_err(format!("missing required field: {key}"))
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
