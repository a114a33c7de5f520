use crate::error::SchemaError;
use crate::event::Event;
use crate::producer::{Producer, UniversalProducer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Recognized producer identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProducerName {
    Universal,
    Copilot,
    Codex,
    Cursor,
}

impl ProducerName {
    pub const ALL: [ProducerName; 4] = [
        ProducerName::Universal,
        ProducerName::Copilot,
        ProducerName::Codex,
        ProducerName::Cursor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProducerName::Universal => "universal",
            ProducerName::Copilot => "copilot",
            ProducerName::Codex => "codex",
            ProducerName::Cursor => "cursor",
        }
    }
}

impl fmt::Display for ProducerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ProducerName {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProducerName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<_> = ProducerName::ALL.iter().map(|n| n.as_str()).collect();
                SchemaError::value_err(format!(
                    "unknown producer: {s} (valid: {})",
                    valid.join(", ")
                ))
            })
    }
}

type ProducerCtor = fn() -> Box<dyn Producer>;

fn universal() -> Box<dyn Producer> {
    Box::new(UniversalProducer::new())
}

// Editor-specific producers are not written yet; each name routes to the
// universal producer until it gets its own constructor.
fn route(name: ProducerName) -> ProducerCtor {
    match name {
        ProducerName::Universal => universal,
        ProducerName::Copilot => universal,
        ProducerName::Codex => universal,
        ProducerName::Cursor => universal,
    }
}

/// Strategy that picks a producer name when none is given explicitly.
///
/// Detection from the process environment lives outside this crate; pass
/// whatever strategy fits the host. Any `Fn() -> String` works.
pub trait DetectProducer {
    fn detect(&self) -> String;
}

impl<F: Fn() -> String> DetectProducer for F {
    fn detect(&self) -> String {
        self()
    }
}

/// Detector that always answers `"universal"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDetector;

impl DetectProducer for DefaultDetector {
    fn detect(&self) -> String {
        ProducerName::Universal.as_str().to_string()
    }
}

/// Single entry point for capture, forwarding to one active [`Producer`].
///
/// The producer is chosen once, at construction, and never changes.
///
/// # Examples
///
/// ```
/// use episodelog::{DefaultDetector, ProducerName, ProducerRouter};
///
/// let router = ProducerRouter::new(Some("cursor"), &DefaultDetector).unwrap();
/// assert_eq!(router.name(), ProducerName::Cursor);
///
/// let event = router.capture_file_event("create", "notes.md").unwrap();
/// assert_eq!(event.producer(), "universal");
///
/// assert!(ProducerRouter::new(Some("emacs"), &DefaultDetector).is_err());
/// ```
pub struct ProducerRouter {
    name: ProducerName,
    producer: Box<dyn Producer>,
}

impl fmt::Debug for ProducerRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProducerRouter")
            .field("name", &self.name)
            .field("producer", &self.producer.name())
            .finish()
    }
}

impl ProducerRouter {
    /// Select the producer named `explicit`, or ask `detector` when `None`.
    ///
    /// # Errors
    ///
    /// [`SchemaError::Value`] if the resulting name is not recognized.
    pub fn new(explicit: Option<&str>, detector: &dyn DetectProducer) -> Result<Self, SchemaError> {
        let name: ProducerName = match explicit {
            Some(name) => name.parse()?,
            None => detector.detect().parse()?,
        };
        Ok(Self::with_name(name))
    }

    pub fn with_name(name: ProducerName) -> Self {
        let producer = route(name)();
        log::debug!("producer router: {name} -> {}", producer.name());
        ProducerRouter { name, producer }
    }

    pub fn name(&self) -> ProducerName {
        self.name
    }

    pub fn capture_file_event(&self, change: &str, path: &str) -> Result<Event, SchemaError> {
        self.producer.capture_file_event(change, path)
    }

    pub fn capture_terminal_event(
        &self,
        kind: &str,
        command: &str,
        output: &str,
        error: &str,
    ) -> Result<Event, SchemaError> {
        self.producer
            .capture_terminal_event(kind, command, output, error)
    }

    pub fn capture_diagnostic_event(
        &self,
        kind: &str,
        path: &str,
        line: u32,
        message: &str,
        severity: Option<&str>,
    ) -> Result<Event, SchemaError> {
        self.producer
            .capture_diagnostic_event(kind, path, line, message, severity)
    }

    pub fn capture_tool_event(
        &self,
        kind: &str,
        name: &str,
        status: &str,
        details: Option<Map<String, Value>>,
    ) -> Result<Event, SchemaError> {
        self.producer.capture_tool_event(kind, name, status, details)
    }
}
