//! Non-throwing schema checks that report every violation at once.

use crate::event::Event;
use serde::Serialize;

/// Outcome of [`Validator::validate_event`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Outcome of [`Validator::validate_line`]. `event` is set only when valid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub event: Option<Event>,
}

/// Schema validator for events and raw log lines.
///
/// Unlike [`Event::validate`], which stops at the first problem, this
/// accumulates every violation and never returns `Err`.
///
/// # Examples
///
/// ```
/// use episodelog::{Event, EventKind, Validator};
/// use serde_json::Map;
///
/// let event = Event::with_timestamp(EventKind::ToolInvoke, "", Map::new(), "");
/// let report = Validator::validate_event(&event);
/// assert!(!report.valid);
/// assert_eq!(report.errors.len(), 2);
///
/// let line = Validator::validate_line("not json");
/// assert!(!line.valid);
/// assert!(line.event.is_none());
/// ```
pub struct Validator;

impl Validator {
    pub fn validate_event(event: &Event) -> ValidationReport {
        let mut errors = Vec::new();
        if event.producer().is_empty() {
            errors.push("provider must be a non-empty string".to_string());
        }
        if event.timestamp().is_empty() {
            errors.push("timestamp must be a non-empty string".to_string());
        }
        ValidationReport {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn validate_line(line: &str) -> LineValidation {
        match Event::from_text(line) {
            Ok(event) => LineValidation {
                valid: true,
                errors: Vec::new(),
                event: Some(event),
            },
            Err(e) => LineValidation {
                valid: false,
                errors: vec![e.to_string()],
                event: None,
            },
        }
    }
}
