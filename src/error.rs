use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A schema violation raised while constructing, validating, or parsing an
/// [`Event`](crate::Event).
///
/// `Type` covers values of the wrong shape (an unknown event kind at
/// construction, a non-object `metadata`, a non-string `provider`). `Value`
/// covers well-typed but unacceptable content (empty fields, missing keys,
/// invalid JSON, capture kinds outside their family).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("type error: {0}")]
    Type(String),

    #[error("value error: {0}")]
    Value(String),
}

impl SchemaError {
    pub(crate) fn type_err(msg: impl Into<String>) -> Self {
        SchemaError::Type(msg.into())
    }

    pub(crate) fn value_err(msg: impl Into<String>) -> Self {
        SchemaError::Value(msg.into())
    }
}

/// Failure of a store operation that reports errors loudly (`append`,
/// `read_all` and the reads derived from it).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The event failed validation and was not written.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Failure opening a [`Recorder`](crate::Recorder).
#[derive(Debug, Error)]
pub enum RecorderError {
    /// The requested or detected producer name is not recognized.
    #[error(transparent)]
    Producer(#[from] SchemaError),

    #[error("failed to prepare log directory {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
