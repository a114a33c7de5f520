mod error;
mod event;
mod producer;
mod recorder;
mod retention;
mod router;
mod stats;
mod store;
pub mod timestamp;
mod validator;

pub use error::{RecorderError, SchemaError, StoreError};
pub use event::{Event, EventFamily, EventKind, RECORD_KEYS};
pub use producer::{MAX_CAPTURED_OUTPUT, Producer, UNIVERSAL, UniversalProducer};
pub use recorder::{
    DEFAULT_MEMORY_DIR, EPISODES_FILE, Recorder, RecorderBuilder, discover_storage_path,
};
pub use retention::{CleanupReport, DEFAULT_TTL_DAYS, LockMode, TtlCleaner, sweep_lock_path};
pub use router::{DefaultDetector, DetectProducer, ProducerName, ProducerRouter};
pub use stats::LogStats;
pub use store::{EpisodeStore, Events};
pub use validator::{LineValidation, ValidationReport, Validator};
