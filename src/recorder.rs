use crate::error::{RecorderError, StoreError};
use crate::event::Event;
use crate::retention::{CleanupReport, DEFAULT_TTL_DAYS, LockMode, TtlCleaner};
use crate::router::{DefaultDetector, DetectProducer, ProducerName, ProducerRouter};
use crate::stats::LogStats;
use crate::store::EpisodeStore;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Directory, relative to a workspace root, that holds the episode log.
pub const DEFAULT_MEMORY_DIR: &str = ".vscode/pax-memory";

/// File name of the episode log inside [`DEFAULT_MEMORY_DIR`].
pub const EPISODES_FILE: &str = "episodes.jsonl";

/// Locate the episode log for a workspace.
///
/// Walks from `start` up through its ancestors and returns
/// `<ancestor>/.vscode/pax-memory/episodes.jsonl` for the first ancestor
/// where that directory exists. Falls back to the same layout under
/// `start`.
pub fn discover_storage_path(start: &Path) -> PathBuf {
    start
        .ancestors()
        .map(|dir| dir.join(DEFAULT_MEMORY_DIR))
        .find(|candidate| candidate.is_dir())
        .unwrap_or_else(|| start.join(DEFAULT_MEMORY_DIR))
        .join(EPISODES_FILE)
}

/// Builder for configuring a [`Recorder`].
///
/// Created via [`Recorder::builder`].
pub struct RecorderBuilder {
    path: PathBuf,
    ttl_days: u32,
    producer: Option<String>,
    detector: Box<dyn DetectProducer>,
    lock_mode: LockMode,
}

impl RecorderBuilder {
    /// Retention window in days (default [`DEFAULT_TTL_DAYS`]).
    pub fn ttl_days(mut self, days: u32) -> Self {
        self.ttl_days = days;
        self
    }

    /// Use the named producer instead of asking the detector.
    pub fn producer(mut self, name: impl Into<String>) -> Self {
        self.producer = Some(name.into());
        self
    }

    /// Strategy for picking a producer when none is named.
    pub fn detector(mut self, detector: impl DetectProducer + 'static) -> Self {
        self.detector = Box::new(detector);
        self
    }

    /// Locking used by retention sweeps (default [`LockMode::Flock`]).
    pub fn lock_mode(mut self, mode: LockMode) -> Self {
        self.lock_mode = mode;
        self
    }

    /// Resolve the producer and prepare the log directory.
    ///
    /// # Errors
    ///
    /// [`RecorderError::Producer`] for an unrecognized producer name,
    /// [`RecorderError::Io`] if the log directory cannot be created.
    pub fn open(self) -> Result<Recorder, RecorderError> {
        let router = ProducerRouter::new(self.producer.as_deref(), &*self.detector)?;
        let store = EpisodeStore::open(&self.path).map_err(|e| match e {
            StoreError::Io { path, source, .. } => RecorderError::Io { path, source },
            StoreError::Schema(e) => RecorderError::Producer(e),
        })?;
        let cleaner = TtlCleaner::new(store.clone(), self.ttl_days).with_lock_mode(self.lock_mode);

        log::debug!(
            "recorder open: {} (producer {}, ttl {} days)",
            self.path.display(),
            router.name(),
            self.ttl_days
        );

        Ok(Recorder {
            router,
            store,
            cleaner,
        })
    }
}

/// A capture session over one episode log.
///
/// Builds events through a [`ProducerRouter`], appends them to an
/// [`EpisodeStore`], and runs retention through a [`TtlCleaner`] bound to
/// the same store.
///
/// # Examples
///
/// ```
/// use episodelog::{EventKind, Recorder};
///
/// let dir = tempfile::tempdir().unwrap();
/// let recorder = Recorder::builder(dir.path().join("episodes.jsonl"))
///     .producer("universal")
///     .ttl_days(3)
///     .open()
///     .unwrap();
///
/// recorder.capture_file("create", "src/lib.rs").unwrap();
/// recorder.capture_terminal("execute", "cargo test", "ok", "").unwrap();
///
/// let stats = recorder.stats().unwrap();
/// assert_eq!(stats.total_events, 2);
/// assert_eq!(stats.by_kind[EventKind::FileCreate.as_str()], 1);
/// ```
#[derive(Debug)]
pub struct Recorder {
    router: ProducerRouter,
    store: EpisodeStore,
    cleaner: TtlCleaner,
}

impl Recorder {
    pub fn builder(path: impl AsRef<Path>) -> RecorderBuilder {
        RecorderBuilder {
            path: path.as_ref().to_path_buf(),
            ttl_days: DEFAULT_TTL_DAYS,
            producer: None,
            detector: Box::new(DefaultDetector),
            lock_mode: LockMode::default(),
        }
    }

    /// Open with default settings at the log discovered from `workspace`.
    pub fn open_workspace(workspace: &Path) -> Result<Self, RecorderError> {
        Self::builder(discover_storage_path(workspace)).open()
    }

    pub fn producer_name(&self) -> ProducerName {
        self.router.name()
    }

    pub fn store(&self) -> &EpisodeStore {
        &self.store
    }

    pub fn cleaner(&self) -> &TtlCleaner {
        &self.cleaner
    }

    pub fn capture_file(&self, change: &str, path: &str) -> Result<Event, StoreError> {
        let event = self.router.capture_file_event(change, path)?;
        self.persist(event)
    }

    pub fn capture_terminal(
        &self,
        kind: &str,
        command: &str,
        output: &str,
        error: &str,
    ) -> Result<Event, StoreError> {
        let event = self
            .router
            .capture_terminal_event(kind, command, output, error)?;
        self.persist(event)
    }

    pub fn capture_diagnostic(
        &self,
        kind: &str,
        path: &str,
        line: u32,
        message: &str,
        severity: Option<&str>,
    ) -> Result<Event, StoreError> {
        let event = self
            .router
            .capture_diagnostic_event(kind, path, line, message, severity)?;
        self.persist(event)
    }

    pub fn capture_tool(
        &self,
        kind: &str,
        name: &str,
        status: &str,
        details: Option<Map<String, Value>>,
    ) -> Result<Event, StoreError> {
        let event = self.router.capture_tool_event(kind, name, status, details)?;
        self.persist(event)
    }

    fn persist(&self, event: Event) -> Result<Event, StoreError> {
        self.store.append(&event)?;
        Ok(event)
    }

    pub fn cleanup(&self, dry_run: bool) -> CleanupReport {
        self.cleaner.cleanup(dry_run)
    }

    pub fn should_cleanup(&self) -> bool {
        self.cleaner.should_cleanup()
    }

    pub fn stats(&self) -> Result<LogStats, StoreError> {
        LogStats::collect(&self.store)
    }
}
