//! TTL-based eviction of old events.
//!
//! A sweep reads the whole log, keeps events at or after the cutoff, and if
//! anything is evicted rewrites the log by clearing it and appending the
//! survivors back in order. Cost is O(total events) per sweep regardless of
//! how many are removed.
//!
//! The clear-then-replay sequence is not atomic. An append from another
//! writer that lands between the clear and the end of the replay can be
//! lost, and so can corrupt lines (they are not carried over). Sweeps are
//! serialized against each other by an advisory lock on a sidecar file, but
//! appends do not take that lock.

use crate::error::StoreError;
use crate::event::Event;
use crate::store::EpisodeStore;
use crate::timestamp;
use chrono::{DateTime, TimeDelta, Utc};
use fs2::FileExt;
use serde::Serialize;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Retention window applied when none is configured.
pub const DEFAULT_TTL_DAYS: u32 = 7;

/// Controls the advisory lock held for the duration of a sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LockMode {
    /// Exclusive `flock` on `<log>.sweep.lock`. A sweep that finds it held
    /// reports an error instead of running.
    #[default]
    Flock,
    /// No locking.
    None,
}

/// Counts reported by [`TtlCleaner::cleanup`].
///
/// Serializes as `{"removed", "kept", "total"}`, plus `"error"` when the
/// sweep could not run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub removed: usize,
    pub kept: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CleanupReport {
    fn failed(error: impl Into<String>) -> Self {
        CleanupReport {
            error: Some(error.into()),
            ..CleanupReport::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Evicts events older than a fixed number of days.
///
/// All file mutation goes through the wrapped [`EpisodeStore`].
///
/// # Examples
///
/// ```
/// use episodelog::{EpisodeStore, TtlCleaner};
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = EpisodeStore::open(dir.path().join("episodes.jsonl")).unwrap();
/// let cleaner = TtlCleaner::new(store, 7);
///
/// assert!(!cleaner.should_cleanup());
/// let report = cleaner.cleanup(false);
/// assert_eq!((report.removed, report.kept, report.total), (0, 0, 0));
/// ```
#[derive(Debug, Clone)]
pub struct TtlCleaner {
    store: EpisodeStore,
    ttl_days: u32,
    lock_mode: LockMode,
}

impl TtlCleaner {
    pub fn new(store: EpisodeStore, ttl_days: u32) -> Self {
        TtlCleaner {
            store,
            ttl_days,
            lock_mode: LockMode::default(),
        }
    }

    /// Open a store at `path` and wrap it with the default retention window.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Ok(Self::new(EpisodeStore::open(path)?, DEFAULT_TTL_DAYS))
    }

    pub fn with_lock_mode(mut self, lock_mode: LockMode) -> Self {
        self.lock_mode = lock_mode;
        self
    }

    pub fn ttl_days(&self) -> u32 {
        self.ttl_days
    }

    pub fn store(&self) -> &EpisodeStore {
        &self.store
    }

    /// Oldest timestamp that survives a sweep run at `now`.
    ///
    /// A window reaching past the earliest representable instant clamps to
    /// it, so nothing expires.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        TimeDelta::try_days(i64::from(self.ttl_days))
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Evict expired events as of the current time.
    pub fn cleanup(&self, dry_run: bool) -> CleanupReport {
        self.cleanup_at(Utc::now(), dry_run)
    }

    /// Evict events older than `now - ttl_days`.
    ///
    /// Events exactly at the cutoff are kept. With `dry_run` the counts are
    /// computed but the log is untouched. Never fails: errors come back as a
    /// zeroed report with `error` set.
    pub fn cleanup_at(&self, now: DateTime<Utc>, dry_run: bool) -> CleanupReport {
        let _lock = match self.lock_sweep() {
            Ok(lock) => lock,
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                log::warn!(
                    "{}: cleanup skipped, another sweep holds the lock",
                    self.store.path().display()
                );
                return CleanupReport::failed("cleanup already in progress");
            }
            Err(e) => {
                log::warn!("{}: cleanup lock failed: {e}", self.store.path().display());
                return CleanupReport::failed(format!("cleanup failed: {e}"));
            }
        };

        match self.sweep(now, dry_run) {
            Ok(report) => report,
            Err(e) => {
                log::warn!("{}: cleanup failed: {e}", self.store.path().display());
                CleanupReport::failed(format!("cleanup failed: {e}"))
            }
        }
    }

    fn sweep(&self, now: DateTime<Utc>, dry_run: bool) -> Result<CleanupReport, StoreError> {
        let events = self.store.read_all()?;
        if events.is_empty() {
            return Ok(CleanupReport::default());
        }

        let cutoff = self.cutoff(now);
        let total = events.len();
        let (kept, removed): (Vec<Event>, Vec<Event>) = events
            .into_iter()
            .partition(|event| timestamp::is_at_or_after(event.timestamp(), cutoff));

        if !dry_run && !removed.is_empty() {
            if !self.store.clear() {
                return Err(StoreError::io(
                    "clear",
                    self.store.path(),
                    io::Error::other("log file could not be removed"),
                ));
            }
            for event in &kept {
                self.store.append(event)?;
            }
            log::info!(
                "{}: evicted {} events older than {}, kept {}",
                self.store.path().display(),
                removed.len(),
                timestamp::format(cutoff),
                kept.len()
            );
        }

        Ok(CleanupReport {
            removed: removed.len(),
            kept: kept.len(),
            total,
            error: None,
        })
    }

    /// Whether a sweep now would evict anything.
    pub fn should_cleanup(&self) -> bool {
        self.should_cleanup_at(Utc::now())
    }

    /// True iff the log is non-empty and its oldest event is strictly older
    /// than the cutoff for `now`. Read failures answer `false`.
    pub fn should_cleanup_at(&self, now: DateTime<Utc>) -> bool {
        let events = match self.store.read_all() {
            Ok(events) => events,
            Err(e) => {
                log::warn!("{}: {e}", self.store.path().display());
                return false;
            }
        };
        let cutoff = self.cutoff(now);
        events
            .iter()
            .map(Event::timestamp)
            .min_by(|a, b| timestamp::compare(a, b))
            .is_some_and(|oldest| !timestamp::is_at_or_after(oldest, cutoff))
    }

    fn lock_sweep(&self) -> io::Result<Option<File>> {
        match self.lock_mode {
            LockMode::None => Ok(None),
            LockMode::Flock => {
                let file = OpenOptions::new()
                    .create(true)
                    .truncate(false)
                    .write(true)
                    .open(sweep_lock_path(self.store.path()))?;
                file.try_lock_exclusive()?;
                Ok(Some(file))
            }
        }
    }
}

/// Sidecar lock file used to serialize sweeps: `<log path>.sweep.lock`.
pub fn sweep_lock_path(log_path: &Path) -> PathBuf {
    let mut name = OsString::from(log_path.as_os_str());
    name.push(".sweep.lock");
    PathBuf::from(name)
}
