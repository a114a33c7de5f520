use crate::error::StoreError;
use crate::event::{Event, EventKind};
use crate::timestamp;
use std::cmp::Ordering;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Split, Write};
use std::path::{Path, PathBuf};

/// Append-only, line-oriented store of [`Event`]s.
///
/// The file holds one JSON record per line. The store keeps no open handle:
/// every operation opens the file, does its work and closes it, so any
/// number of `EpisodeStore` values (in any number of threads or processes)
/// may share one path.
///
/// Only [`EpisodeStore::append`] is safe under arbitrary concurrency. Each
/// append is one `write_all` of a complete line on an append-mode handle,
/// so concurrent records land whole. That holds for local filesystems and
/// lines within the platform's atomic write size; nothing stronger is
/// promised.
#[derive(Debug, Clone)]
pub struct EpisodeStore {
    path: PathBuf,
}

impl EpisodeStore {
    /// Open a store backed by the file at `path`.
    ///
    /// Creates the parent directory if missing. The log file itself is
    /// created lazily by the first append.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io("create directory", parent, e))?;
        }
        Ok(EpisodeStore { path })
    }

    /// Returns the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate `event` and append it as one line.
    ///
    /// The whole line goes out in a single write and is synced to disk
    /// before returning. If the file ends in a torn record (no trailing
    /// newline), a newline is prepended so the new record starts on its
    /// own line.
    ///
    /// # Errors
    ///
    /// [`StoreError::Schema`] if the event fails validation (nothing is
    /// written), [`StoreError::Io`] if the file cannot be opened or written.
    pub fn append(&self, event: &Event) -> Result<(), StoreError> {
        event.validate()?;

        let mut line = event.to_text();
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&self.path)
            .map_err(|e| StoreError::io("open", &self.path, e))?;

        if ends_mid_line(&mut file).map_err(|e| StoreError::io("inspect", &self.path, e))? {
            log::warn!(
                "{}: log ends with a partial record, starting a new line",
                self.path.display()
            );
            line.insert(0, '\n');
        }

        file.write_all(line.as_bytes())
            .map_err(|e| StoreError::io("append to", &self.path, e))?;
        file.sync_data()
            .map_err(|e| StoreError::io("sync", &self.path, e))?;

        log::debug!(
            "{}: appended {} event from {}",
            self.path.display(),
            event.kind(),
            event.producer()
        );
        Ok(())
    }

    /// Iterate over stored events in append order.
    ///
    /// Blank lines are skipped. Lines that are not valid UTF-8 or fail schema
    /// parsing are logged and skipped; they never end the iteration. Only
    /// I/O errors are yielded as `Err`. A missing file yields nothing.
    pub fn events(&self) -> Result<Events, StoreError> {
        let lines = match File::open(&self.path) {
            Ok(file) => Some(BufReader::new(file).split(b'\n')),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(StoreError::io("open", &self.path, e)),
        };
        Ok(Events {
            lines,
            line_no: 0,
            path: self.path.clone(),
        })
    }

    /// Every parseable event, in append order. Empty if the file is absent.
    pub fn read_all(&self) -> Result<Vec<Event>, StoreError> {
        self.events()?.collect()
    }

    /// Events whose timestamp is at or after `since`.
    ///
    /// Timestamps are compared chronologically when both sides parse as
    /// ISO-8601, so mixed precision does not misorder; unparseable values
    /// fall back to string comparison.
    pub fn read_since(&self, since: &str) -> Result<Vec<Event>, StoreError> {
        self.filtered(|event| timestamp::compare(event.timestamp(), since) != Ordering::Less)
    }

    pub fn read_by_kind(&self, kind: EventKind) -> Result<Vec<Event>, StoreError> {
        self.filtered(|event| event.kind() == kind)
    }

    pub fn read_by_producer(&self, producer: &str) -> Result<Vec<Event>, StoreError> {
        self.filtered(|event| event.producer() == producer)
    }

    fn filtered(&self, keep: impl Fn(&Event) -> bool) -> Result<Vec<Event>, StoreError> {
        let mut out = Vec::new();
        for event in self.events()? {
            let event = event?;
            if keep(&event) {
                out.push(event);
            }
        }
        Ok(out)
    }

    /// Number of non-blank lines, corrupt ones included.
    ///
    /// Returns 0 if the file is absent or cannot be read.
    pub fn count(&self) -> usize {
        match self.count_lines() {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => {
                log::warn!("{}: count failed: {e}", self.path.display());
                0
            }
        }
    }

    fn count_lines(&self) -> io::Result<usize> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut n = 0;
        for line in reader.split(b'\n') {
            if line?.iter().any(|b| !b.is_ascii_whitespace()) {
                n += 1;
            }
        }
        Ok(n)
    }

    /// Delete the log file. Best effort: returns `false` instead of an error.
    ///
    /// Idempotent: clearing an absent log succeeds.
    pub fn clear(&self) -> bool {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                log::debug!("{}: cleared", self.path.display());
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => {
                log::warn!("{}: clear failed: {e}", self.path.display());
                false
            }
        }
    }
}

/// Whether a non-empty file's last byte is something other than `\n`.
fn ends_mid_line(file: &mut File) -> io::Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Iterator returned by [`EpisodeStore::events`].
pub struct Events {
    lines: Option<Split<BufReader<File>>>,
    line_no: usize,
    path: PathBuf,
}

impl Iterator for Events {
    type Item = Result<Event, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let lines = self.lines.as_mut()?;
        loop {
            let bytes = match lines.next()? {
                Ok(bytes) => bytes,
                Err(e) => return Some(Err(StoreError::io("read", &self.path, e))),
            };
            self.line_no += 1;

            let Ok(text) = std::str::from_utf8(&bytes) else {
                log::warn!(
                    "{}: skipping line {}: not valid UTF-8",
                    self.path.display(),
                    self.line_no
                );
                continue;
            };
            let text = text.trim();
            if text.is_empty() {
                continue;
            }

            match Event::from_text(text) {
                Ok(event) => return Some(Ok(event)),
                Err(e) => {
                    log::warn!(
                        "{}: skipping line {}: {e}",
                        self.path.display(),
                        self.line_no
                    );
                }
            }
        }
    }
}
