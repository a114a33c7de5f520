use crate::error::StoreError;
use crate::store::EpisodeStore;
use crate::timestamp;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Summary of a log's contents, built from [`EpisodeStore::events`].
///
/// Only parseable events are counted; compare `total_events` with
/// [`EpisodeStore::count`] to detect corrupt lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogStats {
    pub total_events: usize,
    /// Event count per `event_type` tag.
    pub by_kind: BTreeMap<String, usize>,
    /// Event count per producer.
    pub by_producer: BTreeMap<String, usize>,
    pub oldest: Option<String>,
    pub newest: Option<String>,
    pub storage_path: PathBuf,
}

impl LogStats {
    pub fn collect(store: &EpisodeStore) -> Result<Self, StoreError> {
        let mut stats = LogStats {
            storage_path: store.path().to_path_buf(),
            ..LogStats::default()
        };

        for event in store.events()? {
            let event = event?;
            stats.total_events += 1;
            *stats.by_kind.entry(event.kind().to_string()).or_insert(0) += 1;
            *stats
                .by_producer
                .entry(event.producer().to_string())
                .or_insert(0) += 1;

            let ts = event.timestamp();
            if stats
                .oldest
                .as_deref()
                .is_none_or(|old| timestamp::compare(ts, old) == Ordering::Less)
            {
                stats.oldest = Some(ts.to_string());
            }
            if stats
                .newest
                .as_deref()
                .is_none_or(|new| timestamp::compare(ts, new) == Ordering::Greater)
            {
                stats.newest = Some(ts.to_string());
            }
        }

        Ok(stats)
    }
}
