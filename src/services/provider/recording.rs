use std::fs;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use crate::models::event_source::{EventProviderType, EventSource};
use crate::models::query_result::{EventRow, QueryResult, QueryResultsStorage};
use crate::utils::date::Clock;

use super::{EventRows, EventStore, InstanceQuery, ProviderError};

/// Wraps a store and records every row it hands out, stamped with the
/// clock's "now".
///
/// Recorded results can be saved and later replayed through
/// [`super::MemoryEventStore::from_results`].
pub struct RecordingEventStore<S: EventStore> {
    inner: S,
    widget_id: u32,
    clock: Clock,
    storage: Mutex<QueryResultsStorage>,
}

impl<S: EventStore> RecordingEventStore<S> {
    pub fn new(inner: S, widget_id: u32, clock: Clock) -> Self {
        Self {
            inner,
            widget_id,
            clock,
            storage: Mutex::new(QueryResultsStorage::new()),
        }
    }

    /// Copy of everything recorded so far.
    pub fn results(&self) -> QueryResultsStorage {
        self.storage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded results, leaving the recorder empty.
    pub fn take_results(&self) -> QueryResultsStorage {
        std::mem::take(&mut *self.storage.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl<S: EventStore> EventStore for RecordingEventStore<S> {
    fn has_access(&self) -> bool {
        self.inner.has_access()
    }

    fn instances(&self, query: &InstanceQuery) -> Result<EventRows, ProviderError> {
        let rows: Vec<EventRow> = self.inner.instances(query)?.collect();

        let mut result = QueryResult::new(
            EventProviderType::Calendar,
            self.widget_id,
            self.clock.now(),
            query.window.start,
            query.window.end,
        );
        result.rows = rows.clone();
        self.storage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .add_result(result);

        Ok(Box::new(rows.into_iter()))
    }

    fn calendars(&self) -> Result<Vec<EventSource>, ProviderError> {
        self.inner.calendars()
    }
}

/// Load recorded results; a missing file gives empty storage.
pub fn load_results(path: &Path) -> Result<QueryResultsStorage> {
    if !path.exists() {
        return Ok(QueryResultsStorage::default());
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read query results from {}", path.display()))?;
    QueryResultsStorage::from_json(&data)
        .with_context(|| format!("failed to deserialize query results from {}", path.display()))
}

pub fn save_results(path: &Path, storage: &QueryResultsStorage) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create dir {}", parent.display()))?;
    }

    let data = storage.to_json()?;
    fs::write(path, data)
        .with_context(|| format!("failed to write query results to {}", path.display()))?;
    Ok(())
}
