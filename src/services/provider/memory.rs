// In-memory stores
// Stand in for the platform stores in tests, benchmarks and replays

use std::cmp::Reverse;

use crate::models::event_source::{EventProviderType, EventSource};
use crate::models::query_result::{EventRow, QueryResultsStorage};
use crate::models::task::TaskRecord;

use super::{
    EventRows, EventStore, InstanceQuery, ProviderError, TaskStore, ATTENDEE_STATUS_DECLINED,
};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Calendar store backed by a vector of rows.
///
/// Applies the same selection a platform store does, including its
/// imprecision: the window test runs on raw stored instants, so all-day
/// rows stored at UTC midnight may leak across local day boundaries.
#[derive(Debug, Clone)]
pub struct MemoryEventStore {
    rows: Vec<EventRow>,
    calendars: Vec<EventSource>,
    access: bool,
}

impl Default for MemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            calendars: Vec::new(),
            access: true,
        }
    }

    pub fn with_rows(rows: Vec<EventRow>) -> Self {
        Self {
            rows,
            ..Self::new()
        }
    }

    /// Replays the recorded rows of one widget.
    pub fn from_results(
        storage: &QueryResultsStorage,
        provider_type: EventProviderType,
        widget_id: u32,
    ) -> Self {
        let rows = storage
            .results_of(provider_type, widget_id)
            .into_iter()
            .flat_map(|result| result.rows.iter().cloned())
            .collect();
        Self::with_rows(rows)
    }

    pub fn with_calendars(mut self, calendars: Vec<EventSource>) -> Self {
        self.calendars = calendars;
        self
    }

    pub fn without_access(mut self) -> Self {
        self.access = false;
        self
    }

    pub fn add_row(&mut self, row: EventRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[EventRow] {
        &self.rows
    }

    fn selects(query: &InstanceQuery, row: &EventRow) -> bool {
        if let Some(calendar_id) = row.calendar_id {
            if !query.calendar_ids.is_empty() && !query.calendar_ids.contains(&calendar_id) {
                return false;
            }
        }
        if row.self_attendee_status == Some(ATTENDEE_STATUS_DECLINED) {
            return false;
        }
        if query.only_default_color
            && (row.display_color.is_none() || row.display_color != row.calendar_color)
        {
            return false;
        }
        match row.begin {
            Some(begin) => {
                let end = row.end.unwrap_or(begin).max(begin);
                begin <= query.window.end.timestamp_millis()
                    && end >= query.window.start.timestamp_millis()
            }
            None => true,
        }
    }
}

impl EventStore for MemoryEventStore {
    fn has_access(&self) -> bool {
        self.access
    }

    fn instances(&self, query: &InstanceQuery) -> Result<EventRows, ProviderError> {
        if !self.access {
            return Err(ProviderError::PermissionDenied(
                "calendar store is not readable".to_string(),
            ));
        }
        let mut selected: Vec<EventRow> = self
            .rows
            .iter()
            .filter(|row| Self::selects(query, row))
            .cloned()
            .collect();
        selected.sort_by_key(|row| {
            (
                row.begin.map(|begin| begin.div_euclid(MILLIS_PER_DAY)),
                Reverse(row.all_day.unwrap_or(0)),
                row.begin,
            )
        });
        Ok(Box::new(selected.into_iter()))
    }

    fn calendars(&self) -> Result<Vec<EventSource>, ProviderError> {
        Ok(self.calendars.clone())
    }
}

/// Task store backed by a vector of tasks.
#[derive(Debug, Clone)]
pub struct MemoryTaskStore {
    tasks: Vec<TaskRecord>,
    lists: Vec<EventSource>,
    access: bool,
}

impl MemoryTaskStore {
    pub fn new(tasks: Vec<TaskRecord>) -> Self {
        Self {
            tasks,
            lists: Vec::new(),
            access: true,
        }
    }

    pub fn with_lists(mut self, lists: Vec<EventSource>) -> Self {
        self.lists = lists;
        self
    }

    pub fn without_access(mut self) -> Self {
        self.access = false;
        self
    }
}

impl TaskStore for MemoryTaskStore {
    fn has_access(&self) -> bool {
        self.access
    }

    fn tasks(&self, list_ids: &[i64]) -> Result<Vec<TaskRecord>, ProviderError> {
        Ok(self
            .tasks
            .iter()
            .filter(|task| list_ids.is_empty() || list_ids.contains(&task.source.source_id))
            .cloned()
            .collect())
    }

    fn task_lists(&self) -> Result<Vec<EventSource>, ProviderError> {
        Ok(self.lists.clone())
    }
}
