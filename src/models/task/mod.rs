// Task module
// Task list items shown alongside calendar events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::event_source::OrderedEventSource;

/// A task from a task list; undated tasks are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: i64,
    pub source: OrderedEventSource,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    /// Opaque ARGB color.
    pub color: u32,
}

impl TaskRecord {
    pub fn new(task_id: i64, source: OrderedEventSource, title: impl Into<String>) -> Self {
        Self {
            task_id,
            source,
            title: title.into(),
            start: None,
            due: None,
            completed: false,
            color: crate::models::event::as_opaque(0),
        }
    }

    pub fn with_due(mut self, due: DateTime<Utc>) -> Self {
        self.due = Some(due);
        self
    }

    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn completed(mut self) -> Self {
        self.completed = true;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if let (Some(start), Some(due)) = (self.start, self.due) {
            if due < start {
                return Err("Task due time cannot be before its start".to_string());
            }
        }
        Ok(())
    }

    pub fn is_undated(&self) -> bool {
        self.due.is_none() && self.start.is_none()
    }

    /// Instant the task is listed at: its due time, else its start.
    pub fn entry_time(&self) -> Option<DateTime<Utc>> {
        self.due.or(self.start)
    }
}
