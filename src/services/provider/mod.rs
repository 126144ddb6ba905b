//! Event providers and the stores they read from.
//!
//! A store is the external collaborator: it answers instance queries with
//! raw rows. A provider turns those rows into normalized records and list
//! entries for one provider type.

use std::sync::Arc;

use thiserror::Error;

use crate::models::entry::WidgetEntry;
use crate::models::event_source::{EventProviderType, EventSource};
use crate::models::query_result::EventRow;
use crate::models::settings::{AgendaSettings, SettingsError};
use crate::models::task::TaskRecord;
use crate::services::window::TimeWindow;
use crate::utils::date::Clock;

pub mod calendar;
pub mod memory;
pub mod recording;
pub mod tasks;

pub use calendar::CalendarEventProvider;
pub use memory::{MemoryEventStore, MemoryTaskStore};
pub use recording::RecordingEventStore;
pub use tasks::TaskProvider;

/// Self-attendee status of a declined invitation.
pub const ATTENDEE_STATUS_DECLINED: i32 = 2;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Store I/O error: {0}")]
    Io(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Rows streamed back by a store.
pub type EventRows = Box<dyn Iterator<Item = EventRow> + Send>;

/// Instance query understood by every [`EventStore`].
///
/// Stores always leave out instances the user declined; instances without an
/// attendee status (subscribed calendars) are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceQuery {
    pub window: TimeWindow,
    /// Empty means every calendar.
    pub calendar_ids: Vec<i64>,
    /// Only instances whose display color is their calendar's color.
    pub only_default_color: bool,
}

impl InstanceQuery {
    pub fn new(window: TimeWindow, calendar_ids: Vec<i64>) -> Self {
        Self {
            window,
            calendar_ids,
            only_default_color: false,
        }
    }

    pub fn with_default_color_only(mut self) -> Self {
        self.only_default_color = true;
        self
    }
}

/// Backing store of calendar instances.
#[cfg_attr(test, mockall::automock)]
pub trait EventStore: Send + Sync {
    /// False when the store may not be read.
    fn has_access(&self) -> bool;

    /// Instances overlapping the query window, ordered by day, all-day
    /// first, then start.
    fn instances(&self, query: &InstanceQuery) -> Result<EventRows, ProviderError>;

    fn calendars(&self) -> Result<Vec<EventSource>, ProviderError>;
}

impl<S: EventStore + ?Sized> EventStore for Arc<S> {
    fn has_access(&self) -> bool {
        (**self).has_access()
    }

    fn instances(&self, query: &InstanceQuery) -> Result<EventRows, ProviderError> {
        (**self).instances(query)
    }

    fn calendars(&self) -> Result<Vec<EventSource>, ProviderError> {
        (**self).calendars()
    }
}

/// Backing store of tasks.
pub trait TaskStore: Send + Sync {
    fn has_access(&self) -> bool;

    /// Tasks of the given lists; empty means every list.
    fn tasks(&self, list_ids: &[i64]) -> Result<Vec<TaskRecord>, ProviderError>;

    fn task_lists(&self) -> Result<Vec<EventSource>, ProviderError>;
}

/// Everything a provider needs for one rebuild.
#[derive(Debug, Clone, Copy)]
pub struct QueryContext<'a> {
    pub settings: &'a AgendaSettings,
    pub clock: &'a Clock,
}

impl<'a> QueryContext<'a> {
    pub fn new(settings: &'a AgendaSettings, clock: &'a Clock) -> Self {
        Self { settings, clock }
    }
}

/// A source of list entries of one provider type.
pub trait EventProvider: Send + Sync {
    fn provider_type(&self) -> EventProviderType;

    /// Entries for the current settings. A provider without access or
    /// without active sources returns an empty list.
    fn query_entries(&self, ctx: &QueryContext<'_>) -> Result<Vec<WidgetEntry>, ProviderError>;

    /// Calendars or lists the user could activate.
    fn fetch_available_sources(&self) -> Result<Vec<EventSource>, ProviderError>;

    /// True when the provider cannot read its store.
    fn is_permission_needed(&self) -> bool {
        false
    }
}

fn log_entries(settings: &AgendaSettings, tag: &str, entries: &[WidgetEntry]) {
    if !settings.log_events {
        return;
    }
    log::info!("{}: {} entries", tag, entries.len());
    for (index, entry) in entries.iter().enumerate() {
        log::info!("{}: {}. {}", tag, index + 1, entry);
    }
}
