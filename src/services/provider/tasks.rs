use crate::models::entry::WidgetEntry;
use crate::models::event_source::{EventProviderType, EventSource};
use crate::models::settings::FilterMode;
use crate::models::task::TaskRecord;
use crate::services::filter::SourceFilter;

use super::{log_entries, EventProvider, ProviderError, QueryContext, TaskStore};

/// Tasks of the active task lists.
///
/// Completed tasks are kept here and hidden by the aggregator; tasks due
/// after the window end are dropped unless filtering is off.
pub struct TaskProvider<T: TaskStore> {
    store: T,
}

impl<T: TaskStore> TaskProvider<T> {
    pub fn new(store: T) -> Self {
        Self { store }
    }

    pub fn query_tasks(&self, ctx: &QueryContext<'_>) -> Result<Vec<TaskRecord>, ProviderError> {
        let settings = ctx.settings;
        if !self.store.has_access() {
            log::warn!("widget {}: no access to task store", settings.widget_id);
            return Ok(Vec::new());
        }
        let list_ids: Vec<i64> = settings
            .active_sources_of(EventProviderType::Tasks)
            .into_iter()
            .map(|source| source.source_id)
            .collect();
        if list_ids.is_empty() {
            return Ok(Vec::new());
        }

        let filter = SourceFilter::from_settings(settings)?;
        let window_end = settings.end_of_time_range(ctx.clock);

        let tasks = self
            .store
            .tasks(&list_ids)?
            .into_iter()
            .filter(|task| filter.retains(&task.title))
            .filter(|task| {
                settings.filter_mode == FilterMode::NoFiltering
                    || task.entry_time().map_or(true, |time| time < window_end)
            })
            .map(|mut task| {
                task.source = settings.active_source(EventProviderType::Tasks, task.source.source_id);
                task
            })
            .collect();
        Ok(tasks)
    }
}

impl<T: TaskStore> EventProvider for TaskProvider<T> {
    fn provider_type(&self) -> EventProviderType {
        EventProviderType::Tasks
    }

    fn query_entries(&self, ctx: &QueryContext<'_>) -> Result<Vec<WidgetEntry>, ProviderError> {
        let entries: Vec<WidgetEntry> = self
            .query_tasks(ctx)?
            .into_iter()
            .map(|task| WidgetEntry::from_task(ctx.settings, ctx.clock, task))
            .collect();
        log_entries(ctx.settings, "tasks", &entries);
        Ok(entries)
    }

    fn fetch_available_sources(&self) -> Result<Vec<EventSource>, ProviderError> {
        if !self.store.has_access() {
            return Err(ProviderError::PermissionDenied(
                "task store is not readable".to_string(),
            ));
        }
        self.store.task_lists()
    }

    fn is_permission_needed(&self) -> bool {
        !self.store.has_access()
    }
}
