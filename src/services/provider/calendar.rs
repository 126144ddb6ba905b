use chrono::{DateTime, Utc};

use crate::models::entry::WidgetEntry;
use crate::models::event::{as_opaque, EventRecord, EventStatus};
use crate::models::event_source::{EventProviderType, EventSource};
use crate::models::query_result::EventRow;
use crate::models::settings::{AgendaSettings, FilterMode};
use crate::services::dedup::{collapse_to_closest_instance, push_unique};
use crate::services::filter::SourceFilter;
use crate::services::window::{TimeWindow, TimeWindowResolver};
use crate::utils::date::{datetime_min, Clock};

use super::{log_entries, EventProvider, EventStore, InstanceQuery, ProviderError, QueryContext};

/// Calendar events of the active calendars, filtered and collapsed per the
/// widget settings.
pub struct CalendarEventProvider<S: EventStore> {
    store: S,
}

impl<S: EventStore> CalendarEventProvider<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Events for the current settings; never fails.
    ///
    /// Missing permission and "no active calendars" both give an empty list;
    /// store failures are logged and give an empty list too.
    pub fn query_events(&self, ctx: &QueryContext<'_>) -> Vec<EventRecord> {
        match self.try_query_events(ctx) {
            Ok(events) => events,
            Err(err) => {
                log::warn!(
                    "widget {}: calendar query failed, showing no events: {}",
                    ctx.settings.widget_id,
                    err
                );
                Vec::new()
            }
        }
    }

    fn try_query_events(&self, ctx: &QueryContext<'_>) -> Result<Vec<EventRecord>, ProviderError> {
        let settings = ctx.settings;
        if !self.store.has_access() {
            log::warn!("widget {}: no access to calendar store", settings.widget_id);
            return Ok(Vec::new());
        }
        let calendar_ids = active_calendar_ids(settings);
        if calendar_ids.is_empty() {
            return Ok(Vec::new());
        }

        let filter = SourceFilter::from_settings(settings)?;
        let resolver = TimeWindowResolver::from_settings(settings, ctx.clock);
        let query = InstanceQuery::new(resolver.query_window(), calendar_ids.clone());

        let mut events = self.query_list(&query, ctx, &filter)?;
        log::debug!(
            "widget {}: start {} (before correction {}), end {}, got {} events",
            settings.widget_id,
            query.window.start.to_rfc3339(),
            resolver.nominal().start.to_rfc3339(),
            query.window.end.to_rfc3339(),
            events.len()
        );
        resolver.retain_in_window(&mut events);

        if settings.show_past_events_with_default_color {
            self.add_past_events_with_default_color(&mut events, calendar_ids, ctx, &filter)?;
        }

        if settings.filter_mode != FilterMode::NoFiltering
            && settings.show_only_closest_instance_of_recurring_event
        {
            collapse_to_closest_instance(&mut events, ctx.clock);
        }

        Ok(events)
    }

    fn add_past_events_with_default_color(
        &self,
        events: &mut Vec<EventRecord>,
        calendar_ids: Vec<i64>,
        ctx: &QueryContext<'_>,
        filter: &SourceFilter,
    ) -> Result<(), ProviderError> {
        let query = InstanceQuery::new(TimeWindow::new(datetime_min(), ctx.clock.now()), calendar_ids)
            .with_default_color_only();
        let past = self.query_list(&query, ctx, filter)?;

        for event in past {
            if ctx.settings.filter_mode == FilterMode::Debug && !event.has_default_calendar_color() {
                continue;
            }
            events.retain(|existing| existing != &event);
            events.push(event);
        }
        Ok(())
    }

    /// Fold the store's rows into unique, keyword-filtered records.
    fn query_list(
        &self,
        query: &InstanceQuery,
        ctx: &QueryContext<'_>,
        filter: &SourceFilter,
    ) -> Result<Vec<EventRecord>, ProviderError> {
        let rows = self.store.instances(query)?;
        Ok(rows.fold(Vec::new(), |mut events, row| {
            if let Some(event) = event_from_row(&row, ctx.settings, ctx.clock) {
                if filter.retains(&event.title) {
                    push_unique(&mut events, event);
                }
            }
            events
        }))
    }
}

impl<S: EventStore> EventProvider for CalendarEventProvider<S> {
    fn provider_type(&self) -> EventProviderType {
        EventProviderType::Calendar
    }

    fn query_entries(&self, ctx: &QueryContext<'_>) -> Result<Vec<WidgetEntry>, ProviderError> {
        let entries: Vec<WidgetEntry> = self
            .query_events(ctx)
            .into_iter()
            .map(|event| WidgetEntry::from_event(ctx.settings, ctx.clock, event))
            .collect();
        log_entries(ctx.settings, "calendar", &entries);
        Ok(entries)
    }

    fn fetch_available_sources(&self) -> Result<Vec<EventSource>, ProviderError> {
        if !self.store.has_access() {
            return Err(ProviderError::PermissionDenied(
                "calendar store is not readable".to_string(),
            ));
        }
        self.store.calendars()
    }

    fn is_permission_needed(&self) -> bool {
        !self.store.has_access()
    }
}

fn active_calendar_ids(settings: &AgendaSettings) -> Vec<i64> {
    settings
        .active_sources_of(EventProviderType::Calendar)
        .into_iter()
        .map(|source| source.source_id)
        .collect()
}

fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// All-day instances are stored at UTC midnight; place them at the start of
/// the same calendar date in the widget's zone.
fn all_day_instant(instant: DateTime<Utc>, clock: &Clock) -> DateTime<Utc> {
    clock.start_of_day(instant.date_naive())
}

/// Normalize one raw row. Rows without a usable start are skipped.
pub fn event_from_row(row: &EventRow, settings: &AgendaSettings, clock: &Clock) -> Option<EventRecord> {
    let Some(begin) = row.begin.and_then(from_millis) else {
        log::warn!(
            "Skipping calendar row without start, event id {:?}",
            row.event_id
        );
        return None;
    };
    let all_day = row.all_day.unwrap_or(0) > 0;
    let end = row.end.and_then(from_millis);

    let (start, end) = if all_day {
        (
            all_day_instant(begin, clock),
            end.map(|end| all_day_instant(end, clock)),
        )
    } else {
        (begin, end)
    };
    let end = end.map(|end| end.max(start));

    let source = settings.active_source(EventProviderType::Calendar, row.calendar_id.unwrap_or(0));
    let color = as_opaque(row.display_color.unwrap_or(0) as u32);

    Some(EventRecord {
        event_id: row.event_id.unwrap_or(0),
        source,
        title: row.title.clone().unwrap_or_default(),
        start,
        end,
        all_day,
        color,
        calendar_color: row.calendar_color.map(|color| as_opaque(color as u32)),
        location: row.event_location.clone(),
        description: row.description.clone(),
        alarm_active: row.has_alarm.unwrap_or(0) > 0,
        recurring: row.rrule.is_some(),
        status: EventStatus::from_code(row.status),
    })
}
