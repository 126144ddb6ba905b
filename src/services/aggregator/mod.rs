//! List assembly.
//!
//! One rebuild runs these stages in order: collect from every provider in
//! registration order, sort, drop hidden entries, optionally drop duplicates,
//! cap the number of real entries, tag the first upcoming entry, then inject
//! the current-time line, day headers and the terminal entry.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::entry::{
    sort_entries, LastEntryType, TimeSection, WidgetEntry, WidgetEntryPosition,
};
use crate::models::settings::AgendaSettings;
use crate::services::dedup::filter_out_duplicates;
use crate::services::provider::{EventProvider, QueryContext};
use crate::utils::date::Clock;

/// Providers of one widget and the pipeline that merges their entries.
#[derive(Default)]
pub struct EntryAggregator {
    providers: Vec<Box<dyn EventProvider>>,
}

impl EntryAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: impl EventProvider + 'static) -> Self {
        self.register(Box::new(provider));
        self
    }

    pub fn register(&mut self, provider: Box<dyn EventProvider>) {
        self.providers.push(provider);
    }

    pub fn providers(&self) -> &[Box<dyn EventProvider>] {
        &self.providers
    }

    /// True when any registered provider cannot read its store.
    pub fn is_permission_needed(&self) -> bool {
        self.providers
            .iter()
            .any(|provider| provider.is_permission_needed())
    }

    /// Build a complete list for the given settings and clock.
    pub fn assemble(&self, settings: &AgendaSettings, clock: &Clock) -> Vec<WidgetEntry> {
        let ctx = QueryContext::new(settings, clock);
        let mut entries = self.collect(&ctx);
        sort_entries(&mut entries);

        entries.retain(|entry| !entry.is_hidden());
        if settings.hide_duplicates {
            entries = filter_out_duplicates(entries);
        }
        if settings.max_number_of_events > 0 {
            entries.truncate(settings.max_number_of_events);
        }
        tag_show_time_until(&mut entries, clock.now());

        if settings.show_current_time_line && !entries.is_empty() {
            entries.push(WidgetEntry::current_time(clock));
            sort_entries(&mut entries);
        }
        if settings.show_day_headers {
            entries = add_day_headers(entries, settings, clock);
        }
        if let Some(last) = last_entry(settings, clock, &entries, self.is_permission_needed()) {
            entries.push(last);
        }
        entries
    }

    fn collect(&self, ctx: &QueryContext<'_>) -> Vec<WidgetEntry> {
        let mut entries = Vec::new();
        for provider in &self.providers {
            match provider.query_entries(ctx) {
                Ok(found) => entries.extend(found),
                Err(err) => log::warn!(
                    "widget {}: {} provider failed, skipping it: {}",
                    ctx.settings.widget_id,
                    provider.provider_type(),
                    err
                ),
            }
        }
        if ctx.settings.log_events {
            log::info!("collected {} entries", entries.len());
        }
        entries
    }
}

/// Flag the first entry at or after `now`.
pub fn tag_show_time_until(entries: &mut [WidgetEntry], now: DateTime<Utc>) {
    if let Some(entry) = entries.iter_mut().find(|entry| entry.entry_date() >= now) {
        entry.mark_show_time_until();
    }
}

/// Insert a header before each new day, plus one header each for the
/// past-and-due block and the end-of-list block.
pub fn add_day_headers(
    entries: Vec<WidgetEntry>,
    settings: &AgendaSettings,
    clock: &Clock,
) -> Vec<WidgetEntry> {
    let mut out = Vec::with_capacity(entries.len() * 2);
    // Day bucket of the last emitted header; None until the first one
    let mut bucket: Option<NaiveDate> = None;
    let mut past_header_added = false;
    let mut end_header_added = false;

    for entry in entries {
        match entry.position() {
            WidgetEntryPosition::PastAndDue => {
                if !past_header_added {
                    let header = WidgetEntry::past_and_due_header(clock);
                    bucket = Some(header.entry_day());
                    out.push(header);
                    past_header_added = true;
                }
            }
            WidgetEntryPosition::EndOfList => {
                if !end_header_added {
                    let header = WidgetEntry::end_of_list_header(clock);
                    bucket = Some(header.entry_day());
                    out.push(header);
                    end_header_added = true;
                }
            }
            _ => {
                let day = entry.entry_day();
                if bucket != Some(day) {
                    if settings.show_days_without_events {
                        add_empty_days(&mut out, clock, bucket, day);
                    }
                    out.push(WidgetEntry::day_header(clock, day));
                    bucket = Some(day);
                }
            }
        }
        out.push(entry);
    }
    out
}

fn add_empty_days(
    out: &mut Vec<WidgetEntry>,
    clock: &Clock,
    from_exclusive: Option<NaiveDate>,
    to_exclusive: NaiveDate,
) {
    let today = clock.today();
    let mut day = from_exclusive
        .and_then(|day| day.succ_opt())
        .map_or(today, |day| day.max(today));
    while day < to_exclusive {
        out.push(WidgetEntry::day_header(clock, day));
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
}

/// Terminal entry for the assembled list, if one is due.
pub fn last_entry(
    settings: &AgendaSettings,
    clock: &Clock,
    entries: &[WidgetEntry],
    permission_needed: bool,
) -> Option<WidgetEntry> {
    let last_type = if entries.is_empty() {
        if permission_needed {
            LastEntryType::NoPermissions
        } else {
            LastEntryType::Empty
        }
    } else if settings.show_end_of_list {
        LastEntryType::EndOfList
    } else {
        return None;
    };
    Some(WidgetEntry::last(clock, last_type))
}

/// Index "go to today" scrolls to.
pub fn todays_position(entries: &[WidgetEntry]) -> Option<usize> {
    let last = entries.len().checked_sub(1)?;
    Some(
        entries[..last]
            .iter()
            .position(|entry| entry.time_section() != TimeSection::Past)
            .unwrap_or(last),
    )
}

/// Index "go to tomorrow" scrolls to.
pub fn tomorrows_position(entries: &[WidgetEntry]) -> Option<usize> {
    let last = entries.len().checked_sub(1)?;
    Some(
        entries[..last]
            .iter()
            .position(|entry| entry.time_section() == TimeSection::Future)
            .unwrap_or(0),
    )
}
