// Rendering seam
//
// Entries are drawn by handlers looked up per entry kind. An entry whose
// kind has no handler is logged and skipped.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::entry::{EntryKind, EntryPayload, LastEntryType, WidgetEntry, WidgetEntryPosition};
use crate::models::event::{EventRecord, EventStatus};
use crate::models::task::TaskRecord;
use crate::utils::date::Clock;

/// Draws entries of one or more kinds.
pub trait EntryRenderer: Send + Sync {
    fn render(&self, entry: &WidgetEntry, clock: &Clock) -> String;
}

/// Handler per entry kind.
#[derive(Default)]
pub struct RenderTable {
    handlers: HashMap<EntryKind, Box<dyn EntryRenderer>>,
}

impl RenderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with [`TextRenderer`] for every kind.
    pub fn text() -> Self {
        let mut table = Self::new();
        for kind in [
            EntryKind::DayHeader,
            EntryKind::Calendar,
            EntryKind::Task,
            EntryKind::CurrentTime,
            EntryKind::Last,
        ] {
            table.register(kind, Box::new(TextRenderer));
        }
        table
    }

    pub fn register(&mut self, kind: EntryKind, renderer: Box<dyn EntryRenderer>) {
        self.handlers.insert(kind, renderer);
    }

    pub fn handles(&self, kind: EntryKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn render(&self, entry: &WidgetEntry, clock: &Clock) -> Option<String> {
        match self.handlers.get(&entry.kind()) {
            Some(renderer) => Some(renderer.render(entry, clock)),
            None => {
                log::warn!("No renderer for {:?} entry, skipping: {}", entry.kind(), entry);
                None
            }
        }
    }

    pub fn render_all(&self, entries: &[WidgetEntry], clock: &Clock) -> Vec<String> {
        entries
            .iter()
            .filter_map(|entry| self.render(entry, clock))
            .collect()
    }
}

/// One plain text line per entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl EntryRenderer for TextRenderer {
    fn render(&self, entry: &WidgetEntry, clock: &Clock) -> String {
        let line = match entry.payload() {
            EntryPayload::DayHeader => day_header_line(entry, clock),
            EntryPayload::Calendar(event) => event_line(event, clock),
            EntryPayload::Task(task) => task_line(task, clock),
            EntryPayload::CurrentTime => {
                format!("  ---- {} ----", local_time(clock, clock.now()))
            }
            EntryPayload::Last(LastEntryType::NoPermissions) => {
                "No permission to read events".to_string()
            }
            EntryPayload::Last(LastEntryType::Empty) => "No events".to_string(),
            EntryPayload::Last(LastEntryType::EndOfList) => "End of list".to_string(),
        };
        if entry.show_time_until() {
            format!("{} ({})", line, time_until(clock.minutes_to(entry.entry_date())))
        } else {
            line
        }
    }
}

fn local_time(clock: &Clock, instant: DateTime<Utc>) -> String {
    instant.with_timezone(&clock.zone()).format("%H:%M").to_string()
}

fn day_header_line(entry: &WidgetEntry, clock: &Clock) -> String {
    match entry.position() {
        WidgetEntryPosition::PastAndDueHeader => "Past and due".to_string(),
        WidgetEntryPosition::EndOfListHeader => "No due date".to_string(),
        _ => {
            let day = entry.entry_day();
            let today = clock.today();
            if day == today {
                "Today".to_string()
            } else if today.succ_opt() == Some(day) {
                "Tomorrow".to_string()
            } else if today.pred_opt() == Some(day) {
                "Yesterday".to_string()
            } else {
                day.format("%A, %B %-d").to_string()
            }
        }
    }
}

fn event_line(event: &EventRecord, clock: &Clock) -> String {
    let when = if event.all_day {
        "all day".to_string()
    } else {
        match event.end {
            Some(end) if end != event.start => {
                format!("{}-{}", local_time(clock, event.start), local_time(clock, end))
            }
            _ => local_time(clock, event.start),
        }
    };
    let mut line = format!("  {:<11} {}", when, event.title);
    if let Some(location) = event.location.as_deref().filter(|l| !l.is_empty()) {
        line.push_str(&format!(" @ {}", location));
    }
    if event.status == EventStatus::Canceled {
        line.push_str(" [cancelled]");
    }
    line
}

fn task_line(task: &TaskRecord, clock: &Clock) -> String {
    let mark = if task.completed { "[x]" } else { "[ ]" };
    match task.due {
        Some(due) => format!("  {} {} (due {})", mark, task.title, local_time(clock, due)),
        None => format!("  {} {}", mark, task.title),
    }
}

fn time_until(minutes: i64) -> String {
    let minutes = minutes.max(0);
    let (days, hours, mins) = (minutes / 1440, minutes % 1440 / 60, minutes % 60);
    if days > 0 {
        format!("in {}d {}h", days, hours)
    } else if hours > 0 {
        format!("in {}h {}m", hours, mins)
    } else {
        format!("in {}m", mins)
    }
}
