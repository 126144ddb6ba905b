//! Entries of the assembled agenda list.
//!
//! Real entries wrap an event or a task; structural entries (day headers,
//! the current-time line and the terminal entry) are synthesized during
//! assembly and always carry entry id 0.

use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::event::{EventRecord, EventStatus};
use crate::models::settings::AgendaSettings;
use crate::models::task::TaskRecord;
use crate::utils::date::{datetime_max, datetime_min, Clock};

static NEXT_ENTRY_ID: AtomicU64 = AtomicU64::new(1);

fn next_entry_id() -> u64 {
    NEXT_ENTRY_ID.fetch_add(1, AtomicOrdering::Relaxed)
}

/// Coarse classification used by "go to today / tomorrow".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeSection {
    Past,
    Today,
    Future,
}

/// Where an entry sits in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WidgetEntryPosition {
    PastAndDueHeader,
    PastAndDue,
    DayHeader,
    StartOfDay,
    EntryDate,
    EndOfListHeader,
    EndOfList,
    ListFooter,
}

impl WidgetEntryPosition {
    /// Blocks of the list: past-and-due, days, end of list, footer.
    pub fn group(&self) -> u8 {
        match self {
            WidgetEntryPosition::PastAndDueHeader | WidgetEntryPosition::PastAndDue => 0,
            WidgetEntryPosition::DayHeader
            | WidgetEntryPosition::StartOfDay
            | WidgetEntryPosition::EntryDate => 1,
            WidgetEntryPosition::EndOfListHeader | WidgetEntryPosition::EndOfList => 2,
            WidgetEntryPosition::ListFooter => 3,
        }
    }

    /// Order inside one day of a block.
    pub fn same_day_rank(&self) -> u8 {
        match self {
            WidgetEntryPosition::PastAndDueHeader
            | WidgetEntryPosition::DayHeader
            | WidgetEntryPosition::EndOfListHeader => 0,
            WidgetEntryPosition::StartOfDay => 1,
            WidgetEntryPosition::PastAndDue
            | WidgetEntryPosition::EntryDate
            | WidgetEntryPosition::EndOfList
            | WidgetEntryPosition::ListFooter => 2,
        }
    }

    pub fn is_header(&self) -> bool {
        self.same_day_rank() == 0
    }
}

/// Tag of an entry variant; keys the render handler table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    DayHeader,
    Calendar,
    Task,
    CurrentTime,
    Last,
}

impl EntryKind {
    fn rank(&self) -> u8 {
        match self {
            EntryKind::DayHeader => 0,
            EntryKind::CurrentTime => 1,
            EntryKind::Calendar | EntryKind::Task => 2,
            EntryKind::Last => 3,
        }
    }
}

/// What the terminal entry tells the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LastEntryType {
    NoPermissions,
    Empty,
    EndOfList,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryPayload {
    DayHeader,
    Calendar(EventRecord),
    Task(TaskRecord),
    CurrentTime,
    Last(LastEntryType),
}

/// One row of the agenda list.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetEntry {
    entry_id: u64,
    entry_date: DateTime<Utc>,
    entry_day: NaiveDate,
    position: WidgetEntryPosition,
    time_section: TimeSection,
    hidden: bool,
    show_time_until: bool,
    payload: EntryPayload,
}

impl WidgetEntry {
    fn new(
        clock: &Clock,
        entry_date: DateTime<Utc>,
        position: WidgetEntryPosition,
        payload: EntryPayload,
    ) -> Self {
        let entry_day = clock.day_of(entry_date);
        let entry_id = match payload {
            EntryPayload::Calendar(_) | EntryPayload::Task(_) => next_entry_id(),
            _ => 0,
        };
        Self {
            entry_id,
            entry_date,
            entry_day,
            position,
            time_section: time_section_of(position, entry_day, clock.today()),
            hidden: false,
            show_time_until: false,
            payload,
        }
    }

    /// Entry for one calendar event occurrence.
    pub fn from_event(settings: &AgendaSettings, clock: &Clock, event: EventRecord) -> Self {
        let start_of_today = clock.start_of_today();
        let (position, entry_date) = if settings.show_past_events_under_one_header
            && event.start < start_of_today
            && event.end_or_start() <= start_of_today
        {
            (WidgetEntryPosition::PastAndDue, event.start)
        } else if event.start < start_of_today && event.end_or_start() > start_of_today {
            // Still running: listed on today
            (WidgetEntryPosition::StartOfDay, start_of_today)
        } else if event.all_day {
            (WidgetEntryPosition::StartOfDay, event.start)
        } else {
            (WidgetEntryPosition::EntryDate, event.start)
        };
        let hidden = event.status == EventStatus::Canceled && !settings.show_cancelled_events;

        let mut entry = Self::new(clock, entry_date, position, EntryPayload::Calendar(event));
        entry.hidden = hidden;
        entry
    }

    /// Entry for one task; undated tasks go to the end of the list.
    pub fn from_task(settings: &AgendaSettings, clock: &Clock, task: TaskRecord) -> Self {
        let (position, entry_date) = match task.entry_time() {
            None => (WidgetEntryPosition::EndOfList, datetime_max()),
            Some(time)
                if settings.show_past_events_under_one_header && time < clock.start_of_today() =>
            {
                (WidgetEntryPosition::PastAndDue, time)
            }
            Some(time) => (WidgetEntryPosition::EntryDate, time),
        };
        let hidden = task.completed;

        let mut entry = Self::new(clock, entry_date, position, EntryPayload::Task(task));
        entry.hidden = hidden;
        entry
    }

    pub fn day_header(clock: &Clock, day: NaiveDate) -> Self {
        Self::new(
            clock,
            clock.start_of_day(day),
            WidgetEntryPosition::DayHeader,
            EntryPayload::DayHeader,
        )
    }

    pub fn past_and_due_header(clock: &Clock) -> Self {
        Self::new(
            clock,
            datetime_min(),
            WidgetEntryPosition::PastAndDueHeader,
            EntryPayload::DayHeader,
        )
    }

    pub fn end_of_list_header(clock: &Clock) -> Self {
        Self::new(
            clock,
            datetime_max(),
            WidgetEntryPosition::EndOfListHeader,
            EntryPayload::DayHeader,
        )
    }

    /// The "now" line.
    pub fn current_time(clock: &Clock) -> Self {
        Self::new(
            clock,
            clock.now(),
            WidgetEntryPosition::EntryDate,
            EntryPayload::CurrentTime,
        )
    }

    pub fn last(clock: &Clock, last_type: LastEntryType) -> Self {
        Self::new(
            clock,
            datetime_max(),
            WidgetEntryPosition::ListFooter,
            EntryPayload::Last(last_type),
        )
    }

    /// 0 for structural entries.
    pub fn entry_id(&self) -> u64 {
        self.entry_id
    }

    pub fn entry_date(&self) -> DateTime<Utc> {
        self.entry_date
    }

    pub fn entry_day(&self) -> NaiveDate {
        self.entry_day
    }

    pub fn position(&self) -> WidgetEntryPosition {
        self.position
    }

    pub fn time_section(&self) -> TimeSection {
        self.time_section
    }

    pub fn payload(&self) -> &EntryPayload {
        &self.payload
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn show_time_until(&self) -> bool {
        self.show_time_until
    }

    pub(crate) fn mark_show_time_until(&mut self) {
        self.show_time_until = true;
    }

    pub fn kind(&self) -> EntryKind {
        match self.payload {
            EntryPayload::DayHeader => EntryKind::DayHeader,
            EntryPayload::Calendar(_) => EntryKind::Calendar,
            EntryPayload::Task(_) => EntryKind::Task,
            EntryPayload::CurrentTime => EntryKind::CurrentTime,
            EntryPayload::Last(_) => EntryKind::Last,
        }
    }

    /// Day headers, the current-time line and the terminal entry.
    pub fn is_structural(&self) -> bool {
        !matches!(self.kind(), EntryKind::Calendar | EntryKind::Task)
    }

    pub fn title(&self) -> &str {
        match &self.payload {
            EntryPayload::Calendar(event) => &event.title,
            EntryPayload::Task(task) => &task.title,
            _ => "",
        }
    }

    pub fn event(&self) -> Option<&EventRecord> {
        match &self.payload {
            EntryPayload::Calendar(event) => Some(event),
            _ => None,
        }
    }

    pub fn task(&self) -> Option<&TaskRecord> {
        match &self.payload {
            EntryPayload::Task(task) => Some(task),
            _ => None,
        }
    }

    fn source_rank(&self) -> u32 {
        match &self.payload {
            EntryPayload::Calendar(event) => event.source.rank,
            EntryPayload::Task(task) => task.source.rank,
            _ => 0,
        }
    }

    /// Total order of the list. Ties compare equal, so a stable sort keeps
    /// the collection order of equal entries.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.position
            .group()
            .cmp(&other.position.group())
            .then_with(|| self.entry_day.cmp(&other.entry_day))
            .then_with(|| {
                self.position
                    .same_day_rank()
                    .cmp(&other.position.same_day_rank())
            })
            .then_with(|| self.entry_date.cmp(&other.entry_date))
            .then_with(|| self.kind().rank().cmp(&other.kind().rank()))
            .then_with(|| self.source_rank().cmp(&other.source_rank()))
    }

    /// Symmetric "same thing shown twice" relation used by duplicate hiding.
    pub fn duplicates(&self, other: &Self) -> bool {
        match (&self.payload, &other.payload) {
            (EntryPayload::Calendar(a), EntryPayload::Calendar(b)) => {
                self.position == other.position
                    && a.start == b.start
                    && a.end_or_start() == b.end_or_start()
                    && a.all_day == b.all_day
                    && a.location == b.location
                    && same_title(&a.title, &b.title)
            }
            (EntryPayload::Task(a), EntryPayload::Task(b)) => {
                a.due == b.due && same_title(&a.title, &b.title)
            }
            (EntryPayload::Calendar(_), EntryPayload::Task(_))
            | (EntryPayload::Task(_), EntryPayload::Calendar(_)) => {
                self.entry_date == other.entry_date && same_title(self.title(), other.title())
            }
            _ => false,
        }
    }
}

impl fmt::Display for WidgetEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} [{:?}, {:?}] {} {}",
            self.kind(),
            self.position,
            self.time_section,
            self.entry_date.to_rfc3339(),
            self.title()
        )
    }
}

fn same_title(first: &str, second: &str) -> bool {
    first.trim().to_lowercase() == second.trim().to_lowercase()
}

fn time_section_of(position: WidgetEntryPosition, day: NaiveDate, today: NaiveDate) -> TimeSection {
    match position {
        WidgetEntryPosition::PastAndDueHeader | WidgetEntryPosition::PastAndDue => TimeSection::Past,
        WidgetEntryPosition::EndOfListHeader
        | WidgetEntryPosition::EndOfList
        | WidgetEntryPosition::ListFooter => TimeSection::Future,
        _ => match day.cmp(&today) {
            Ordering::Less => TimeSection::Past,
            Ordering::Equal => TimeSection::Today,
            Ordering::Greater => TimeSection::Future,
        },
    }
}

/// Stable sort by the list order.
pub fn sort_entries(entries: &mut [WidgetEntry]) {
    entries.sort_by(|a, b| a.compare(b));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event_source::{EventProviderType, OrderedEventSource};
    use chrono::{Duration, TimeZone};
    use chrono_tz::Tz;

    fn clock() -> Clock {
        Clock::fixed(Utc.with_ymd_and_hms(2024, 5, 20, 10, 0, 0).unwrap(), Tz::UTC)
    }

    fn today_at(hour: i64) -> DateTime<Utc> {
        clock().start_of_today() + Duration::hours(hour)
    }

    fn event(title: &str, start: DateTime<Utc>, rank: u32) -> EventRecord {
        EventRecord::builder()
            .event_id(1)
            .source(OrderedEventSource::new(EventProviderType::Calendar, 1, rank))
            .title(title)
            .start(start)
            .end(start + Duration::hours(1))
            .build()
            .unwrap()
    }

    fn entry(title: &str, start: DateTime<Utc>) -> WidgetEntry {
        WidgetEntry::from_event(&AgendaSettings::default(), &clock(), event(title, start, 0))
    }

    #[test]
    fn test_structural_entries_have_zero_id() {
        let clock = clock();
        assert_eq!(WidgetEntry::day_header(&clock, clock.today()).entry_id(), 0);
        assert_eq!(WidgetEntry::current_time(&clock).entry_id(), 0);
        assert_eq!(WidgetEntry::last(&clock, LastEntryType::Empty).entry_id(), 0);
        assert_ne!(entry("Real", today_at(12)).entry_id(), 0);
    }

    #[test]
    fn test_entry_ids_are_unique() {
        let first = entry("A", today_at(12));
        let second = entry("A", today_at(12));
        assert_ne!(first.entry_id(), second.entry_id());
    }

    #[test]
    fn test_time_sections() {
        assert_eq!(entry("Past", today_at(-20)).time_section(), TimeSection::Past);
        assert_eq!(entry("Today", today_at(12)).time_section(), TimeSection::Today);
        assert_eq!(entry("Future", today_at(30)).time_section(), TimeSection::Future);
    }

    #[test]
    fn test_day_header_sorts_before_all_day_and_timed() {
        let clock = clock();
        let settings = AgendaSettings::default();
        let all_day = EventRecord::builder()
            .title("Holiday")
            .start(clock.start_of_today())
            .end(clock.start_of_tomorrow())
            .all_day(true)
            .build()
            .unwrap();

        let mut entries = vec![
            entry("Timed", today_at(0)),
            WidgetEntry::from_event(&settings, &clock, all_day),
            WidgetEntry::day_header(&clock, clock.today()),
        ];
        sort_entries(&mut entries);

        let kinds: Vec<EntryKind> = entries.iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![EntryKind::DayHeader, EntryKind::Calendar, EntryKind::Calendar]
        );
        assert_eq!(entries[1].title(), "Holiday");
    }

    #[test]
    fn test_current_time_sorts_before_event_at_same_instant() {
        let clock = clock();
        let mut entries = vec![
            entry("Starts now", clock.now()),
            WidgetEntry::current_time(&clock),
            entry("Earlier", clock.now() - Duration::minutes(5)),
        ];
        sort_entries(&mut entries);

        let titles: Vec<&str> = entries.iter().map(|e| e.title()).collect();
        assert_eq!(titles, vec!["Earlier", "", "Starts now"]);
        assert_eq!(entries[1].kind(), EntryKind::CurrentTime);
    }

    #[test]
    fn test_same_instant_sorted_by_source_rank_then_stable() {
        let clock = clock();
        let settings = AgendaSettings::default();
        let at = today_at(12);
        let mut entries = vec![
            WidgetEntry::from_event(&settings, &clock, event("Rank 1", at, 1)),
            WidgetEntry::from_event(&settings, &clock, event("Rank 0 first", at, 0)),
            WidgetEntry::from_event(&settings, &clock, event("Rank 0 second", at, 0)),
        ];
        sort_entries(&mut entries);

        let titles: Vec<&str> = entries.iter().map(|e| e.title()).collect();
        assert_eq!(titles, vec!["Rank 0 first", "Rank 0 second", "Rank 1"]);
    }

    #[test]
    fn test_running_event_is_listed_today() {
        let started_yesterday = EventRecord::builder()
            .title("Conference")
            .start(today_at(-6))
            .end(today_at(6))
            .build()
            .unwrap();
        let entry = WidgetEntry::from_event(&AgendaSettings::default(), &clock(), started_yesterday);

        assert_eq!(entry.position(), WidgetEntryPosition::StartOfDay);
        assert_eq!(entry.entry_date(), today_at(0));
        assert_eq!(entry.time_section(), TimeSection::Today);
    }

    #[test]
    fn test_past_event_under_one_header() {
        let settings = AgendaSettings {
            show_past_events_under_one_header: true,
            ..AgendaSettings::default()
        };
        let past = WidgetEntry::from_event(&settings, &clock(), event("Old", today_at(-30), 0));
        let header = WidgetEntry::past_and_due_header(&clock());

        assert_eq!(past.position(), WidgetEntryPosition::PastAndDue);
        assert_eq!(past.time_section(), TimeSection::Past);
        assert_eq!(header.compare(&past), Ordering::Less);
        assert_eq!(past.compare(&entry("Today", today_at(1))), Ordering::Less);
    }

    #[test]
    fn test_undated_task_goes_to_end_of_list() {
        let clock = clock();
        let settings = AgendaSettings::default();
        let source = OrderedEventSource::new(EventProviderType::Tasks, 2, 0);
        let undated = WidgetEntry::from_task(&settings, &clock, TaskRecord::new(1, source, "Someday"));

        assert_eq!(undated.position(), WidgetEntryPosition::EndOfList);
        assert_eq!(undated.time_section(), TimeSection::Future);
        assert_eq!(
            WidgetEntry::end_of_list_header(&clock).compare(&undated),
            Ordering::Less
        );
        assert_eq!(
            undated.compare(&WidgetEntry::last(&clock, LastEntryType::EndOfList)),
            Ordering::Less
        );
        assert_eq!(entry("Far", today_at(24 * 300)).compare(&undated), Ordering::Less);
    }

    #[test]
    fn test_cancelled_event_hidden_unless_enabled() {
        let mut cancelled = event("Called off", today_at(12), 0);
        cancelled.status = EventStatus::Canceled;

        let hidden = WidgetEntry::from_event(&AgendaSettings::default(), &clock(), cancelled.clone());
        assert!(hidden.is_hidden());

        let settings = AgendaSettings {
            show_cancelled_events: true,
            ..AgendaSettings::default()
        };
        assert!(!WidgetEntry::from_event(&settings, &clock(), cancelled).is_hidden());
    }

    #[test]
    fn test_duplicates_is_symmetric_and_ignores_case() {
        let a = entry("Standup", today_at(9));
        let b = entry(" standup ", today_at(9));
        let c = entry("Standup", today_at(10));

        assert!(a.duplicates(&b));
        assert!(b.duplicates(&a));
        assert!(!a.duplicates(&c));
    }

    #[test]
    fn test_event_and_task_duplicates() {
        let clock = clock();
        let settings = AgendaSettings::default();
        let source = OrderedEventSource::new(EventProviderType::Tasks, 2, 0);
        let task = WidgetEntry::from_task(
            &settings,
            &clock,
            TaskRecord::new(1, source, "Pay rent").with_due(today_at(12)),
        );
        let event = entry("Pay rent", today_at(12));

        assert!(task.duplicates(&event));
        assert!(event.duplicates(&task));
    }

    #[test]
    fn test_structural_entries_never_duplicate() {
        let clock = clock();
        let header = WidgetEntry::day_header(&clock, clock.today());
        assert!(!header.duplicates(&header.clone()));
    }
}
