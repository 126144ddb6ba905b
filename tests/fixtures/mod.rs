// Test fixtures - reusable test data
// Provides consistent clocks, settings and store rows across test files
#![allow(dead_code)]

use agenda_widget::models::event_source::{EventProviderType, OrderedEventSource};
use agenda_widget::models::query_result::{EventRow, QueryResult};
use agenda_widget::{AgendaSettings, Clock};
use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;

/// Sample clocks for testing
pub mod clocks {
    use super::*;

    /// Monday May 20, 2024 at 07:00 UTC
    pub fn monday_morning_utc() -> Clock {
        Clock::fixed(Utc.with_ymd_and_hms(2024, 5, 20, 7, 0, 0).unwrap(), Tz::UTC)
    }

    /// Monday May 20, 2024 at 10:00 in New York (14:00 UTC)
    pub fn monday_new_york() -> Clock {
        Clock::fixed(
            Utc.with_ymd_and_hms(2024, 5, 20, 14, 0, 0).unwrap(),
            chrono_tz::America::New_York,
        )
    }
}

/// Sample widget settings
pub mod settings {
    use super::*;

    pub const CALENDAR_ID: i64 = 1;
    pub const TASK_LIST_ID: i64 = 2;

    /// Widget showing calendar 1 with headers and the current-time line off
    pub fn calendar_widget(widget_id: u32) -> AgendaSettings {
        AgendaSettings {
            widget_id,
            show_current_time_line: false,
            show_day_headers: false,
            active_sources: vec![OrderedEventSource::new(
                EventProviderType::Calendar,
                CALENDAR_ID,
                0,
            )],
            ..AgendaSettings::default()
        }
    }

    /// Calendar 1 and task list 2
    pub fn calendar_and_tasks_widget(widget_id: u32) -> AgendaSettings {
        let mut settings = calendar_widget(widget_id);
        settings
            .active_sources
            .push(OrderedEventSource::new(EventProviderType::Tasks, TASK_LIST_ID, 1));
        settings
    }
}

/// Sample store rows
pub mod rows {
    use super::*;

    fn millis(instant: DateTime<Utc>) -> i64 {
        instant.timestamp_millis()
    }

    pub fn timed(event_id: i64, title: &str, begin: DateTime<Utc>, minutes: i64) -> EventRow {
        EventRow::new()
            .set_calendar_id(settings::CALENDAR_ID)
            .set_event_id(event_id)
            .set_title(title)
            .set_begin(millis(begin))
            .set_end(millis(begin + Duration::minutes(minutes)))
    }

    /// All-day row stored at UTC midnight of `day`
    pub fn all_day(event_id: i64, title: &str, day: chrono::NaiveDate) -> EventRow {
        let begin = Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0).unwrap());
        EventRow::new()
            .set_calendar_id(settings::CALENDAR_ID)
            .set_event_id(event_id)
            .set_title(title)
            .set_begin(millis(begin))
            .set_end(millis(begin + Duration::days(1)))
            .set_all_day(true)
    }

    /// Point-in-time row at 08:00 of today
    pub fn first_event_today(clock: &Clock, event_id: i64) -> EventRow {
        EventRow::new()
            .set_calendar_id(settings::CALENDAR_ID)
            .set_event_id(event_id)
            .set_title("First Event today")
            .set_begin(millis(clock.start_of_today() + Duration::hours(8)))
    }

    /// 12:00-13:00 today, every optional column filled in
    pub fn all_known_attributes(clock: &Clock, event_id: i64) -> EventRow {
        let today = clock.start_of_today();
        EventRow::new()
            .set_calendar_id(settings::CALENDAR_ID)
            .set_event_id(event_id)
            .set_title("Event with all known attributes")
            .set_begin(millis(today + Duration::hours(12)))
            .set_end(millis(today + Duration::hours(13)))
            .set_display_color(0xFF00FF)
            .set_all_day(false)
            .set_event_location("somewhere")
            .set_has_alarm(true)
            .set_rrule("what's this?")
    }

    /// One recorded calendar query holding the two rows above
    pub fn two_events_today(clock: &Clock, widget_id: u32) -> QueryResult {
        let mut result = QueryResult::new(
            EventProviderType::Calendar,
            widget_id,
            clock.now(),
            clock.start_of_today(),
            clock.start_of_tomorrow(),
        );
        result.add_row(first_event_today(clock, 1));
        result.add_row(all_known_attributes(clock, 2));
        result
    }
}
