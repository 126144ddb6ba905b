// Event module
// One occurrence of a calendar event, normalized from a provider row

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::event_source::{EventProviderType, OrderedEventSource};

const OPAQUE_ALPHA: u32 = 0xFF00_0000;

/// Force the alpha channel of an ARGB color to fully opaque.
pub fn as_opaque(color: u32) -> u32 {
    color | OPAQUE_ALPHA
}

/// Status of an event instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Tentative,
    #[default]
    Confirmed,
    Canceled,
    Unknown,
}

impl EventStatus {
    /// Map a provider status code (0 tentative, 1 confirmed, 2 canceled).
    /// A NULL column reads as 0.
    pub fn from_code(code: Option<i32>) -> Self {
        match code.unwrap_or(0) {
            0 => EventStatus::Tentative,
            1 => EventStatus::Confirmed,
            2 => EventStatus::Canceled,
            _ => EventStatus::Unknown,
        }
    }
}

/// One occurrence of a calendar event.
///
/// `event_id` is scoped to the provider; occurrences of a recurring series
/// share it. The record is rebuilt on every refresh and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: i64,
    pub source: OrderedEventSource,
    pub title: String,
    pub start: DateTime<Utc>,
    /// Absent for point-in-time items; never before `start`.
    pub end: Option<DateTime<Utc>>,
    pub all_day: bool,
    /// Opaque ARGB display color.
    pub color: u32,
    pub calendar_color: Option<u32>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub alarm_active: bool,
    pub recurring: bool,
    pub status: EventStatus,
}

impl EventRecord {
    /// Create a builder for constructing events with optional fields
    pub fn builder() -> EventRecordBuilder {
        EventRecordBuilder::new()
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(end) = self.end {
            if end < self.start {
                return Err("Event end time cannot be before start time".to_string());
            }
        }

        if self.color & OPAQUE_ALPHA != OPAQUE_ALPHA {
            return Err("Event color must be opaque".to_string());
        }

        Ok(())
    }

    pub fn end_or_start(&self) -> DateTime<Utc> {
        self.end.unwrap_or(self.start)
    }

    pub fn duration(&self) -> Duration {
        self.end_or_start() - self.start
    }

    /// The display color equals the color of its calendar.
    pub fn has_default_calendar_color(&self) -> bool {
        self.calendar_color == Some(self.color)
    }

    /// Instant of this occurrence nearest to `now`: its start when upcoming,
    /// its end when finished, `now` itself while running.
    pub fn closest_time(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        if self.start > now {
            self.start
        } else if self.end_or_start() <= now {
            self.end_or_start()
        } else {
            now
        }
    }

    pub fn is_running_at(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end_or_start()
    }

    /// Replace the title; copies taken earlier keep the old one.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }
}

/// Builder for creating event records with optional fields
pub struct EventRecordBuilder {
    event_id: i64,
    source: Option<OrderedEventSource>,
    title: String,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    all_day: bool,
    color: u32,
    calendar_color: Option<u32>,
    location: Option<String>,
    description: Option<String>,
    alarm_active: bool,
    recurring: bool,
    status: EventStatus,
}

impl EventRecordBuilder {
    pub fn new() -> Self {
        Self {
            event_id: 0,
            source: None,
            title: String::new(),
            start: None,
            end: None,
            all_day: false,
            color: OPAQUE_ALPHA,
            calendar_color: None,
            location: None,
            description: None,
            alarm_active: false,
            recurring: false,
            status: EventStatus::Confirmed,
        }
    }

    pub fn event_id(mut self, event_id: i64) -> Self {
        self.event_id = event_id;
        self
    }

    pub fn source(mut self, source: OrderedEventSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    pub fn all_day(mut self, all_day: bool) -> Self {
        self.all_day = all_day;
        self
    }

    /// Set the display color; the alpha channel is forced opaque.
    pub fn color(mut self, color: u32) -> Self {
        self.color = as_opaque(color);
        self
    }

    pub fn calendar_color(mut self, color: u32) -> Self {
        self.calendar_color = Some(as_opaque(color));
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn alarm_active(mut self, alarm_active: bool) -> Self {
        self.alarm_active = alarm_active;
        self
    }

    pub fn recurring(mut self, recurring: bool) -> Self {
        self.recurring = recurring;
        self
    }

    pub fn status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    pub fn build(self) -> Result<EventRecord, String> {
        let start = self.start.ok_or("Event start time is required")?;

        let event = EventRecord {
            event_id: self.event_id,
            source: self
                .source
                .unwrap_or_else(|| OrderedEventSource::empty(EventProviderType::Calendar)),
            title: self.title,
            start,
            end: self.end,
            all_day: self.all_day,
            color: self.color,
            calendar_color: self.calendar_color,
            location: self.location,
            description: self.description,
            alarm_active: self.alarm_active,
            recurring: self.recurring,
            status: self.status,
        };

        event.validate()?;
        Ok(event)
    }
}

impl Default for EventRecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 20, hour, 0, 0).unwrap()
    }

    fn meeting() -> EventRecord {
        EventRecord::builder()
            .event_id(7)
            .title("Meeting")
            .start(at(10))
            .end(at(11))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_missing_start() {
        let result = EventRecord::builder().title("Meeting").build();
        assert_eq!(result.unwrap_err(), "Event start time is required");
    }

    #[test]
    fn test_builder_end_before_start() {
        let result = EventRecord::builder().start(at(10)).end(at(9)).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_point_in_time() {
        let event = EventRecord::builder().start(at(8)).build().unwrap();
        assert!(event.end.is_none());
        assert_eq!(event.end_or_start(), at(8));
        assert_eq!(event.duration(), Duration::zero());
        assert_eq!(event.title, "");
    }

    #[test]
    fn test_color_forced_opaque() {
        let event = EventRecord::builder()
            .start(at(8))
            .color(0x00FF_00FF)
            .calendar_color(0x00FF_00FF)
            .build()
            .unwrap();

        assert_eq!(event.color, 0xFFFF_00FF);
        assert!(event.has_default_calendar_color());
    }

    #[test]
    fn test_validate_transparent_color() {
        let mut event = meeting();
        event.color = 0x0012_3456;
        assert!(event.validate().unwrap_err().contains("opaque"));
    }

    #[test_case(9, 10; "upcoming event is closest at its start")]
    #[test_case(12, 11; "finished event is closest at its end")]
    #[test_case(10, 10; "event starting now is closest at now")]
    fn test_closest_time(now_hour: u32, expected_hour: u32) {
        assert_eq!(meeting().closest_time(at(now_hour)), at(expected_hour));
    }

    #[test]
    fn test_closest_time_running_event_is_now() {
        let now = at(10) + Duration::minutes(30);
        assert_eq!(meeting().closest_time(now), now);
        assert!(meeting().is_running_at(now));
    }

    #[test_case(Some(0), EventStatus::Tentative)]
    #[test_case(Some(1), EventStatus::Confirmed)]
    #[test_case(Some(2), EventStatus::Canceled)]
    #[test_case(Some(9), EventStatus::Unknown)]
    #[test_case(None, EventStatus::Tentative)]
    fn test_status_from_code(code: Option<i32>, expected: EventStatus) {
        assert_eq!(EventStatus::from_code(code), expected);
    }

    #[test]
    fn test_set_title_does_not_touch_copies() {
        let meeting_event = meeting();
        let mut copy = meeting_event.clone();
        copy.set_title("Changed title");

        assert_eq!(meeting_event.title, "Meeting");
        assert_ne!(meeting_event, copy);
    }
}
