// Query result module
// Raw provider rows and their recorded, serializable form

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::event_source::EventProviderType;

/// One raw instance row as returned by a calendar store.
///
/// Every column is optional; normalization supplies defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Epoch milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub begin: Option<i64>,
    /// Epoch milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_day: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_alarm: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rrule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_color: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_color: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_attendee_status: Option<i32>,
}

impl EventRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_calendar_id(mut self, calendar_id: i64) -> Self {
        self.calendar_id = Some(calendar_id);
        self
    }

    pub fn set_event_id(mut self, event_id: i64) -> Self {
        self.event_id = Some(event_id);
        self
    }

    pub fn set_status(mut self, status: i32) -> Self {
        self.status = Some(status);
        self
    }

    pub fn set_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn set_begin(mut self, millis: i64) -> Self {
        self.begin = Some(millis);
        self
    }

    pub fn set_end(mut self, millis: i64) -> Self {
        self.end = Some(millis);
        self
    }

    pub fn set_all_day(mut self, all_day: bool) -> Self {
        self.all_day = Some(all_day as i32);
        self
    }

    pub fn set_event_location(mut self, location: impl Into<String>) -> Self {
        self.event_location = Some(location.into());
        self
    }

    pub fn set_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn set_has_alarm(mut self, has_alarm: bool) -> Self {
        self.has_alarm = Some(has_alarm as i32);
        self
    }

    pub fn set_rrule(mut self, rrule: impl Into<String>) -> Self {
        self.rrule = Some(rrule.into());
        self
    }

    pub fn set_display_color(mut self, color: i32) -> Self {
        self.display_color = Some(color);
        self
    }

    pub fn set_calendar_color(mut self, color: i32) -> Self {
        self.calendar_color = Some(color);
        self
    }

    pub fn set_self_attendee_status(mut self, status: i32) -> Self {
        self.self_attendee_status = Some(status);
        self
    }
}

/// Rows of one executed query, with the window it was run for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub provider_type: EventProviderType,
    pub widget_id: u32,
    pub executed_at: DateTime<Utc>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    #[serde(default)]
    pub rows: Vec<EventRow>,
}

impl QueryResult {
    pub fn new(
        provider_type: EventProviderType,
        widget_id: u32,
        executed_at: DateTime<Utc>,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Self {
        Self {
            provider_type,
            widget_id,
            executed_at,
            window_start,
            window_end,
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: EventRow) {
        self.rows.push(row);
    }
}

/// Recorded query results of one or more widgets.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryResultsStorage {
    #[serde(default)]
    pub results: Vec<QueryResult>,
}

impl QueryResultsStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_result(&mut self, result: QueryResult) {
        self.results.push(result);
    }

    pub fn results_of(&self, provider_type: EventProviderType, widget_id: u32) -> Vec<&QueryResult> {
        self.results
            .iter()
            .filter(|result| result.provider_type == provider_type && result.widget_id == widget_id)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_absent_columns_are_not_serialized() {
        let row = EventRow::new().set_event_id(1).set_title("Lunch");
        let json = serde_json::to_string(&row).unwrap();

        assert_eq!(json, r#"{"event_id":1,"title":"Lunch"}"#);
    }

    #[test]
    fn test_results_of_filters_by_widget_and_type() {
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 10, 0, 0).unwrap();
        let mut storage = QueryResultsStorage::new();
        storage.add_result(QueryResult::new(EventProviderType::Calendar, 1, now, now, now));
        storage.add_result(QueryResult::new(EventProviderType::Calendar, 2, now, now, now));
        storage.add_result(QueryResult::new(EventProviderType::Tasks, 1, now, now, now));

        assert_eq!(storage.results_of(EventProviderType::Calendar, 1).len(), 1);
        assert_eq!(storage.results_of(EventProviderType::Tasks, 2).len(), 0);
    }
}
