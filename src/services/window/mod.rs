//! Query window resolution.
//!
//! Stores filter all-day and multi-day instances imprecisely, so the query
//! runs over a window widened into the past and the result is narrowed to
//! the nominal window afterwards.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::event::EventRecord;
use crate::models::settings::{AgendaSettings, FilterMode};
use crate::utils::date::{datetime_max, datetime_min, Clock};

/// Days the query start is moved back to catch all-day events.
pub const QUERY_START_CORRECTION_DAYS: i64 = 2;

/// Half-open `[start, end)` range of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn unbounded() -> Self {
        Self::new(datetime_min(), datetime_max())
    }

    pub fn is_unbounded(&self) -> bool {
        self.start <= datetime_min() && self.end >= datetime_max()
    }

    /// The event ends after the window starts and starts before it ends.
    pub fn overlaps(&self, event: &EventRecord) -> bool {
        event.end_or_start() > self.start && self.end > event.start
    }
}

/// Move `start` back by two days, unless it is the unbounded sentinel.
pub fn correct_start_for_query(start: DateTime<Utc>) -> DateTime<Utc> {
    if start > datetime_min() {
        start - Duration::days(QUERY_START_CORRECTION_DAYS)
    } else {
        start
    }
}

/// Computes the store query window and narrows fetched events back to the
/// nominal window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindowResolver {
    mode: FilterMode,
    nominal: TimeWindow,
}

impl TimeWindowResolver {
    pub fn new(mode: FilterMode, nominal: TimeWindow) -> Self {
        Self { mode, nominal }
    }

    pub fn from_settings(settings: &AgendaSettings, clock: &Clock) -> Self {
        Self::new(
            settings.filter_mode,
            TimeWindow::new(
                settings.start_of_time_range(clock),
                settings.end_of_time_range(clock),
            ),
        )
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn nominal(&self) -> TimeWindow {
        self.nominal
    }

    /// Window passed to the store.
    pub fn query_window(&self) -> TimeWindow {
        match self.mode {
            FilterMode::NoFiltering => TimeWindow::unbounded(),
            FilterMode::Normal | FilterMode::Debug => {
                TimeWindow::new(correct_start_for_query(self.nominal.start), self.nominal.end)
            }
        }
    }

    /// Drop events outside the nominal window; a no-op without filtering.
    pub fn retain_in_window(&self, events: &mut Vec<EventRecord>) {
        if self.mode == FilterMode::NoFiltering {
            return;
        }
        let before = events.len();
        events.retain(|event| self.nominal.overlaps(event));
        if events.len() != before {
            log::debug!(
                "Dropped {} events outside {} .. {}",
                before - events.len(),
                self.nominal.start.to_rfc3339(),
                self.nominal.end.to_rfc3339()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
    }

    fn event(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> EventRecord {
        let builder = EventRecord::builder().title("e").start(start);
        match end {
            Some(end) => builder.end(end).build().unwrap(),
            None => builder.build().unwrap(),
        }
    }

    #[test]
    fn test_correct_start_moves_back_two_days() {
        assert_eq!(correct_start_for_query(at(20, 10)), at(18, 10));
    }

    #[test]
    fn test_correct_start_keeps_sentinel() {
        assert_eq!(correct_start_for_query(datetime_min()), datetime_min());
    }

    #[test]
    fn test_query_window_per_mode() {
        let nominal = TimeWindow::new(at(20, 0), at(27, 0));

        let none = TimeWindowResolver::new(FilterMode::NoFiltering, nominal);
        assert!(none.query_window().is_unbounded());

        for mode in [FilterMode::Normal, FilterMode::Debug] {
            let resolver = TimeWindowResolver::new(mode, nominal);
            assert_eq!(resolver.query_window(), TimeWindow::new(at(18, 0), at(27, 0)));
        }
    }

    #[test_case(at(19, 10), Some(at(19, 11)), false; "ended before window")]
    #[test_case(at(19, 23), Some(at(20, 0)), false; "ends exactly at window start")]
    #[test_case(at(19, 23), Some(at(20, 1)), true; "runs into window")]
    #[test_case(at(26, 23), Some(at(28, 0)), true; "starts inside, ends after")]
    #[test_case(at(27, 0), Some(at(27, 1)), false; "starts exactly at window end")]
    #[test_case(at(20, 0), None, false; "point in time at window start")]
    #[test_case(at(21, 8), None, true; "point in time inside")]
    fn test_retain_in_window(start: DateTime<Utc>, end: Option<DateTime<Utc>>, kept: bool) {
        let resolver =
            TimeWindowResolver::new(FilterMode::Normal, TimeWindow::new(at(20, 0), at(27, 0)));
        let mut events = vec![event(start, end)];
        resolver.retain_in_window(&mut events);
        assert_eq!(events.len() == 1, kept);
    }

    #[test]
    fn test_no_filtering_keeps_everything() {
        let resolver =
            TimeWindowResolver::new(FilterMode::NoFiltering, TimeWindow::new(at(20, 0), at(27, 0)));
        let mut events = vec![event(at(1, 0), None), event(at(30, 0), None)];
        resolver.retain_in_window(&mut events);
        assert_eq!(events.len(), 2);
    }
}
