// Settings module
// Per-widget settings snapshot read at the start of every rebuild

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::event_source::{EventProviderType, OrderedEventSource};
use crate::utils::date::{datetime_max, Clock};

/// Longest look-ahead a widget may ask for.
pub const MAX_EVENT_RANGE_DAYS: i64 = 36_500;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Unknown time zone '{0}'")]
    InvalidTimeZone(String),

    #[error("Invalid keyword filter '{pattern}': {reason}")]
    InvalidKeywords { pattern: String, reason: String },

    #[error("Invalid settings: {0}")]
    Invalid(String),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// How strictly fetched events are bounded in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Query everything, no time post-filtering, no recurrence collapsing.
    NoFiltering,
    #[default]
    Normal,
    /// Like `Normal`, with extra checks on past-event colors.
    Debug,
}

/// How long ago an event may have ended and still be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EndedSomeTimeAgo {
    #[default]
    None,
    OneHour,
    TwoHours,
    FourHours,
    Today,
    Yesterday,
    OneWeek,
    TwoWeeks,
    OneYear,
}

impl EndedSomeTimeAgo {
    /// Earliest end instant an event may have to stay in the window.
    pub fn window_start(&self, clock: &Clock) -> DateTime<Utc> {
        let now = clock.now();
        let start_of_today = clock.start_of_today();
        let days_back = |days: i64| clock.start_of_day(clock.today() - Duration::days(days));
        match self {
            EndedSomeTimeAgo::None => now,
            EndedSomeTimeAgo::OneHour => now - Duration::hours(1),
            EndedSomeTimeAgo::TwoHours => now - Duration::hours(2),
            EndedSomeTimeAgo::FourHours => now - Duration::hours(4),
            EndedSomeTimeAgo::Today => start_of_today,
            EndedSomeTimeAgo::Yesterday => days_back(1),
            EndedSomeTimeAgo::OneWeek => days_back(7),
            EndedSomeTimeAgo::TwoWeeks => days_back(14),
            EndedSomeTimeAgo::OneYear => days_back(365),
        }
    }
}

/// Settings of one widget instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgendaSettings {
    pub widget_id: u32,
    /// IANA zone used for day boundaries.
    pub time_zone: String,
    pub filter_mode: FilterMode,
    /// Days ahead of now to include; 0 means "until the end of today".
    pub event_range_days: i64,
    pub events_ended: EndedSomeTimeAgo,
    pub hide_based_on_keywords: String,
    pub show_based_on_keywords: String,
    /// 0 means unlimited.
    pub max_number_of_events: usize,
    pub hide_duplicates: bool,
    pub show_current_time_line: bool,
    pub show_day_headers: bool,
    pub show_days_without_events: bool,
    pub show_only_closest_instance_of_recurring_event: bool,
    pub show_past_events_with_default_color: bool,
    pub show_past_events_under_one_header: bool,
    pub show_end_of_list: bool,
    pub show_cancelled_events: bool,
    pub log_events: bool,
    pub active_sources: Vec<OrderedEventSource>,
}

impl Default for AgendaSettings {
    fn default() -> Self {
        Self {
            widget_id: 0,
            time_zone: "UTC".to_string(),
            filter_mode: FilterMode::Normal,
            event_range_days: 30,
            events_ended: EndedSomeTimeAgo::None,
            hide_based_on_keywords: String::new(),
            show_based_on_keywords: String::new(),
            max_number_of_events: 0,
            hide_duplicates: false,
            show_current_time_line: true,
            show_day_headers: true,
            show_days_without_events: false,
            show_only_closest_instance_of_recurring_event: false,
            show_past_events_with_default_color: false,
            show_past_events_under_one_header: false,
            show_end_of_list: false,
            show_cancelled_events: false,
            log_events: false,
            active_sources: Vec::new(),
        }
    }
}

impl AgendaSettings {
    pub fn zone(&self) -> Result<Tz, SettingsError> {
        self.time_zone
            .parse::<Tz>()
            .map_err(|_| SettingsError::InvalidTimeZone(self.time_zone.clone()))
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.zone()?;

        if self.event_range_days < 0 {
            return Err(SettingsError::Invalid(
                "Event range cannot be negative".to_string(),
            ));
        }
        if self.event_range_days > MAX_EVENT_RANGE_DAYS {
            return Err(SettingsError::Invalid(format!(
                "Event range cannot exceed {} days: {}",
                MAX_EVENT_RANGE_DAYS, self.event_range_days
            )));
        }

        for source in &self.active_sources {
            if source.source_id < 0 {
                return Err(SettingsError::Invalid(format!(
                    "Active source id cannot be negative: {}",
                    source.source_id
                )));
            }
        }

        Ok(())
    }

    /// Nominal window start, before any query correction.
    pub fn start_of_time_range(&self, clock: &Clock) -> DateTime<Utc> {
        self.events_ended.window_start(clock)
    }

    /// Nominal (exclusive) window end, saturating at the unbounded sentinel.
    pub fn end_of_time_range(&self, clock: &Clock) -> DateTime<Utc> {
        if self.event_range_days > 0 {
            Duration::try_days(self.event_range_days)
                .and_then(|range| clock.now().checked_add_signed(range))
                .map_or_else(datetime_max, |end| end.min(datetime_max()))
        } else {
            clock.start_of_tomorrow()
        }
    }

    /// Active sources of one provider type, in rank order.
    pub fn active_sources_of(&self, provider_type: EventProviderType) -> Vec<&OrderedEventSource> {
        let mut sources: Vec<&OrderedEventSource> = self
            .active_sources
            .iter()
            .filter(|source| source.provider_type == provider_type)
            .collect();
        sources.sort_by_key(|source| source.rank);
        sources
    }

    /// The active source with `source_id`, or the empty source.
    pub fn active_source(&self, provider_type: EventProviderType, source_id: i64) -> OrderedEventSource {
        self.active_sources
            .iter()
            .find(|source| source.provider_type == provider_type && source.source_id == source_id)
            .cloned()
            .unwrap_or_else(|| OrderedEventSource::empty(provider_type))
    }

    pub fn provider_types(&self) -> Vec<EventProviderType> {
        let mut types = Vec::new();
        for source in &self.active_sources {
            if !types.contains(&source.provider_type) {
                types.push(source.provider_type);
            }
        }
        types
    }
}
