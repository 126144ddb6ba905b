// Event source module
// Calendars and task lists that feed the agenda, and their display order

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of provider a source belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventProviderType {
    Calendar,
    Tasks,
}

impl fmt::Display for EventProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventProviderType::Calendar => write!(f, "calendar"),
            EventProviderType::Tasks => write!(f, "tasks"),
        }
    }
}

/// A calendar or task list as reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSource {
    pub provider_type: EventProviderType,
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Opaque ARGB color.
    pub color: u32,
    pub available: bool,
}

impl EventSource {
    pub fn new(provider_type: EventProviderType, id: i64, title: impl Into<String>) -> Self {
        Self {
            provider_type,
            id,
            title: title.into(),
            summary: None,
            color: 0xFF00_0000,
            available: true,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id < 0 {
            return Err("Event source id cannot be negative".to_string());
        }
        Ok(())
    }
}

/// A source selected in the widget settings, with its position in the list.
///
/// `rank` breaks ties between entries that fall on the same instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedEventSource {
    pub provider_type: EventProviderType,
    pub source_id: i64,
    pub rank: u32,
    #[serde(default)]
    pub title: String,
}

impl OrderedEventSource {
    pub fn new(provider_type: EventProviderType, source_id: i64, rank: u32) -> Self {
        Self {
            provider_type,
            source_id,
            rank,
            title: String::new(),
        }
    }

    /// Placeholder for rows whose source is not among the active ones.
    pub fn empty(provider_type: EventProviderType) -> Self {
        Self {
            provider_type,
            source_id: 0,
            rank: u32::MAX,
            title: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rank == u32::MAX && self.source_id == 0
    }
}
