//! Widget instances and the registry that owns them.
//!
//! Each widget publishes its list as an immutable snapshot. A rebuild runs
//! off to the side and replaces the snapshot in one assignment, so readers
//! see either the old list or the new one.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::models::entry::WidgetEntry;
use crate::models::settings::AgendaSettings;
use crate::services::aggregator::{self, EntryAggregator};
use crate::utils::date::Clock;

/// What triggered a rebuild; only logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    Created,
    Timer,
    Manual,
    DataChanged,
    SettingsChanged,
}

impl fmt::Display for RefreshReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefreshReason::Created => "created",
            RefreshReason::Timer => "timer",
            RefreshReason::Manual => "manual",
            RefreshReason::DataChanged => "data changed",
            RefreshReason::SettingsChanged => "settings changed",
        };
        write!(f, "{}", name)
    }
}

pub struct AgendaWidget {
    settings: RwLock<AgendaSettings>,
    aggregator: EntryAggregator,
    entries: RwLock<Arc<Vec<WidgetEntry>>>,
    rebuild: Mutex<()>,
}

impl AgendaWidget {
    /// A widget starts with an empty list until its first reload.
    pub fn new(settings: AgendaSettings, aggregator: EntryAggregator) -> Self {
        Self {
            settings: RwLock::new(settings),
            aggregator,
            entries: RwLock::new(Arc::new(Vec::new())),
            rebuild: Mutex::new(()),
        }
    }

    pub fn widget_id(&self) -> u32 {
        self.settings().widget_id
    }

    pub fn settings(&self) -> AgendaSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the settings; takes effect on the next reload.
    pub fn update_settings(&self, settings: AgendaSettings) {
        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }

    /// Rebuild and publish the list.
    ///
    /// Rebuilds are serialized. A rebuild that panics leaves the previous
    /// list published and returns false.
    pub fn reload(&self, reason: RefreshReason, clock: &Clock) -> bool {
        let _guard = self.rebuild.lock().unwrap_or_else(PoisonError::into_inner);
        let settings = self.settings();

        let assembled = panic::catch_unwind(AssertUnwindSafe(|| {
            self.aggregator.assemble(&settings, clock)
        }));
        match assembled {
            Ok(entries) => {
                log::debug!(
                    "widget {}: reloaded ({}), {} entries",
                    settings.widget_id,
                    reason,
                    entries.len()
                );
                *self.entries.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(entries);
                true
            }
            Err(_) => {
                log::error!(
                    "widget {}: rebuild ({}) failed, keeping the previous list",
                    settings.widget_id,
                    reason
                );
                false
            }
        }
    }

    /// The published list.
    pub fn entries(&self) -> Arc<Vec<WidgetEntry>> {
        Arc::clone(&self.entries.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn todays_position(&self) -> Option<usize> {
        aggregator::todays_position(&self.entries())
    }

    pub fn tomorrows_position(&self) -> Option<usize> {
        aggregator::tomorrows_position(&self.entries())
    }

    /// Entry with the given id; structural entries (id 0) are never found.
    pub fn find_entry(&self, entry_id: u64) -> Option<WidgetEntry> {
        if entry_id == 0 {
            return None;
        }
        self.entries()
            .iter()
            .find(|entry| entry.entry_id() == entry_id)
            .cloned()
    }
}

/// Live widget instances by widget id.
#[derive(Default)]
pub struct AgendaRegistry {
    widgets: RwLock<HashMap<u32, Arc<AgendaWidget>>>,
}

impl AgendaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a widget, replacing any instance with the same id.
    pub fn register(&self, widget: AgendaWidget) -> Arc<AgendaWidget> {
        let widget = Arc::new(widget);
        let widget_id = widget.widget_id();
        let replaced = self
            .widgets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(widget_id, Arc::clone(&widget));
        if replaced.is_some() {
            log::info!("widget {}: replaced registered instance", widget_id);
        }
        widget
    }

    pub fn deregister(&self, widget_id: u32) -> Option<Arc<AgendaWidget>> {
        self.widgets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&widget_id)
    }

    pub fn get(&self, widget_id: u32) -> Option<Arc<AgendaWidget>> {
        self.widgets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&widget_id)
            .cloned()
    }

    pub fn widget_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .widgets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Reload every registered widget.
    pub fn reload_all(&self, reason: RefreshReason, clock: &Clock) {
        for widget_id in self.widget_ids() {
            if let Some(widget) = self.get(widget_id) {
                widget.reload(reason, clock);
            }
        }
    }

    /// Click lookup: the entry `entry_id` of widget `widget_id`.
    pub fn find_entry(&self, widget_id: u32, entry_id: u64) -> Option<WidgetEntry> {
        self.get(widget_id)?.find_entry(entry_id)
    }
}
