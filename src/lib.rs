// Agenda Widget Library
// Event aggregation and list assembly for agenda widgets

pub mod models;
pub mod services;
pub mod utils;

pub use models::entry::{EntryKind, LastEntryType, TimeSection, WidgetEntry};
pub use models::settings::AgendaSettings;
pub use services::aggregator::EntryAggregator;
pub use services::widget::{AgendaRegistry, AgendaWidget, RefreshReason};
pub use utils::date::Clock;
