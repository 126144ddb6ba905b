// Module exports for models

pub mod entry;
pub mod event;
pub mod event_source;
pub mod query_result;
pub mod settings;
pub mod task;
