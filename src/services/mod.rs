// Service module exports
// Pipeline stages, stores and the widget runtime

pub mod aggregator;
pub mod config;
pub mod database;
pub mod dedup;
pub mod filter;
pub mod provider;
pub mod render;
pub mod widget;
pub mod window;
