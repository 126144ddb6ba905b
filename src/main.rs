// Agenda Widget
// Command line front end: rebuild one widget list and print it

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;

use agenda_widget::models::event_source::{EventProviderType, OrderedEventSource};
use agenda_widget::services::config;
use agenda_widget::services::database::SqliteEventStore;
use agenda_widget::services::provider::recording::{load_results, save_results};
use agenda_widget::services::provider::{
    CalendarEventProvider, EventStore, MemoryEventStore, RecordingEventStore,
};
use agenda_widget::services::render::RenderTable;
use agenda_widget::{AgendaRegistry, AgendaSettings, AgendaWidget, Clock, EntryAggregator, RefreshReason};

#[derive(Parser)]
#[command(name = "agenda-widget")]
#[command(about = "Assemble and print the agenda list of one widget")]
struct Cli {
    /// Widget settings (TOML); defaults to the per-widget config file
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Widget id used when no settings file is given
    #[arg(short, long, default_value_t = 1)]
    widget_id: u32,

    /// Recorded query results (JSON) to replay
    #[arg(long, conflicts_with = "db")]
    replay: Option<PathBuf>,

    /// SQLite calendar database to read instead of a replay
    #[arg(long)]
    db: Option<PathBuf>,

    /// Current instant (RFC 3339); defaults to the system clock
    #[arg(long)]
    now: Option<String>,

    /// Save the executed queries to this JSON file
    #[arg(long)]
    record: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut settings = match &cli.settings {
        Some(path) => config::load_settings(path)?,
        None => config::load_or_default(cli.widget_id)?,
    };
    let zone = settings.zone()?;
    let clock = match &cli.now {
        Some(now) => {
            let now = DateTime::parse_from_rfc3339(now)
                .with_context(|| format!("invalid --now value '{}'", now))?;
            Clock::fixed(now.with_timezone(&Utc), zone)
        }
        None => Clock::system(zone),
    };

    match (&cli.replay, &cli.db) {
        (_, Some(db)) => {
            let path = db.to_str().context("database path is not valid UTF-8")?;
            let store = SqliteEventStore::open(path)?;
            activate_known_calendars(&mut settings, &store)?;
            run(&cli, settings, &clock, store)
        }
        (Some(replay), None) => {
            let storage = load_results(replay)?;
            let store = MemoryEventStore::from_results(
                &storage,
                EventProviderType::Calendar,
                settings.widget_id,
            );
            activate_replayed_calendars(&mut settings, &store);
            run(&cli, settings, &clock, store)
        }
        (None, None) => {
            log::warn!("No --replay or --db given, the list will be empty");
            run(&cli, settings, &clock, MemoryEventStore::new())
        }
    }
}

fn run<S: EventStore + 'static>(
    cli: &Cli,
    settings: AgendaSettings,
    clock: &Clock,
    store: S,
) -> Result<()> {
    let widget_id = settings.widget_id;
    let recorder = Arc::new(RecordingEventStore::new(store, widget_id, *clock));
    let aggregator =
        EntryAggregator::new().with_provider(CalendarEventProvider::new(Arc::clone(&recorder)));

    let registry = AgendaRegistry::new();
    let widget = registry.register(AgendaWidget::new(settings, aggregator));
    widget.reload(RefreshReason::Manual, clock);

    let entries = widget.entries();
    for line in RenderTable::text().render_all(&entries, clock) {
        println!("{}", line);
    }
    log::debug!(
        "today at {:?}, tomorrow at {:?}",
        widget.todays_position(),
        widget.tomorrows_position()
    );

    if let Some(path) = &cli.record {
        let results = recorder.take_results();
        save_results(path, &results)?;
        log::info!("Saved {} query results to {}", results.results.len(), path.display());
    }
    registry.deregister(widget_id);
    Ok(())
}

/// Without configured calendars, show every calendar of the database.
fn activate_known_calendars(settings: &mut AgendaSettings, store: &SqliteEventStore) -> Result<()> {
    if !settings.active_sources_of(EventProviderType::Calendar).is_empty() {
        return Ok(());
    }
    let calendars = store.calendars()?;
    for (rank, calendar) in calendars.iter().enumerate() {
        let mut source = OrderedEventSource::new(EventProviderType::Calendar, calendar.id, rank as u32);
        source.title = calendar.title.clone();
        settings.active_sources.push(source);
    }
    Ok(())
}

/// Without configured calendars, show every calendar seen in the replay.
fn activate_replayed_calendars(settings: &mut AgendaSettings, store: &MemoryEventStore) {
    if !settings.active_sources_of(EventProviderType::Calendar).is_empty() {
        return;
    }
    let mut ids: Vec<i64> = store.rows().iter().filter_map(|row| row.calendar_id).collect();
    ids.sort_unstable();
    ids.dedup();
    for (rank, id) in ids.into_iter().enumerate() {
        settings
            .active_sources
            .push(OrderedEventSource::new(EventProviderType::Calendar, id, rank as u32));
    }
}
