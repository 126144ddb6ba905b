// Database service module
// SQLite-backed calendar store

mod connection;
mod migrations;
mod schema;

pub use connection::Database;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, Row};

use crate::models::event_source::{EventProviderType, EventSource};
use crate::models::query_result::EventRow;
use crate::services::provider::{
    EventRows, EventStore, InstanceQuery, ProviderError, ATTENDEE_STATUS_DECLINED,
};

const INSTANCE_COLUMNS: &str = "i.calendar_id, i.event_id, i.status, i.title, i.begin, i.end, \
     i.all_day, i.event_location, i.description, i.has_alarm, i.rrule, i.display_color, \
     c.color, i.self_attendee_status";

/// Calendar store kept in a SQLite file.
pub struct SqliteEventStore {
    db: Mutex<Database>,
    access: AtomicBool,
}

impl SqliteEventStore {
    /// Opens the database at `path` and creates the schema.
    pub fn open(path: &str) -> Result<Self> {
        let db = Database::open(path)?;
        Ok(Self {
            db: Mutex::new(db),
            access: AtomicBool::new(true),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    /// Simulates a revoked or granted read permission.
    pub fn set_access(&self, access: bool) {
        self.access.store(access, Ordering::SeqCst);
    }

    fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_calendar(&self, calendar: &EventSource) -> Result<()> {
        self.db()
            .connection()
            .execute(
                "INSERT OR REPLACE INTO calendars (id, title, summary, color, available)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    calendar.id,
                    calendar.title,
                    calendar.summary,
                    calendar.color as i32,
                    calendar.available,
                ],
            )
            .with_context(|| format!("Failed to insert calendar {}", calendar.id))?;
        Ok(())
    }

    /// Inserts one instance row and returns its row id.
    pub fn insert_instance(&self, row: &EventRow) -> Result<i64> {
        let db = self.db();
        db.connection()
            .execute(
                "INSERT INTO instances (calendar_id, event_id, status, title, begin, end, all_day,
                     event_location, description, has_alarm, rrule, display_color,
                     self_attendee_status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    row.calendar_id,
                    row.event_id,
                    row.status,
                    row.title,
                    row.begin,
                    row.end,
                    row.all_day,
                    row.event_location,
                    row.description,
                    row.has_alarm,
                    row.rrule,
                    row.display_color,
                    row.self_attendee_status,
                ],
            )
            .context("Failed to insert instance")?;
        Ok(db.connection().last_insert_rowid())
    }

    pub fn instance_count(&self) -> Result<i64> {
        self.db()
            .connection()
            .query_row("SELECT COUNT(*) FROM instances", [], |row| row.get(0))
            .context("Failed to count instances")
    }
}

fn instances_sql(query: &InstanceQuery) -> String {
    let mut sql = format!(
        "SELECT {} FROM instances i LEFT JOIN calendars c ON c.id = i.calendar_id
         WHERE (i.self_attendee_status IS NULL OR i.self_attendee_status != {})
           AND (i.begin IS NULL OR (i.begin <= ?1 AND MAX(COALESCE(i.end, i.begin), i.begin) >= ?2))",
        INSTANCE_COLUMNS, ATTENDEE_STATUS_DECLINED
    );
    if !query.calendar_ids.is_empty() {
        let placeholders: Vec<String> = (0..query.calendar_ids.len())
            .map(|index| format!("?{}", index + 3))
            .collect();
        sql.push_str(&format!(
            " AND (i.calendar_id IS NULL OR i.calendar_id IN ({}))",
            placeholders.join(", ")
        ));
    }
    if query.only_default_color {
        sql.push_str(" AND i.display_color IS NOT NULL AND i.display_color = c.color");
    }
    // Floor division, so instants before the epoch land on their own day.
    sql.push_str(
        " ORDER BY (i.begin - ((i.begin % 86400000) + 86400000) % 86400000) / 86400000, \
         i.all_day DESC, i.begin",
    );
    sql
}

fn event_row(row: &Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        calendar_id: row.get(0)?,
        event_id: row.get(1)?,
        status: row.get(2)?,
        title: row.get(3)?,
        begin: row.get(4)?,
        end: row.get(5)?,
        all_day: row.get(6)?,
        event_location: row.get(7)?,
        description: row.get(8)?,
        has_alarm: row.get(9)?,
        rrule: row.get(10)?,
        display_color: row.get(11)?,
        calendar_color: row.get(12)?,
        self_attendee_status: row.get(13)?,
    })
}

impl EventStore for SqliteEventStore {
    fn has_access(&self) -> bool {
        self.access.load(Ordering::SeqCst)
    }

    fn instances(&self, query: &InstanceQuery) -> Result<EventRows, ProviderError> {
        if !self.has_access() {
            return Err(ProviderError::PermissionDenied(
                "calendar database is not readable".to_string(),
            ));
        }

        let mut values = vec![
            query.window.end.timestamp_millis(),
            query.window.start.timestamp_millis(),
        ];
        values.extend(query.calendar_ids.iter().copied());

        let db = self.db();
        let mut stmt = db.connection().prepare(&instances_sql(query))?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), event_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        log::debug!("SQLite store returned {} instances", rows.len());

        Ok(Box::new(rows.into_iter()))
    }

    fn calendars(&self) -> Result<Vec<EventSource>, ProviderError> {
        let db = self.db();
        let mut stmt = db
            .connection()
            .prepare("SELECT id, title, summary, color, available FROM calendars ORDER BY id")?;
        let calendars = stmt
            .query_map([], |row| {
                Ok(EventSource {
                    provider_type: EventProviderType::Calendar,
                    id: row.get(0)?,
                    title: row.get(1)?,
                    summary: row.get(2)?,
                    color: row.get::<_, i32>(3)? as u32,
                    available: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(calendars)
    }
}
