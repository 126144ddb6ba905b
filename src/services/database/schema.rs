// Calendar store schema
// Step N upgrades a database at user_version N to N + 1

/// Instant columns hold epoch milliseconds; all-day instances are stored at
/// UTC midnight. Colors are signed 32-bit ARGB values.
pub const STEPS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS calendars (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        summary TEXT,
        color INTEGER NOT NULL DEFAULT 0,
        available INTEGER NOT NULL DEFAULT 1
    );
    CREATE TABLE IF NOT EXISTS instances (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        calendar_id INTEGER,
        event_id INTEGER,
        status INTEGER,
        title TEXT,
        begin INTEGER,
        end INTEGER,
        all_day INTEGER,
        event_location TEXT,
        has_alarm INTEGER,
        rrule TEXT,
        display_color INTEGER
    );
    CREATE INDEX IF NOT EXISTS idx_instances_begin ON instances(begin);",
    "ALTER TABLE instances ADD COLUMN description TEXT;",
    "ALTER TABLE instances ADD COLUMN self_attendee_status INTEGER;
    CREATE INDEX IF NOT EXISTS idx_instances_calendar ON instances(calendar_id);",
];

/// Version of a fully migrated database.
pub fn latest_version() -> u32 {
    STEPS.len() as u32
}
