use anyhow::{Context, Result};
use rusqlite::Connection;

use super::migrations;

/// Calendar store connection, migrated to the latest schema on open.
pub struct Database {
    conn: Connection,
    path: String,
}

impl Database {
    /// Opens (or creates) the store at `path`; ":memory:" gives a throwaway
    /// database.
    pub fn open(path: &str) -> Result<Self> {
        let conn =
            Connection::open(path).context(format!("Failed to open calendar store at {}", path))?;
        let version = migrations::migrate(&conn)?;
        log::debug!("Opened calendar store {} at schema version {}", path, version);

        Ok(Self {
            conn,
            path: path.to_string(),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn schema_version(&self) -> Result<u32> {
        migrations::schema_version(&self.conn)
    }
}
