use anyhow::{Context, Result};
use rusqlite::Connection;

use super::schema;

pub fn schema_version(conn: &Connection) -> Result<u32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .context("Failed to read schema version")
}

/// Apply every pending step, each in its own transaction.
pub fn migrate(conn: &Connection) -> Result<u32> {
    let mut version = schema_version(conn)?;
    let latest = schema::latest_version();
    if version > latest {
        anyhow::bail!(
            "Database schema version {} is newer than supported version {}",
            version,
            latest
        );
    }

    for step in &schema::STEPS[version as usize..] {
        let tx = conn
            .unchecked_transaction()
            .context("Failed to start migration")?;
        tx.execute_batch(step)
            .with_context(|| format!("Failed to migrate schema to version {}", version + 1))?;
        tx.pragma_update(None, "user_version", version + 1)
            .context("Failed to record schema version")?;
        tx.commit().context("Failed to commit migration")?;

        version += 1;
        log::info!("Calendar store schema migrated to version {}", version);
    }
    Ok(version)
}
