//! Destination table provisioning.

use ohlcv_core::{Error, Result};
use rusqlite::{Connection, OptionalExtension};

/// DDL for the destination table. Safe to run repeatedly.
pub fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS \"{table}\" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp DATETIME,
            open REAL,
            high REAL,
            low REAL,
            close REAL,
            volume INTEGER
        )"
    )
}

/// Make sure `table` exists. Never alters an existing table.
pub fn ensure_table(conn: &Connection, table: &str) -> Result<()> {
    conn.execute_batch(&create_table_sql(table))
        .map_err(|e| Error::provision(format!("create table {table}: {e}")))?;

    tracing::info!("Table {table} is ready");
    Ok(())
}

/// Whether `table` exists in the main schema.
pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| Error::connection(e.to_string()))?;

    Ok(found.is_some())
}
