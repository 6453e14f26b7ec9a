//! Read-side helpers over the destination table.

use ohlcv_core::{CanonicalRecord, Error, Result};
use rusqlite::Connection;

fn query_error(table: &str, e: rusqlite::Error) -> Error {
    Error::connection(format!("query {table}: {e}"))
}

/// Number of rows currently stored in `table`.
pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    conn.query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| {
        row.get(0)
    })
    .map_err(|e| query_error(table, e))
}

/// Every stored record, in insertion order.
pub fn fetch_records(conn: &Connection, table: &str) -> Result<Vec<CanonicalRecord>> {
    let sql = format!(
        "SELECT timestamp, open, high, low, close, volume FROM \"{table}\" ORDER BY rowid"
    );
    let mut stmt = conn.prepare(&sql).map_err(|e| query_error(table, e))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(CanonicalRecord {
                timestamp: row.get(0)?,
                open: row.get(1)?,
                high: row.get(2)?,
                low: row.get(3)?,
                close: row.get(4)?,
                volume: row.get(5)?,
            })
        })
        .map_err(|e| query_error(table, e))?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| query_error(table, e))
}
