//! Batched, transactional inserts of canonical records.
//!
//! One call inserts one batch inside one transaction. If any row fails the
//! transaction is dropped uncommitted and nothing from the batch is stored.

use ohlcv_core::{CanonicalRecord, Error, Result};
use rusqlite::{params, Connection};

/// Parameterized insert for one canonical record.
pub fn insert_statement(table: &str) -> String {
    format!(
        "INSERT INTO \"{table}\" (timestamp, open, high, low, close, volume) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
    )
}

/// Inserts batches into a fixed destination table.
#[derive(Debug, Clone)]
pub struct BatchInserter {
    table: String,
    sql: String,
}

impl BatchInserter {
    /// Create an inserter for `table`.
    pub fn new(table: impl Into<String>) -> Self {
        let table = table.into();
        let sql = insert_statement(&table);
        Self { table, sql }
    }

    /// Insert `records` and commit. Returns the number of rows affected.
    ///
    /// An empty batch is a no-op and never touches the connection.
    pub fn insert(&self, conn: &mut Connection, records: &[CanonicalRecord]) -> Result<usize> {
        if records.is_empty() {
            tracing::debug!("Empty batch for {}, nothing to insert", self.table);
            return Ok(0);
        }

        let fail = |e: rusqlite::Error| Error::insert(format!("{}: {e}", self.table));

        let tx = conn.transaction().map_err(fail)?;
        let mut affected = 0;
        {
            let mut stmt = tx.prepare_cached(&self.sql).map_err(fail)?;
            for record in records {
                affected += stmt
                    .execute(params![
                        record.timestamp,
                        record.open,
                        record.high,
                        record.low,
                        record.close,
                        record.volume,
                    ])
                    .map_err(fail)?;
            }
        }
        tx.commit().map_err(fail)?;

        tracing::debug!("Committed {affected} rows into {}", self.table);
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provisioner::ensure_table;
    use crate::query::{count_rows, fetch_records};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn record(minute: u32, close: f64, volume: i64) -> CanonicalRecord {
        CanonicalRecord {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(9, minute, 0)
                .unwrap(),
            open: 100.0,
            high: 105.25,
            low: 99.5,
            close,
            volume,
        }
    }

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        ensure_table(&conn, "bars").unwrap();
        conn
    }

    #[test]
    fn test_statement_shape() {
        assert_eq!(
            insert_statement("bars"),
            "INSERT INTO \"bars\" (timestamp, open, high, low, close, volume) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        );
    }

    #[test]
    fn test_insert_and_read_back() {
        let mut conn = setup();
        let inserter = BatchInserter::new("bars");
        let batch = vec![record(15, 102.125, 1000), record(16, 103.5, 1500)];

        let affected = inserter.insert(&mut conn, &batch).unwrap();
        assert_eq!(affected, 2);

        let stored = fetch_records(&conn, "bars").unwrap();
        assert_eq!(stored.len(), 2);
        for (got, want) in stored.iter().zip(&batch) {
            assert_eq!(got.timestamp, want.timestamp);
            assert_relative_eq!(got.open, want.open, epsilon = 1e-9);
            assert_relative_eq!(got.high, want.high, epsilon = 1e-9);
            assert_relative_eq!(got.low, want.low, epsilon = 1e-9);
            assert_relative_eq!(got.close, want.close, epsilon = 1e-9);
            assert_eq!(got.volume, want.volume);
        }
    }

    #[test]
    fn test_empty_batch() {
        let mut conn = setup();
        let inserter = BatchInserter::new("bars");

        assert_eq!(inserter.insert(&mut conn, &[]).unwrap(), 0);
        assert_eq!(count_rows(&conn, "bars").unwrap(), 0);
    }

    #[test]
    fn test_missing_table_is_insert_error() {
        let mut conn = Connection::open_in_memory().unwrap();
        let inserter = BatchInserter::new("nowhere");

        let err = inserter.insert(&mut conn, &[record(15, 1.0, 1)]).unwrap_err();
        assert!(matches!(err, Error::Insert(ref msg) if msg.contains("nowhere")));
    }

    #[test]
    fn test_failed_batch_is_rolled_back() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE bars (
                timestamp DATETIME, open REAL, high REAL, low REAL, close REAL,
                volume INTEGER CHECK (volume >= 0)
            )",
        )
        .unwrap();
        let inserter = BatchInserter::new("bars");
        let batch = vec![record(15, 1.0, 10), record(16, 1.0, 20), record(17, 1.0, -1)];

        assert!(inserter.insert(&mut conn, &batch).is_err());
        assert_eq!(count_rows(&conn, "bars").unwrap(), 0);

        // The connection stays usable after the rollback.
        assert_eq!(inserter.insert(&mut conn, &batch[..2]).unwrap(), 2);
    }
}
