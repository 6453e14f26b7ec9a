//! SQLite connection helpers.

use std::path::Path;
use std::time::Duration;

use ohlcv_core::{Error, Result};
use rusqlite::{Connection, OpenFlags};

/// How long a write waits on a locked database before failing.
pub const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Open (creating if needed) the database at `path`.
///
/// The connection is closed when the returned value is dropped.
pub fn open_connection(path: &Path) -> Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;

    let conn = Connection::open_with_flags(path, flags).map_err(|e| {
        Error::connection(format!("open '{}': {e}", path.display()))
    })?;

    conn.busy_timeout(BUSY_TIMEOUT)
        .map_err(|e| Error::connection(e.to_string()))?;

    tracing::info!("Connected to {}", path.display());
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bars.db");

        let conn = open_connection(&path).unwrap();
        conn.execute_batch("CREATE TABLE t (x INTEGER)").unwrap();
        drop(conn);

        assert!(path.exists());
    }

    #[test]
    fn test_open_in_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("bars.db");

        let err = open_connection(&path).unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }
}
