//! Relational persistence for the OHLCV loader.
//!
//! This crate provides:
//! - SQLite connection opening
//! - Idempotent destination table provisioning
//! - Transactional batch inserts
//! - Read-back helpers

pub mod connection;
pub mod provisioner;
pub mod inserter;
pub mod query;

pub use connection::open_connection;
pub use provisioner::{ensure_table, table_exists};
pub use inserter::BatchInserter;
pub use query::{count_rows, fetch_records};
pub use rusqlite::Connection;
