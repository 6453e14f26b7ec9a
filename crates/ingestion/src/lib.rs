//! Source reading and row preparation for the OHLCV loader.
//!
//! This crate handles:
//! - CSV reading, whole file or in fixed-size windows
//! - Positional schema normalization
//! - Timestamp parsing and row coercion with per-row failure isolation

pub mod reader;
pub mod normalizer;
pub mod coercer;

pub use reader::{read_table, read_table_from, ChunkReader};
pub use normalizer::{normalize_headers, normalize_table, ColumnMapping};
pub use coercer::{
    coerce_row, parse_timestamp, parse_timestamps, CoercedBatch, CoercionStats, RowCoercer,
    TimestampPass,
};
