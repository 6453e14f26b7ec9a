//! Core data types for the OHLCV loader.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Canonical column names, in storage order.
pub const CANONICAL_COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

/// Number of canonical columns.
pub const CANONICAL_WIDTH: usize = CANONICAL_COLUMNS.len();

/// Pattern every source timestamp must match.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One source row as untyped cells, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    /// Cell values in source column order.
    pub cells: Vec<String>,
}

impl RawRecord {
    /// Create a record from cell values.
    pub fn new<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of cells.
    #[inline]
    pub fn width(&self) -> usize {
        self.cells.len()
    }

    /// Cell at `index`, or an empty string when the row is short.
    #[inline]
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }
}

/// A parsed source table of unknown width.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Header names as they appear in the source.
    pub headers: Vec<String>,
    /// Data rows.
    pub rows: Vec<RawRecord>,
}

impl RawTable {
    /// Table width, taken from the header row.
    #[inline]
    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// Number of data rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A row projected onto the canonical columns, still untyped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedRow {
    /// Raw timestamp text (source column 0).
    pub date: String,
    /// Raw open price (source column 1).
    pub open: String,
    /// Raw high price (source column 2).
    pub high: String,
    /// Raw low price (source column 3).
    pub low: String,
    /// Raw close price (source column 4).
    pub close: String,
    /// Raw volume (source column 5).
    pub volume: String,
}

impl NormalizedRow {
    /// Project the first six cells of a raw record, positionally.
    pub fn from_raw(record: &RawRecord) -> Self {
        Self {
            date: record.cell(0).to_string(),
            open: record.cell(1).to_string(),
            high: record.cell(2).to_string(),
            low: record.cell(3).to_string(),
            close: record.cell(4).to_string(),
            volume: record.cell(5).to_string(),
        }
    }
}

/// A normalized row whose timestamp has been parsed.
///
/// `timestamp` is `None` when the date cell did not match [`TIMESTAMP_FORMAT`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    /// Parsed timestamp, `None` if unparseable.
    pub timestamp: Option<NaiveDateTime>,
    /// The untyped row the timestamp came from.
    pub row: NormalizedRow,
}

/// A fully typed OHLCV bar, ready for storage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Bar timestamp (timezone-naive).
    pub timestamp: NaiveDateTime,
    /// Open price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Close price.
    pub close: f64,
    /// Traded volume.
    pub volume: i64,
}

/// Records built from one input slice, consumed by a single insert.
pub type Batch = Vec<CanonicalRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_record_short_row() {
        let record = RawRecord::new(["2024-01-01 09:15:00", "100"]);
        assert_eq!(record.width(), 2);
        assert_eq!(record.cell(1), "100");
        assert_eq!(record.cell(5), "");
    }

    #[test]
    fn test_normalized_row_positional() {
        let record = RawRecord::new(["t", "o", "h", "l", "c", "v", "note"]);
        let row = NormalizedRow::from_raw(&record);
        assert_eq!(row.date, "t");
        assert_eq!(row.volume, "v");
    }

    #[test]
    fn test_canonical_width() {
        assert_eq!(CANONICAL_WIDTH, 6);
        assert_eq!(CANONICAL_COLUMNS[0], "date");
        assert_eq!(CANONICAL_COLUMNS[5], "volume");
    }
}
