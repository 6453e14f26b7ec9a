//! Schema normalization onto the canonical OHLCV columns.
//!
//! Mapping is strictly positional: the first six source columns become
//! `date, open, high, low, close, volume` whatever their header names are.
//! Extra columns are dropped. Fewer than six columns is a schema mismatch.

use ohlcv_core::{
    Error, NormalizedRow, RawTable, Result, CANONICAL_COLUMNS, CANONICAL_WIDTH,
};

/// Positional mapping from source columns to canonical columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    /// Source header names that were mapped, in canonical order.
    pub source: Vec<String>,
    /// Source columns that were dropped.
    pub dropped: Vec<String>,
}

impl ColumnMapping {
    /// Canonical names, in order.
    pub fn canonical(&self) -> [&'static str; CANONICAL_WIDTH] {
        CANONICAL_COLUMNS
    }
}

/// Validate a header row and build the positional mapping.
pub fn normalize_headers(headers: &[String]) -> Result<ColumnMapping> {
    if headers.len() < CANONICAL_WIDTH {
        return Err(Error::SchemaMismatch {
            found: headers.len(),
            expected: CANONICAL_WIDTH,
        });
    }

    let (kept, extra) = headers.split_at(CANONICAL_WIDTH);
    Ok(ColumnMapping {
        source: kept.to_vec(),
        dropped: extra.to_vec(),
    })
}

/// Normalize a whole table.
pub fn normalize_table(table: &RawTable) -> Result<Vec<NormalizedRow>> {
    let mapping = normalize_headers(&table.headers)?;

    if !mapping.dropped.is_empty() {
        tracing::debug!(
            dropped = ?mapping.dropped,
            "Dropping {} extra source column(s)",
            mapping.dropped.len()
        );
    }

    Ok(table.rows.iter().map(NormalizedRow::from_raw).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ohlcv_core::RawRecord;
    use proptest::prelude::*;

    fn headers(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("col{i}")).collect()
    }

    fn table(width: usize, rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers(width),
            rows: rows.iter().map(|r| RawRecord::new(r.iter().copied())).collect(),
        }
    }

    #[test]
    fn test_six_columns_renamed_positionally() {
        let t = table(6, &[&["2024-01-01 09:15:00", "100", "105", "99", "102", "1000"]]);
        let rows = normalize_table(&t).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, "2024-01-01 09:15:00");
        assert_eq!(rows[0].open, "100");
        assert_eq!(rows[0].high, "105");
        assert_eq!(rows[0].low, "99");
        assert_eq!(rows[0].close, "102");
        assert_eq!(rows[0].volume, "1000");
    }

    #[test]
    fn test_header_names_are_ignored() {
        // "close" in position 1 still maps to open.
        let t = RawTable {
            headers: ["ts", "close", "x", "y", "z", "w"].map(String::from).to_vec(),
            rows: vec![RawRecord::new(["t", "1", "2", "3", "4", "5"])],
        };
        let rows = normalize_table(&t).unwrap();
        assert_eq!(rows[0].open, "1");
    }

    #[test]
    fn test_seventh_column_dropped() {
        let t = table(
            7,
            &[&["2024-01-01 09:15:00", "100", "105", "99", "102", "1000", "annotation"]],
        );
        let mapping = normalize_headers(&t.headers).unwrap();
        assert_eq!(mapping.dropped, vec!["col6".to_string()]);

        let rows = normalize_table(&t).unwrap();
        assert_eq!(rows[0].volume, "1000");
    }

    #[test]
    fn test_too_few_columns() {
        let t = table(5, &[&["2024-01-01 09:15:00", "100", "105", "99", "102"]]);
        let err = normalize_table(&t).unwrap_err();

        assert!(matches!(err, Error::SchemaMismatch { found: 5, expected: 6 }));
    }

    #[test]
    fn test_empty_table_with_valid_header() {
        let t = table(6, &[]);
        assert!(normalize_table(&t).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn prop_width_decides_outcome(width in 0usize..20) {
            let result = normalize_headers(&headers(width));
            if width >= CANONICAL_WIDTH {
                let mapping = result.unwrap();
                prop_assert_eq!(mapping.source.len(), CANONICAL_WIDTH);
                prop_assert_eq!(mapping.dropped.len(), width - CANONICAL_WIDTH);
                prop_assert_eq!(mapping.canonical(), CANONICAL_COLUMNS);
            } else {
                let is_mismatch = matches!(
                    result,
                    Err(Error::SchemaMismatch { found, expected: 6 }) if found == width
                );
                prop_assert!(is_mismatch);
            }
        }
    }
}
