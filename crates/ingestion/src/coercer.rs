//! Row validation and coercion into canonical records.
//!
//! Coercion runs in two passes over a batch:
//! 1. Timestamp pass: every `date` cell is parsed against
//!    [`TIMESTAMP_FORMAT`]. Failures become `None`, never an error, and a
//!    single warning is logged for the batch.
//! 2. Row pass: each row is coerced into a [`CanonicalRecord`]. A missing
//!    timestamp, a bad price, or a bad volume fails that row only.

use chrono::NaiveDateTime;
use ohlcv_core::{
    Batch, CanonicalRecord, CoercionError, CoercionPolicy, NormalizedRow, ParsedRow, Result,
    TIMESTAMP_FORMAT,
};

/// Output of the timestamp pass.
#[derive(Debug, Clone)]
pub struct TimestampPass {
    /// Rows in input order, timestamps parsed.
    pub rows: Vec<ParsedRow>,
    /// Rows whose timestamp could not be parsed.
    pub unparsed: usize,
}

/// Output of coercing one batch.
#[derive(Debug, Clone, Default)]
pub struct CoercedBatch {
    /// Accepted records, in input order.
    pub records: Batch,
    /// Rows dropped by coercion.
    pub skipped: usize,
    /// Rows whose timestamp could not be parsed.
    pub unparsed_timestamps: usize,
}

/// Running counters across every batch a coercer has seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoercionStats {
    /// Rows offered to the coercer.
    pub rows_seen: u64,
    /// Rows turned into canonical records.
    pub rows_accepted: u64,
    /// Rows skipped under [`CoercionPolicy::SkipRow`].
    pub rows_skipped: u64,
    /// Rows with an unparseable timestamp.
    pub unparsed_timestamps: u64,
}

impl CoercionStats {
    /// Fraction of seen rows that were skipped.
    pub fn skipped_frac(&self) -> f64 {
        if self.rows_seen > 0 {
            self.rows_skipped as f64 / self.rows_seen as f64
        } else {
            0.0
        }
    }
}

/// Parse a timestamp in the fixed `YYYY-MM-DD HH:MM:SS` pattern.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).ok()
}

/// Parse the `date` column of every row, keeping rows that fail.
pub fn parse_timestamps(rows: Vec<NormalizedRow>) -> TimestampPass {
    let mut unparsed = 0;
    let rows: Vec<ParsedRow> = rows
        .into_iter()
        .map(|row| {
            let timestamp = parse_timestamp(&row.date);
            if timestamp.is_none() {
                unparsed += 1;
            }
            ParsedRow { timestamp, row }
        })
        .collect();

    if unparsed > 0 {
        tracing::warn!("Some timestamps could not be parsed ({unparsed} row(s))");
    }

    TimestampPass { rows, unparsed }
}

fn parse_price(row: usize, field: &'static str, raw: &str) -> std::result::Result<f64, CoercionError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|e| CoercionError::new(row, field, raw, format!("{e}")))?;

    if !value.is_finite() {
        return Err(CoercionError::new(row, field, raw, "not a finite number"));
    }
    Ok(value)
}

fn parse_volume(row: usize, raw: &str) -> std::result::Result<i64, CoercionError> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Ok(value);
    }

    // Integral decimals such as "1000.0" are accepted.
    let value: f64 = trimmed
        .parse()
        .map_err(|_| CoercionError::new(row, "volume", raw, "not an integer"))?;

    if value.is_finite()
        && value.fract() == 0.0
        && value >= i64::MIN as f64
        && value < i64::MAX as f64
    {
        Ok(value as i64)
    } else {
        Err(CoercionError::new(row, "volume", raw, "not an integer"))
    }
}

/// Coerce one parsed row into a canonical record.
pub fn coerce_row(parsed: &ParsedRow, index: usize) -> std::result::Result<CanonicalRecord, CoercionError> {
    let row = &parsed.row;
    let timestamp = parsed.timestamp.ok_or_else(|| {
        CoercionError::new(
            index,
            "date",
            row.date.as_str(),
            format!("does not match {TIMESTAMP_FORMAT}"),
        )
    })?;

    Ok(CanonicalRecord {
        timestamp,
        open: parse_price(index, "open", &row.open)?,
        high: parse_price(index, "high", &row.high)?,
        low: parse_price(index, "low", &row.low)?,
        close: parse_price(index, "close", &row.close)?,
        volume: parse_volume(index, &row.volume)?,
    })
}

/// Turns normalized rows into batches of canonical records.
pub struct RowCoercer {
    policy: CoercionPolicy,
    stats: CoercionStats,
}

impl RowCoercer {
    /// Create a new coercer.
    pub fn new(policy: CoercionPolicy) -> Self {
        Self {
            policy,
            stats: CoercionStats::default(),
        }
    }

    /// Coerce one batch.
    ///
    /// Row indices in errors and logs count from the first row this coercer
    /// ever saw, so they stay meaningful across chunks.
    pub fn coerce_batch(&mut self, rows: Vec<NormalizedRow>) -> Result<CoercedBatch> {
        let offset = self.stats.rows_seen as usize;
        let pass = parse_timestamps(rows);

        let mut out = CoercedBatch {
            records: Vec::with_capacity(pass.rows.len()),
            skipped: 0,
            unparsed_timestamps: pass.unparsed,
        };

        self.stats.rows_seen += pass.rows.len() as u64;
        self.stats.unparsed_timestamps += pass.unparsed as u64;

        for (i, parsed) in pass.rows.iter().enumerate() {
            match coerce_row(parsed, offset + i) {
                Ok(record) => out.records.push(record),
                Err(err) => match self.policy {
                    CoercionPolicy::SkipRow => {
                        tracing::warn!("Skipping row due to error: {err}");
                        out.skipped += 1;
                    }
                    CoercionPolicy::FailFast => {
                        self.stats.rows_accepted += out.records.len() as u64;
                        self.stats.rows_skipped += out.skipped as u64;
                        return Err(err.into());
                    }
                },
            }
        }

        self.stats.rows_accepted += out.records.len() as u64;
        self.stats.rows_skipped += out.skipped as u64;

        Ok(out)
    }

    /// Get coercion statistics.
    pub fn stats(&self) -> &CoercionStats {
        &self.stats
    }
}

impl Default for RowCoercer {
    fn default() -> Self {
        Self::new(CoercionPolicy::default())
    }
}
