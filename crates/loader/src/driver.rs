//! Ingestion driver.
//!
//! Whole-file mode:
//! `Start -> Loaded -> Normalized -> Coerced -> Connected -> Inserted -> Done`.
//! Every stage before `Connected` runs without touching the database, and
//! any error ends the run.
//!
//! Chunked mode:
//! `Start -> Connected -> Provisioned -> {ReadChunk -> InsertChunk}* -> Done`.
//! Each chunk commits on its own. A failing chunk stops the loop but leaves
//! earlier chunks committed; the failure is recorded in the summary rather
//! than returned.

use ohlcv_core::{Config, LoadMode, RawTable, Result};
use ohlcv_ingestion::{normalize_headers, normalize_table, read_table, ChunkReader, RowCoercer};
use ohlcv_store::{ensure_table, open_connection, BatchInserter, Connection};
use serde::Serialize;

/// Pipeline stage, as last reached by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    Loaded,
    Normalized,
    Coerced,
    Connected,
    Provisioned,
    ReadChunk,
    InsertChunk,
    Inserted,
    Done,
}

/// Outcome of one committed chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkReport {
    /// One-based chunk number.
    pub index: usize,
    /// Rows read from the source for this chunk.
    pub rows_read: usize,
    /// Rows the database reported as inserted.
    pub rows_inserted: usize,
    /// Rows dropped by coercion.
    pub rows_skipped: usize,
}

/// What a run did.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Pipeline variant.
    pub mode: LoadMode,
    /// Destination table.
    pub table: String,
    /// Last stage reached.
    pub stage: Stage,
    /// Rows read from the source.
    pub rows_read: u64,
    /// Rows committed to the database.
    pub rows_inserted: u64,
    /// Rows dropped by coercion.
    pub rows_skipped: u64,
    /// Rows with an unparseable timestamp.
    pub unparsed_timestamps: u64,
    /// Committed chunks (chunked mode only).
    pub chunks: Vec<ChunkReport>,
    /// Why the run stopped early, if it did after committing something.
    pub failure: Option<String>,
}

impl RunSummary {
    fn new(config: &Config) -> Self {
        Self {
            mode: config.mode,
            table: config.table.clone(),
            stage: Stage::Start,
            rows_read: 0,
            rows_inserted: 0,
            rows_skipped: 0,
            unparsed_timestamps: 0,
            chunks: Vec::new(),
            failure: None,
        }
    }

    fn enter(&mut self, stage: Stage) {
        tracing::debug!(?stage, "Entering stage");
        self.stage = stage;
    }

    fn absorb(&mut self, coercer: &RowCoercer) {
        let stats = coercer.stats();
        self.rows_skipped = stats.rows_skipped;
        self.unparsed_timestamps = stats.unparsed_timestamps;
    }

    /// Whether the run reached `Done` without a recorded failure.
    pub fn is_complete(&self) -> bool {
        self.stage == Stage::Done && self.failure.is_none()
    }
}

/// Run the pipeline in the mode the config asks for.
pub fn run(config: &Config) -> Result<RunSummary> {
    match config.mode {
        LoadMode::WholeFile => run_whole_file(config),
        LoadMode::Chunked => run_chunked(config),
    }
}

/// Load the whole source as one batch.
pub fn run_whole_file(config: &Config) -> Result<RunSummary> {
    let mut summary = RunSummary::new(config);

    let table = read_table(&config.csv_file)?;
    summary.rows_read = table.len() as u64;
    summary.enter(Stage::Loaded);

    let rows = normalize_table(&table)?;
    drop(table);
    summary.enter(Stage::Normalized);

    let mut coercer = RowCoercer::new(config.policy);
    let batch = coercer.coerce_batch(rows)?;
    summary.absorb(&coercer);
    summary.enter(Stage::Coerced);

    let mut conn = open_connection(&config.database)?;
    summary.enter(Stage::Connected);

    let inserter = BatchInserter::new(config.table.as_str());
    let inserted = inserter.insert(&mut conn, &batch.records)?;
    summary.rows_inserted = inserted as u64;
    summary.enter(Stage::Inserted);

    tracing::info!("Inserted {inserted} rows into {}", config.table);
    if summary.rows_skipped > 0 {
        tracing::warn!("Skipped {} malformed row(s)", summary.rows_skipped);
    }

    summary.enter(Stage::Done);
    Ok(summary)
}

/// Load the source window by window, committing each window.
pub fn run_chunked(config: &Config) -> Result<RunSummary> {
    let mut summary = RunSummary::new(config);

    let mut conn = open_connection(&config.database)?;
    summary.enter(Stage::Connected);

    ensure_table(&conn, &config.table)?;
    summary.enter(Stage::Provisioned);

    let reader = ChunkReader::open(&config.csv_file, config.chunk_size)?;
    normalize_headers(reader.headers())?;

    let inserter = BatchInserter::new(config.table.as_str());
    let mut coercer = RowCoercer::new(config.policy);

    for (i, chunk) in reader.enumerate() {
        let index = i + 1;
        summary.enter(Stage::ReadChunk);

        let outcome = chunk.and_then(|table| {
            summary.rows_read += table.len() as u64;
            summary.enter(Stage::InsertChunk);
            load_chunk(&mut conn, &inserter, &mut coercer, &table, index)
        });

        match outcome {
            Ok(report) => {
                summary.rows_inserted += report.rows_inserted as u64;
                summary.chunks.push(report);
            }
            Err(e) => {
                tracing::error!("Error loading chunk {index}: {e}");
                summary.failure = Some(e.to_string());
                break;
            }
        }
    }

    summary.absorb(&coercer);
    drop(conn);
    tracing::info!("Connection to {} closed", config.database.display());

    if summary.failure.is_none() {
        summary.enter(Stage::Done);
    }
    tracing::info!(
        "Inserted {} rows into {} across {} chunk(s)",
        summary.rows_inserted,
        config.table,
        summary.chunks.len()
    );
    Ok(summary)
}

fn load_chunk(
    conn: &mut Connection,
    inserter: &BatchInserter,
    coercer: &mut RowCoercer,
    table: &RawTable,
    index: usize,
) -> Result<ChunkReport> {
    let rows = normalize_table(table)?;
    let batch = coercer.coerce_batch(rows)?;
    let inserted = inserter.insert(conn, &batch.records)?;

    tracing::info!("Inserted {inserted} rows (chunk {index})");
    Ok(ChunkReport {
        index,
        rows_read: table.len(),
        rows_inserted: inserted,
        rows_skipped: batch.skipped,
    })
}
