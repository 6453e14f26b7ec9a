//! Ingestion driver for the OHLCV loader.
//!
//! This crate provides:
//! - Whole-file and chunked load drivers
//! - Run summaries
//! - The command-line surface used by the `ohlcv-loader` binary

pub mod cli;
pub mod driver;

pub use cli::{Cli, Command};
pub use driver::{run, run_chunked, run_whole_file, ChunkReport, RunSummary, Stage};
