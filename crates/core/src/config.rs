//! Configuration structures for the OHLCV loader.
//!
//! A [`Config`] is built once at process entry and passed by reference into
//! the driver. Nothing below the binary reads the environment.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable naming the SQLite database file.
pub const ENV_DATABASE: &str = "DATABASE";
/// Environment variable naming the destination table.
pub const ENV_TABLE_NAME: &str = "TABLE_NAME";
/// Environment variable naming the source CSV file.
pub const ENV_CSV_FILE: &str = "CSV_FILE";
/// Environment variable overriding the chunked-mode window size.
pub const ENV_CHUNK_SIZE: &str = "CHUNK_SIZE";

/// Table used by chunked mode when none is configured.
pub const DEFAULT_CHUNKED_TABLE: &str = "hdfc_ohlcv";
/// Rows per window in chunked mode.
pub const DEFAULT_CHUNK_SIZE: usize = 5000;

/// Which pipeline variant a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    /// Read the whole file, insert one batch.
    WholeFile,
    /// Read fixed-size windows, insert and commit each one.
    Chunked,
}

/// What to do with a row that fails coercion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoercionPolicy {
    /// Log and skip the row, keep going.
    #[default]
    SkipRow,
    /// Fail the whole batch on the first bad row.
    FailFast,
}

/// Run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Pipeline variant.
    pub mode: LoadMode,
    /// SQLite database file.
    pub database: PathBuf,
    /// Destination table.
    pub table: String,
    /// Source CSV file.
    pub csv_file: PathBuf,
    /// Rows per window (chunked mode only).
    pub chunk_size: usize,
    /// Row coercion policy.
    pub policy: CoercionPolicy,
}

impl Config {
    /// Build a configuration from the process environment.
    pub fn from_env(mode: LoadMode) -> Result<Self> {
        Self::from_lookup(mode, |key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Empty values count as missing. The result is validated before it is
    /// returned.
    pub fn from_lookup<F>(mode: LoadMode, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| Error::config(format!("missing {key}")))
        };

        let database = PathBuf::from(require(ENV_DATABASE)?);
        let csv_file = PathBuf::from(require(ENV_CSV_FILE)?);

        let table = match mode {
            LoadMode::WholeFile => require(ENV_TABLE_NAME)?,
            LoadMode::Chunked => {
                get(ENV_TABLE_NAME).unwrap_or_else(|| DEFAULT_CHUNKED_TABLE.to_string())
            }
        };

        let chunk_size = match get(ENV_CHUNK_SIZE) {
            Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
                Error::config(format!("{ENV_CHUNK_SIZE} must be a positive integer, got '{raw}'"))
            })?,
            None => DEFAULT_CHUNK_SIZE,
        };

        let config = Self {
            mode,
            database,
            table: table.trim().to_string(),
            csv_file,
            chunk_size,
            policy: CoercionPolicy::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Use a different coercion policy.
    pub fn with_policy(mut self, policy: CoercionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Check invariants that do not depend on how the config was built.
    pub fn validate(&self) -> Result<()> {
        if !self.csv_file.exists() {
            return Err(Error::config(format!(
                "CSV file not found: {}",
                self.csv_file.display()
            )));
        }
        if !is_valid_identifier(&self.table) {
            return Err(Error::config(format!(
                "table name '{}' is not a plain SQL identifier",
                self.table
            )));
        }
        if self.chunk_size == 0 {
            return Err(Error::config(format!("{ENV_CHUNK_SIZE} must be greater than zero")));
        }
        Ok(())
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
