//! Command-line interface.
//!
//! Flags take precedence over environment variables; whatever is still
//! missing is read from the environment (after `.env` has been loaded).

use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ohlcv_core::config::{ENV_CHUNK_SIZE, ENV_CSV_FILE, ENV_DATABASE, ENV_TABLE_NAME};
use ohlcv_core::{CoercionPolicy, Config, LoadMode, Result};

#[derive(Debug, Parser)]
#[command(name = "ohlcv-loader", version, about = "Load OHLCV bars from CSV into SQLite")]
pub struct Cli {
    /// Dotenv file to load before reading settings. A missing file is ignored.
    #[arg(long, global = true, default_value = ".env")]
    pub env_file: PathBuf,

    /// Print the run summary as JSON on stdout.
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read the whole file and insert it as a single batch.
    Load(LoadArgs),
    /// Provision the table, then insert the file in fixed-size chunks.
    LoadChunked {
        #[command(flatten)]
        args: LoadArgs,

        /// Rows per chunk (overrides CHUNK_SIZE).
        #[arg(long)]
        chunk_size: Option<usize>,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct LoadArgs {
    /// SQLite database file (overrides DATABASE).
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Destination table (overrides TABLE_NAME).
    #[arg(long)]
    pub table: Option<String>,

    /// Source CSV file (overrides CSV_FILE).
    #[arg(long)]
    pub csv_file: Option<PathBuf>,

    /// Fail the batch on the first malformed row instead of skipping it.
    #[arg(long, default_value_t = false)]
    pub strict: bool,
}

impl Command {
    /// Pipeline variant selected by this command.
    pub fn mode(&self) -> LoadMode {
        match self {
            Command::Load(_) => LoadMode::WholeFile,
            Command::LoadChunked { .. } => LoadMode::Chunked,
        }
    }

    fn overrides(&self) -> HashMap<&'static str, String> {
        let (args, chunk_size) = match self {
            Command::Load(args) => (args, None),
            Command::LoadChunked { args, chunk_size } => (args, *chunk_size),
        };

        let mut map = HashMap::new();
        if let Some(db) = &args.database {
            map.insert(ENV_DATABASE, db.display().to_string());
        }
        if let Some(table) = &args.table {
            map.insert(ENV_TABLE_NAME, table.clone());
        }
        if let Some(csv) = &args.csv_file {
            map.insert(ENV_CSV_FILE, csv.display().to_string());
        }
        if let Some(n) = chunk_size {
            map.insert(ENV_CHUNK_SIZE, n.to_string());
        }
        map
    }

    fn policy(&self) -> CoercionPolicy {
        let strict = match self {
            Command::Load(args) => args.strict,
            Command::LoadChunked { args, .. } => args.strict,
        };
        if strict {
            CoercionPolicy::FailFast
        } else {
            CoercionPolicy::SkipRow
        }
    }

    /// Build the run configuration, falling back to `env` for unset flags.
    pub fn config_with<F>(&self, env: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let overrides = self.overrides();
        let config = Config::from_lookup(self.mode(), |key| {
            overrides.get(key).cloned().or_else(|| env(key))
        })?;
        Ok(config.with_policy(self.policy()))
    }

    /// Build the run configuration from flags and the process environment.
    pub fn config(&self) -> Result<Config> {
        self.config_with(|key| std::env::var(key).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn env_from(pairs: Vec<(&'static str, String)>) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<&str, String> = pairs.into_iter().collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_load() {
        let cli = Cli::try_parse_from(["ohlcv-loader", "load", "--table", "bars", "--strict"]).unwrap();

        assert_eq!(cli.command.mode(), LoadMode::WholeFile);
        assert_eq!(cli.env_file, PathBuf::from(".env"));
        assert!(!cli.json);
    }

    #[test]
    fn test_parse_chunked_with_global_flags() {
        let cli = Cli::try_parse_from([
            "ohlcv-loader",
            "load-chunked",
            "--chunk-size",
            "250",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.command.mode(), LoadMode::Chunked);
        assert!(cli.json);
        match cli.command {
            Command::LoadChunked { chunk_size, .. } => assert_eq!(chunk_size, Some(250)),
            _ => panic!("expected load-chunked"),
        }
    }

    #[test]
    fn test_flags_override_env() {
        let csv = NamedTempFile::new().unwrap();
        let csv_path = csv.path().display().to_string();
        let cli = Cli::try_parse_from([
            "ohlcv-loader",
            "load-chunked",
            "--table",
            "minute_bars",
            "--chunk-size",
            "7",
            "--strict",
        ])
        .unwrap();

        let env = env_from(vec![
            ("DATABASE", "env.db".to_string()),
            ("CSV_FILE", csv_path),
            ("TABLE_NAME", "from_env".to_string()),
            ("CHUNK_SIZE", "5000".to_string()),
        ]);
        let config = cli.command.config_with(env).unwrap();

        assert_eq!(config.table, "minute_bars");
        assert_eq!(config.chunk_size, 7);
        assert_eq!(config.database, PathBuf::from("env.db"));
        assert_eq!(config.policy, CoercionPolicy::FailFast);
    }

    #[test]
    fn test_missing_settings_fail() {
        let cli = Cli::try_parse_from(["ohlcv-loader", "load"]).unwrap();
        assert!(cli.command.config_with(|_| None).is_err());
    }
}
