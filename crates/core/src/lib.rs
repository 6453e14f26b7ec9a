//! Core types and configuration for the OHLCV loader.
//!
//! This crate provides shared types used across all other crates:
//! - Source and canonical record types
//! - Run configuration
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, CoercionPolicy, LoadMode};
pub use error::{CoercionError, Error, Result};
pub use types::*;
