//! TalonDB common types, errors, and configuration.
//!
//! This crate provides shared definitions used across all TalonDB components.

pub mod config;
pub mod error;
pub mod types;

pub use config::IndexConfig;
pub use error::{Result, TalonError};
pub use types::{is_local_row_id, FormatVersion, RowId, MAX_LOCAL_ROW_ID};
