//! CLI support for query-spec
//!
//! Programmatic access to the `qspec` commands so other tools can embed the
//! filter-expression checks.

mod check;

pub use check::{CheckOptions, CheckOutput, execute_check, execute_tokens};

use std::io;

use thiserror::Error;

use crate::{QueryError, config::EngineConfig};

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Query(#[from] QueryError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No expression provided. Pass one as an argument or pipe it to stdin.")]
    NoInput,
}

impl From<crate::ParseError> for CliError {
    fn from(e: crate::ParseError) -> Self {
        CliError::Query(e.into())
    }
}

impl From<crate::LexError> for CliError {
    fn from(e: crate::LexError) -> Self {
        CliError::Query(e.into())
    }
}

/// Loads the engine configuration, falling back to defaults plus environment.
pub fn load_config(path: Option<&std::path::Path>) -> Result<EngineConfig, CliError> {
    Ok(EngineConfig::load(path)?)
}
