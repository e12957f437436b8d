//! Parse errors for workloader types

use thiserror::Error;

/// Errors raised while parsing values read from a PCE
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    /// Product version string could not be parsed
    #[error("invalid pce version: {0}")]
    InvalidVersion(String),
}

/// Result type for type parsing
pub type TypesResult<T> = Result<T, TypesError>;
