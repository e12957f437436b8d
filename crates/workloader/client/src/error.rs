//! PCE client error types

use thiserror::Error;
use workloader_types::TypesError;

/// Errors returned by a [`crate::PceClient`]
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success API response
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// PCE name is not configured
    #[error("unknown pce: {0}")]
    UnknownInstance(String),

    /// The PCE returned fewer objects than it holds
    #[error("{instance} returned {returned} of {total} {collection}; raise max_results for this pce")]
    Truncated {
        instance: String,
        collection: &'static str,
        returned: usize,
        total: usize,
    },

    /// A workload references a label missing from the label list
    #[error("{instance}: workload {workload} references unknown label {label}")]
    UnresolvedLabel {
        instance: String,
        workload: String,
        label: String,
    },

    /// Value parsing error
    #[error(transparent)]
    Types(#[from] TypesError),
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
