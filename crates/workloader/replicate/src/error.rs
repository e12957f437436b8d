//! Replication error types

use thiserror::Error;
use workloader_client::ClientError;

/// Errors that abort a replication run.
///
/// Apply-phase failures are not errors; they are collected into an
/// [`crate::ApplyReport`].
#[derive(Debug, Error)]
pub enum ReplicateError {
    /// Invalid run configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Skip-source name missing from the pce list
    #[error("{0} is not in the pce list. skipped pces must also be in the pce list")]
    SkipSourceNotListed(String),

    /// PCE name not configured
    #[error("unknown pce: {0}")]
    UnknownInstance(String),

    /// A source workload without a hostname
    #[error("{instance} - href: {href} - name: {name} - wkld-replicate requires hostnames on all workloads. one option to quickly fix is to use wkld-export, edit the csv to have unique hostnames, and use wkld-import to apply.")]
    MissingHostname {
        instance: String,
        href: String,
        name: String,
    },

    /// API failure while reading from a PCE
    #[error("collection failed on {instance}: {source}")]
    Collection {
        instance: String,
        #[source]
        source: ClientError,
    },

    /// Audit file could not be written
    #[error("failed to write {path}: {source}")]
    Sink {
        path: String,
        #[source]
        source: csv::Error,
    },
}

impl ReplicateError {
    /// Whether the error was raised before any PCE was contacted for workloads
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            ReplicateError::Config(_)
                | ReplicateError::SkipSourceNotListed(_)
                | ReplicateError::UnknownInstance(_)
                | ReplicateError::MissingHostname { .. }
        )
    }

    pub(crate) fn collection(instance: &str, source: ClientError) -> Self {
        match source {
            ClientError::UnknownInstance(name) => ReplicateError::UnknownInstance(name),
            source => ReplicateError::Collection {
                instance: instance.to_string(),
                source,
            },
        }
    }
}

/// Result type for replication
pub type Result<T> = std::result::Result<T, ReplicateError>;
