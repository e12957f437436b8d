//! Replication provenance
//!
//! A PCE workload has two free-text fields, `external_data_set` and
//! `external_data_reference`. Replicated workloads carry
//! `wkld-replicate` in the first and `<source address>-managed-wkld-<href>` or
//! `<source address>-unmanaged-wkld-<href>` in the second. That string is the only
//! durable link between a proxy and its source, so it is decoded into a
//! [`Provenance`] record as soon as it is read and encoded again only when
//! written back.

use serde::{Deserialize, Serialize};
use std::fmt;

/// External data set value owned by the replicator.
pub const REPLICATE_DATA_SET: &str = "wkld-replicate";

const MANAGED_DELIMITER: &str = "-managed-wkld-";
const UNMANAGED_DELIMITER: &str = "-unmanaged-wkld-";

/// Management mode of the workload a proxy was replicated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Managed,
    Unmanaged,
}

impl SourceKind {
    fn delimiter(self) -> &'static str {
        match self {
            SourceKind::Managed => MANAGED_DELIMITER,
            SourceKind::Unmanaged => UNMANAGED_DELIMITER,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Managed => write!(f, "managed"),
            SourceKind::Unmanaged => write!(f, "unmanaged"),
        }
    }
}

/// Where a replicated workload came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Provenance {
    /// Address of the PCE holding the source workload
    pub source_instance: String,

    /// Whether the source was managed or unmanaged
    pub kind: SourceKind,

    /// Href of the source workload on its PCE
    pub source_href: String,
}

impl Provenance {
    pub fn new(
        source_instance: impl Into<String>,
        kind: SourceKind,
        source_href: impl Into<String>,
    ) -> Self {
        Self {
            source_instance: source_instance.into(),
            kind,
            source_href: source_href.into(),
        }
    }

    pub fn managed(source_instance: impl Into<String>, source_href: impl Into<String>) -> Self {
        Self::new(source_instance, SourceKind::Managed, source_href)
    }

    pub fn unmanaged(source_instance: impl Into<String>, source_href: impl Into<String>) -> Self {
        Self::new(source_instance, SourceKind::Unmanaged, source_href)
    }

    /// Value for the external data set field
    pub fn data_set(&self) -> &'static str {
        REPLICATE_DATA_SET
    }

    /// Value for the external data reference field
    pub fn reference(&self) -> String {
        format!(
            "{}{}{}",
            self.source_instance,
            self.kind.delimiter(),
            self.source_href
        )
    }

    /// Decode a reference string. Returns `None` when neither delimiter is present.
    ///
    /// When both delimiters occur, the earliest one splits the string so that an
    /// href containing a delimiter does not change the owner.
    pub fn parse_reference(reference: &str) -> Option<Self> {
        let managed = reference.find(MANAGED_DELIMITER).map(|i| (i, SourceKind::Managed));
        let unmanaged = reference
            .find(UNMANAGED_DELIMITER)
            .map(|i| (i, SourceKind::Unmanaged));

        let (index, kind) = match (managed, unmanaged) {
            (Some(m), Some(u)) => {
                if m.0 < u.0 {
                    m
                } else {
                    u
                }
            }
            (Some(m), None) => m,
            (None, Some(u)) => u,
            (None, None) => return None,
        };

        let source_instance = &reference[..index];
        let source_href = &reference[index + kind.delimiter().len()..];
        Some(Self::new(source_instance, kind, source_href))
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reference())
    }
}

/// Ownership state decoded from a workload's external data fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvenanceTag {
    /// Not created or claimed by the replicator
    Foreign,

    /// Created or claimed by the replicator
    Replicated(Provenance),

    /// Marked as replicated but the reference cannot be decoded
    Malformed(String),
}

impl ProvenanceTag {
    pub fn from_fields(data_set: Option<&str>, reference: Option<&str>) -> Self {
        if data_set != Some(REPLICATE_DATA_SET) {
            return ProvenanceTag::Foreign;
        }

        let reference = reference.unwrap_or_default();
        match Provenance::parse_reference(reference) {
            Some(p) => ProvenanceTag::Replicated(p),
            None => ProvenanceTag::Malformed(reference.to_string()),
        }
    }
}
