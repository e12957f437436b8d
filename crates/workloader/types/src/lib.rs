//! Core types shared by the workloader crates
//!
//! This crate models the objects the replicate tooling reads from and writes to a
//! PCE (policy compute engine):
//! - PCE instances, their versions and label dimensions
//! - Workloads, their interfaces and label assignments
//! - Replication provenance recorded in the external data fields

pub mod error;
pub mod pce;
pub mod provenance;
pub mod workload;

pub use error::{TypesError, TypesResult};
pub use pce::{LabelDimension, PceInstance, PceVersion, LEGACY_LABEL_KEYS};
pub use provenance::{Provenance, ProvenanceTag, SourceKind, REPLICATE_DATA_SET};
pub use workload::{
    Interface, LabelAssignment, ManagementMode, Workload, WorkloadKey, WorkloadRecord,
};
