//! PCE client trait

use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use workloader_types::{LabelDimension, PceInstance, Provenance, Workload, WorkloadRecord};

/// Full target state written when an existing workload is updated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadUpdate {
    /// Complete label set after the update
    pub labels: BTreeMap<String, String>,
    pub description: String,
    pub provenance: Option<Provenance>,
}

/// Operations the replicate tooling needs from a PCE
///
/// Implementations must not run calls concurrently on behalf of one caller; the
/// replicator awaits each call before issuing the next.
#[async_trait]
pub trait PceClient: Send + Sync {
    /// Resolve a configured PCE name, fetching its product version
    async fn resolve_instance(&self, name: &str) -> Result<PceInstance>;

    /// All workloads on the PCE with labels resolved to key/value pairs
    async fn list_workloads(&self, pce: &PceInstance) -> Result<Vec<Workload>>;

    /// Label dimensions (label keys) defined on the PCE
    async fn list_label_dimensions(&self, pce: &PceInstance) -> Result<Vec<LabelDimension>>;

    /// Create an unmanaged workload, creating any missing labels
    async fn create_workload(&self, pce: &PceInstance, record: &WorkloadRecord)
        -> Result<Workload>;

    /// Overwrite labels, description and external data of an existing workload
    async fn update_workload(
        &self,
        pce: &PceInstance,
        href: &str,
        update: &WorkloadUpdate,
    ) -> Result<()>;

    /// Delete a workload by href
    async fn delete_workload(&self, pce: &PceInstance, href: &str) -> Result<()>;
}
