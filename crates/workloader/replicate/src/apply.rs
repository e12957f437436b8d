//! Applying a replication plan to the PCEs

use crate::plan::ReplicationPlan;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use workloader_client::{create_or_update_workloads, ImportReport, ItemFailure, PceClient};
use workloader_types::PceInstance;

/// What happened on one PCE
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstanceReport {
    pub name: String,
    pub fqdn: String,
    /// Import outcome; `None` when the import could not start
    pub import: Option<ImportReport>,
    /// Why the import could not start
    pub import_error: Option<String>,
    pub deleted: usize,
    pub delete_failures: Vec<ItemFailure>,
}

impl InstanceReport {
    fn new(pce: &PceInstance) -> Self {
        Self {
            name: pce.name.clone(),
            fqdn: pce.fqdn.clone(),
            ..Default::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        self.import_error.is_none()
            && self.delete_failures.is_empty()
            && self.import.as_ref().map_or(true, ImportReport::is_clean)
    }

    pub fn failures(&self) -> usize {
        usize::from(self.import_error.is_some())
            + self.delete_failures.len()
            + self.import.as_ref().map_or(0, |r| r.failures.len())
    }
}

/// Outcome of applying a plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub instances: Vec<InstanceReport>,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.instances.iter().all(InstanceReport::is_clean)
    }

    pub fn created(&self) -> usize {
        self.imports().map(|r| r.created).sum()
    }

    pub fn updated(&self) -> usize {
        self.imports().map(|r| r.updated).sum()
    }

    pub fn deleted(&self) -> usize {
        self.instances.iter().map(|i| i.deleted).sum()
    }

    pub fn failures(&self) -> usize {
        self.instances.iter().map(InstanceReport::failures).sum()
    }

    fn imports(&self) -> impl Iterator<Item = &ImportReport> {
        self.instances.iter().filter_map(|i| i.import.as_ref())
    }
}

/// Import the upsert batch into every PCE, then delete each PCE's stale proxies.
///
/// Failures are logged and collected; the remaining items and PCEs are still
/// processed.
pub async fn apply_plan(
    client: &dyn PceClient,
    instances: &[PceInstance],
    plan: &ReplicationPlan,
) -> ApplyReport {
    let records = plan.workload_records();
    let mut report = ApplyReport {
        instances: instances.iter().map(InstanceReport::new).collect(),
    };

    if !records.is_empty() {
        for (pce, instance_report) in instances.iter().zip(report.instances.iter_mut()) {
            info!(pce = %pce, count = records.len(), "Importing workloads");
            match create_or_update_workloads(client, pce, &records).await {
                Ok(import) => instance_report.import = Some(import),
                Err(e) => {
                    error!(pce = %pce, error = %e, "Import failed");
                    instance_report.import_error = Some(e.to_string());
                }
            }
        }
    }

    for (pce, instance_report) in instances.iter().zip(report.instances.iter_mut()) {
        for row in plan.deletes_for(&pce.fqdn) {
            match client.delete_workload(pce, &row.href).await {
                Ok(()) => {
                    debug!(pce = %pce, href = %row.href, "Deleted workload");
                    instance_report.deleted += 1;
                }
                Err(e) => {
                    warn!(pce = %pce, href = %row.href, error = %e, "Workload delete failed");
                    instance_report.delete_failures.push(ItemFailure {
                        target: row.href.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        if instance_report.deleted > 0 {
            info!(pce = %pce, deleted = instance_report.deleted, "Deleted workloads");
        }
    }

    report
}
