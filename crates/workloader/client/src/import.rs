//! Hostname-matched workload import
//!
//! Applies a batch of [`WorkloadRecord`]s to one PCE: a record whose hostname
//! matches an existing workload updates that workload's labels, description and
//! external data when any of them differ; a record without a match creates an
//! unmanaged workload. A failing item is recorded and the batch continues.

use crate::client::{PceClient, WorkloadUpdate};
use crate::error::Result;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use workloader_types::{PceInstance, Workload, WorkloadRecord};

/// A single item that could not be applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    /// Hostname or href the item refers to
    pub target: String,
    pub error: String,
}

/// Outcome of importing a batch into one PCE
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failures: Vec<ItemFailure>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

fn hostname_key(hostname: &str) -> String {
    hostname.to_ascii_lowercase()
}

/// Create or update `records` on `pce`.
///
/// Only the initial workload listing can fail the whole call.
pub async fn create_or_update_workloads(
    client: &dyn PceClient,
    pce: &PceInstance,
    records: &[WorkloadRecord],
) -> Result<ImportReport> {
    let existing = client.list_workloads(pce).await?;
    let mut by_hostname: HashMap<String, Workload> = HashMap::with_capacity(existing.len());
    for workload in existing {
        if workload.hostname.is_empty() {
            continue;
        }
        by_hostname.insert(hostname_key(&workload.hostname), workload);
    }

    let mut report = ImportReport::default();

    for record in records {
        let key = hostname_key(&record.hostname);

        match by_hostname.get_mut(&key) {
            Some(current) => {
                if !record.differs_from(current) {
                    report.unchanged += 1;
                    continue;
                }

                let update = WorkloadUpdate {
                    labels: record.merged_labels(&current.labels),
                    description: record.description.clone(),
                    provenance: record.provenance.clone(),
                };

                match client.update_workload(pce, &current.href, &update).await {
                    Ok(()) => {
                        debug!(pce = %pce.name, hostname = %record.hostname, href = %current.href, "Updated workload");
                        current.labels = update.labels;
                        current.description = Some(update.description);
                        if let Some(p) = update.provenance {
                            current.external_data_set = Some(p.data_set().to_string());
                            current.external_data_reference = Some(p.reference());
                        }
                        report.updated += 1;
                    }
                    Err(e) => {
                        warn!(pce = %pce.name, hostname = %record.hostname, error = %e, "Workload update failed");
                        report.failures.push(ItemFailure {
                            target: record.hostname.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }
            None => match client.create_workload(pce, record).await {
                Ok(created) => {
                    debug!(pce = %pce.name, hostname = %record.hostname, href = %created.href, "Created workload");
                    by_hostname.insert(key, created);
                    report.created += 1;
                }
                Err(e) => {
                    warn!(pce = %pce.name, hostname = %record.hostname, error = %e, "Workload create failed");
                    report.failures.push(ItemFailure {
                        target: record.hostname.clone(),
                        error: e.to_string(),
                    });
                }
            },
        }
    }

    info!(
        pce = %pce.name,
        created = report.created,
        updated = report.updated,
        unchanged = report.unchanged,
        failed = report.failures.len(),
        "Import complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryPceClient;
    use std::collections::BTreeMap;
    use workloader_types::{
        LabelAssignment, LabelDimension, ManagementMode, PceVersion, Provenance,
    };

    fn setup() -> (InMemoryPceClient, PceInstance) {
        let client = InMemoryPceClient::new();
        let pce = PceInstance::new("b", "pce-b.local", PceVersion::new(23, 2, 0));
        client.add_instance(pce.clone(), vec![LabelDimension::new("role")]);
        (client, pce)
    }

    fn record(hostname: &str, role: LabelAssignment) -> WorkloadRecord {
        WorkloadRecord {
            hostname: hostname.into(),
            description: "managed ven on pce-a.local".into(),
            labels: BTreeMap::from([("role".to_string(), role)]),
            interfaces: vec![],
            provenance: Some(Provenance::managed("pce-a.local", "/orgs/1/workloads/1")),
        }
    }

    #[tokio::test]
    async fn test_creates_missing_and_skips_unchanged() {
        let (client, pce) = setup();
        let records = vec![record("web1", LabelAssignment::Set("web".into()))];

        let first = create_or_update_workloads(&client, &pce, &records)
            .await
            .unwrap();
        assert_eq!(first.created, 1);

        let second = create_or_update_workloads(&client, &pce, &records)
            .await
            .unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.updated, 0);
        assert_eq!(second.unchanged, 1);
        assert_eq!(client.workloads("b").len(), 1);
    }

    #[tokio::test]
    async fn test_updates_matching_hostname_case_insensitive() {
        let (client, pce) = setup();
        client.add_workload(
            "b",
            Workload::new("", "WEB1", ManagementMode::Managed).with_label("role", "old"),
        );

        let report = create_or_update_workloads(
            &client,
            &pce,
            &[record("web1", LabelAssignment::Set("web".into()))],
        )
        .await
        .unwrap();

        assert_eq!(report.updated, 1);
        let w = &client.workloads("b")[0];
        assert_eq!(w.label("role"), Some("web"));
        assert_eq!(w.mode, ManagementMode::Managed);
        assert_eq!(w.external_data_set.as_deref(), Some("wkld-replicate"));
    }

    #[tokio::test]
    async fn test_clear_removes_label() {
        let (client, pce) = setup();
        client.add_workload(
            "b",
            Workload::new("", "web1", ManagementMode::Unmanaged).with_label("role", "web"),
        );

        create_or_update_workloads(&client, &pce, &[record("web1", LabelAssignment::Clear)])
            .await
            .unwrap();
        assert_eq!(client.workloads("b")[0].label("role"), None);
    }

    #[tokio::test]
    async fn test_item_failure_does_not_stop_batch() {
        let (client, pce) = setup();
        let href = client
            .add_workload("b", Workload::new("", "web1", ManagementMode::Unmanaged))
            .unwrap();
        client.fail_href(&href);

        let report = create_or_update_workloads(
            &client,
            &pce,
            &[
                record("web1", LabelAssignment::Set("web".into())),
                record("web2", LabelAssignment::Set("web".into())),
            ],
        )
        .await
        .unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].target, "web1");
        assert_eq!(report.created, 1);
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn test_listing_failure_fails_call() {
        let (client, pce) = setup();
        client.fail_listing("b");
        assert!(create_or_update_workloads(&client, &pce, &[]).await.is_err());
    }
}
