//! Reconciliation of collected workloads into a replication plan
//!
//! Every managed workload is mirrored. Each unmanaged workload goes through one
//! pass of the ownership rules below (first match wins); proxies of proxies are
//! resolved one hop only.
//!
//! 1. Not yet replicated: claim it and mirror it.
//! 2. Replicated from an unmanaged workload on its own PCE: mirror it again.
//! 3. Proxy of a managed workload: delete it when the source is gone.
//! 4. Proxy of an unmanaged workload elsewhere: delete it when the source is gone.

use crate::inventory::{Entry, Inventory};
use crate::plan::{DeleteRow, ReplicationPlan, UpsertRow};
use tracing::{debug, warn};
use workloader_types::{Provenance, ProvenanceTag, SourceKind, WorkloadKey};

/// What happens to one unmanaged workload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Never replicated before; stamp and mirror it
    Claim(Provenance),
    /// Owned by its own PCE; mirror it again
    Refresh(Provenance),
    /// Proxy whose source still exists
    Keep,
    /// Proxy whose source no longer exists
    Delete,
    /// Replicated marker with an unreadable reference
    Ignore,
}

/// Apply the ownership rules to one unmanaged workload
pub fn classify(entry: &Entry, inventory: &Inventory) -> Decision {
    let own_address = entry.pce.address();

    let provenance = match entry.workload.provenance() {
        ProvenanceTag::Foreign => {
            return Decision::Claim(Provenance::unmanaged(own_address, &entry.workload.href));
        }
        ProvenanceTag::Malformed(_) => return Decision::Ignore,
        ProvenanceTag::Replicated(p) => p,
    };

    if provenance.kind == SourceKind::Unmanaged && provenance.source_instance == own_address {
        return Decision::Refresh(provenance);
    }

    let source = WorkloadKey::new(&provenance.source_instance, &entry.workload.hostname);
    let exists = match provenance.kind {
        SourceKind::Managed => inventory.has_managed(&source),
        SourceKind::Unmanaged => inventory.has_unmanaged(&source),
    };

    if exists {
        Decision::Keep
    } else {
        Decision::Delete
    }
}

/// Build the plan for a collected inventory
pub fn reconcile(inventory: &Inventory, label_keys: &[String]) -> ReplicationPlan {
    let mut plan = ReplicationPlan::new(label_keys.to_vec());

    for entry in inventory.managed() {
        let provenance = Provenance::managed(entry.pce.address(), &entry.workload.href);
        plan.upserts.push(UpsertRow::mirror(
            &entry.pce,
            &entry.workload,
            provenance,
            label_keys,
        ));
    }

    for entry in inventory.unmanaged() {
        match classify(entry, inventory) {
            Decision::Claim(provenance) | Decision::Refresh(provenance) => {
                plan.upserts.push(UpsertRow::mirror(
                    &entry.pce,
                    &entry.workload,
                    provenance,
                    label_keys,
                ));
            }
            Decision::Keep => {}
            Decision::Delete => {
                debug!(
                    pce = %entry.pce,
                    hostname = %entry.workload.hostname,
                    href = %entry.workload.href,
                    "Source of replicated workload is gone"
                );
                plan.deletes
                    .push(DeleteRow::new(&entry.pce, &entry.workload.href));
            }
            Decision::Ignore => {
                warn!(
                    pce = %entry.pce,
                    href = %entry.workload.href,
                    reference = entry.workload.external_data_reference.as_deref().unwrap_or_default(),
                    "Unreadable wkld-replicate reference; leaving workload alone"
                );
            }
        }
    }

    plan
}
