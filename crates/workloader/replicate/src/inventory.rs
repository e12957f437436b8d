//! Workloads collected from the source PCEs, partitioned by management mode

use crate::error::{ReplicateError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};
use workloader_types::{PceInstance, ProvenanceTag, Workload, WorkloadKey};

/// A workload together with the PCE it was read from
#[derive(Debug, Clone)]
pub struct Entry {
    pub pce: PceInstance,
    pub workload: Workload,
}

impl Entry {
    pub fn key(&self) -> WorkloadKey {
        WorkloadKey::new(self.pce.address(), &self.workload.hostname)
    }
}

/// Per-PCE workload counts reported after collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstanceCounts {
    pub name: String,
    pub fqdn: String,
    pub total: usize,
    pub managed: usize,
    pub unmanaged_owned: usize,
    pub unmanaged_not_owned: usize,
}

impl InstanceCounts {
    pub fn unmanaged(&self) -> usize {
        self.unmanaged_owned + self.unmanaged_not_owned
    }

    /// Workloads this PCE contributes to the other PCEs
    pub fn contributions(&self) -> usize {
        self.managed + self.unmanaged_owned
    }
}

/// Managed and unmanaged workloads keyed by `(pce address, hostname)`
#[derive(Debug, Default)]
pub struct Inventory {
    managed: BTreeMap<WorkloadKey, Entry>,
    unmanaged: BTreeMap<WorkloadKey, Entry>,
    counts: Vec<InstanceCounts>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every workload read from `pce`.
    ///
    /// Fails on the first workload without a hostname. A later workload with the
    /// same key replaces the earlier one.
    pub fn add_instance(&mut self, pce: &PceInstance, workloads: Vec<Workload>) -> Result<()> {
        if let Some(w) = workloads.iter().find(|w| w.hostname.is_empty()) {
            return Err(ReplicateError::MissingHostname {
                instance: pce.fqdn.clone(),
                href: w.href.clone(),
                name: w.display_name().to_string(),
            });
        }

        let mut counts = InstanceCounts {
            name: pce.name.clone(),
            fqdn: pce.fqdn.clone(),
            total: workloads.len(),
            ..Default::default()
        };

        for workload in workloads {
            let entry = Entry {
                pce: pce.clone(),
                workload,
            };
            let key = entry.key();

            let target = if entry.workload.is_managed() {
                counts.managed += 1;
                &mut self.managed
            } else {
                if Self::owned_by(&entry) {
                    counts.unmanaged_owned += 1;
                } else {
                    counts.unmanaged_not_owned += 1;
                }
                &mut self.unmanaged
            };

            let kept = entry.workload.href.clone();
            if let Some(previous) = target.insert(key.clone(), entry) {
                warn!(
                    key = %key,
                    kept = %kept,
                    not_mirrored = %previous.workload.href,
                    "Duplicate hostname on pce; the earlier workload is not mirrored"
                );
            }
        }

        info!(
            pce = %pce,
            total = counts.total,
            managed = counts.managed,
            unmanaged = counts.unmanaged(),
            unmanaged_owned = counts.unmanaged_owned,
            unmanaged_not_owned = counts.unmanaged_not_owned,
            contributions = counts.contributions(),
            "Workload counts"
        );
        self.counts.push(counts);
        Ok(())
    }

    /// Unmanaged workloads that originate on their own PCE
    fn owned_by(entry: &Entry) -> bool {
        match entry.workload.provenance() {
            ProvenanceTag::Foreign => true,
            ProvenanceTag::Replicated(p) => p.source_instance == entry.pce.address(),
            ProvenanceTag::Malformed(_) => false,
        }
    }

    pub fn managed(&self) -> impl Iterator<Item = &Entry> {
        self.managed.values()
    }

    pub fn unmanaged(&self) -> impl Iterator<Item = &Entry> {
        self.unmanaged.values()
    }

    pub fn has_managed(&self, key: &WorkloadKey) -> bool {
        self.managed.contains_key(key)
    }

    pub fn has_unmanaged(&self, key: &WorkloadKey) -> bool {
        self.unmanaged.contains_key(key)
    }

    pub fn counts(&self) -> &[InstanceCounts] {
        &self.counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use workloader_types::{ManagementMode, PceVersion, Provenance};

    fn pce() -> PceInstance {
        PceInstance::new("a", "pce-a", PceVersion::new(23, 2, 0))
    }

    #[test]
    fn test_partition_and_counts() {
        let mut inventory = Inventory::new();
        inventory
            .add_instance(
                &pce(),
                vec![
                    Workload::new("/w/1", "web1", ManagementMode::Managed),
                    Workload::new("/w/2", "db1", ManagementMode::Unmanaged),
                    Workload::new("/w/3", "web9", ManagementMode::Unmanaged)
                        .with_provenance(&Provenance::managed("pce-b", "/w/77")),
                ],
            )
            .unwrap();

        assert!(inventory.has_managed(&WorkloadKey::new("pce-a", "web1")));
        assert!(inventory.has_unmanaged(&WorkloadKey::new("pce-a", "db1")));
        assert!(!inventory.has_managed(&WorkloadKey::new("pce-a", "db1")));

        let counts = &inventory.counts()[0];
        assert_eq!(counts.total, 3);
        assert_eq!(counts.managed, 1);
        assert_eq!(counts.unmanaged_owned, 1);
        assert_eq!(counts.unmanaged_not_owned, 1);
        assert_eq!(counts.contributions(), 2);
    }

    #[test]
    fn test_missing_hostname_is_fatal() {
        let mut inventory = Inventory::new();
        let mut nameless = Workload::new("/w/9", "", ManagementMode::Unmanaged);
        nameless.name = Some("printer".into());

        let err = inventory.add_instance(&pce(), vec![nameless]).unwrap_err();
        match err {
            ReplicateError::MissingHostname {
                instance,
                href,
                name,
            } => {
                assert_eq!(instance, "pce-a");
                assert_eq!(href, "/w/9");
                assert_eq!(name, "printer");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(inventory.counts().is_empty());
    }

    #[test]
    fn test_duplicate_hostname_keeps_last() {
        let mut inventory = Inventory::new();
        inventory
            .add_instance(
                &pce(),
                vec![
                    Workload::new("/w/1", "web1", ManagementMode::Managed),
                    Workload::new("/w/2", "web1", ManagementMode::Managed),
                ],
            )
            .unwrap();
        let hrefs: Vec<_> = inventory.managed().map(|e| e.workload.href.clone()).collect();
        assert_eq!(hrefs, vec!["/w/2"]);
        assert_eq!(inventory.counts()[0].managed, 2);
    }

    #[test]
    fn test_whitespace_hostname_is_kept_verbatim() {
        let mut inventory = Inventory::new();
        inventory
            .add_instance(
                &pce(),
                vec![Workload::new("/w/5", " ", ManagementMode::Unmanaged)],
            )
            .unwrap();

        assert!(inventory.has_unmanaged(&WorkloadKey::new("pce-a", " ")));
        assert_eq!(inventory.counts()[0].total, 1);
    }
}
