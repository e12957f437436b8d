//! In-memory PCE client for development and testing.
//!
//! Holds a set of PCEs and their workloads in memory and applies creates,
//! updates and deletes to them. Failures can be injected per PCE (listing) or
//! per href (update/delete). Not suitable for production use.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::client::{PceClient, WorkloadUpdate};
use crate::error::{ClientError, Result};
use workloader_types::{
    LabelDimension, ManagementMode, PceInstance, Workload, WorkloadRecord,
};

struct MemoryPce {
    instance: PceInstance,
    dimensions: Vec<LabelDimension>,
    workloads: Vec<Workload>,
    next_id: u64,
}

/// In-memory PCE client implementation.
pub struct InMemoryPceClient {
    pces: DashMap<String, MemoryPce>,
    failing_lists: DashSet<String>,
    failing_hrefs: DashSet<String>,
    api_calls: AtomicUsize,
}

impl InMemoryPceClient {
    /// Create an empty client.
    pub fn new() -> Self {
        Self {
            pces: DashMap::new(),
            failing_lists: DashSet::new(),
            failing_hrefs: DashSet::new(),
            api_calls: AtomicUsize::new(0),
        }
    }

    /// Register a PCE with the given label dimensions.
    pub fn add_instance(&self, instance: PceInstance, dimensions: Vec<LabelDimension>) {
        self.pces.insert(
            instance.name.clone(),
            MemoryPce {
                instance,
                dimensions,
                workloads: Vec::new(),
                next_id: 1,
            },
        );
    }

    /// Add a workload to a registered PCE. An empty href is replaced by a generated one.
    pub fn add_workload(&self, name: &str, mut workload: Workload) -> Option<String> {
        let mut pce = self.pces.get_mut(name)?;
        if workload.href.is_empty() {
            workload.href = pce.allocate_href();
        }
        let href = workload.href.clone();
        pce.workloads.push(workload);
        Some(href)
    }

    /// Remove a workload without counting it as an API call (e.g. unpairing a VEN).
    pub fn remove_workload(&self, name: &str, href: &str) -> bool {
        match self.pces.get_mut(name) {
            Some(mut pce) => {
                let before = pce.workloads.len();
                pce.workloads.retain(|w| w.href != href);
                pce.workloads.len() != before
            }
            None => false,
        }
    }

    /// Current workloads on a PCE.
    pub fn workloads(&self, name: &str) -> Vec<Workload> {
        self.pces
            .get(name)
            .map(|p| p.workloads.clone())
            .unwrap_or_default()
    }

    /// Make every workload listing on `name` fail.
    pub fn fail_listing(&self, name: &str) {
        self.failing_lists.insert(name.to_string());
    }

    /// Make updates and deletes of `href` fail.
    pub fn fail_href(&self, href: &str) {
        self.failing_hrefs.insert(href.to_string());
    }

    /// Number of trait calls served so far.
    pub fn api_calls(&self) -> usize {
        self.api_calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.api_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn check_href(&self, href: &str) -> Result<()> {
        if self.failing_hrefs.contains(href) {
            return Err(ClientError::Api {
                status: 500,
                message: format!("injected failure for {}", href),
            });
        }
        Ok(())
    }
}

impl MemoryPce {
    fn allocate_href(&mut self) -> String {
        let href = format!("/orgs/{}/workloads/{}", self.instance.org_id, self.next_id);
        self.next_id += 1;
        href
    }
}

impl Default for InMemoryPceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PceClient for InMemoryPceClient {
    async fn resolve_instance(&self, name: &str) -> Result<PceInstance> {
        self.record_call();
        self.pces
            .get(name)
            .map(|p| p.instance.clone())
            .ok_or_else(|| ClientError::UnknownInstance(name.to_string()))
    }

    async fn list_workloads(&self, pce: &PceInstance) -> Result<Vec<Workload>> {
        self.record_call();
        if self.failing_lists.contains(&pce.name) {
            return Err(ClientError::Api {
                status: 503,
                message: format!("{} unavailable", pce.fqdn),
            });
        }
        self.pces
            .get(&pce.name)
            .map(|p| p.workloads.clone())
            .ok_or_else(|| ClientError::UnknownInstance(pce.name.clone()))
    }

    async fn list_label_dimensions(&self, pce: &PceInstance) -> Result<Vec<LabelDimension>> {
        self.record_call();
        self.pces
            .get(&pce.name)
            .map(|p| p.dimensions.clone())
            .ok_or_else(|| ClientError::UnknownInstance(pce.name.clone()))
    }

    async fn create_workload(
        &self,
        pce: &PceInstance,
        record: &WorkloadRecord,
    ) -> Result<Workload> {
        self.record_call();
        let mut entry = self
            .pces
            .get_mut(&pce.name)
            .ok_or_else(|| ClientError::UnknownInstance(pce.name.clone()))?;

        let mut workload = Workload::new(
            entry.allocate_href(),
            record.hostname.clone(),
            ManagementMode::Unmanaged,
        );
        workload.description = Some(record.description.clone());
        workload.labels = record.assigned_labels();
        workload.interfaces = record.interfaces.clone();
        if let Some(p) = &record.provenance {
            workload = workload.with_provenance(p);
        }

        entry.workloads.push(workload.clone());
        Ok(workload)
    }

    async fn update_workload(
        &self,
        pce: &PceInstance,
        href: &str,
        update: &WorkloadUpdate,
    ) -> Result<()> {
        self.record_call();
        self.check_href(href)?;

        let mut entry = self
            .pces
            .get_mut(&pce.name)
            .ok_or_else(|| ClientError::UnknownInstance(pce.name.clone()))?;
        let workload = entry
            .workloads
            .iter_mut()
            .find(|w| w.href == href)
            .ok_or_else(|| ClientError::NotFound(href.to_string()))?;

        workload.labels = update.labels.clone();
        workload.description = Some(update.description.clone());
        if let Some(p) = &update.provenance {
            workload.external_data_set = Some(p.data_set().to_string());
            workload.external_data_reference = Some(p.reference());
        }
        Ok(())
    }

    async fn delete_workload(&self, pce: &PceInstance, href: &str) -> Result<()> {
        self.record_call();
        self.check_href(href)?;

        let mut entry = self
            .pces
            .get_mut(&pce.name)
            .ok_or_else(|| ClientError::UnknownInstance(pce.name.clone()))?;
        let before = entry.workloads.len();
        entry.workloads.retain(|w| w.href != href);
        if entry.workloads.len() == before {
            return Err(ClientError::NotFound(href.to_string()));
        }
        Ok(())
    }
}
