//! Workload types

use crate::provenance::{Provenance, ProvenanceTag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Whether a workload is run by an agent (VEN)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagementMode {
    Managed,
    Unmanaged,
}

/// A workload as read from a PCE
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    pub href: String,
    pub hostname: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub mode: ManagementMode,
    /// Label values by key; keys without a label are absent
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub interfaces: Vec<Interface>,
    #[serde(default)]
    pub external_data_set: Option<String>,
    #[serde(default)]
    pub external_data_reference: Option<String>,
}

impl Workload {
    pub fn new(href: impl Into<String>, hostname: impl Into<String>, mode: ManagementMode) -> Self {
        Self {
            href: href.into(),
            hostname: hostname.into(),
            name: None,
            description: None,
            mode,
            labels: BTreeMap::new(),
            interfaces: Vec::new(),
            external_data_set: None,
            external_data_reference: None,
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_interface(mut self, interface: Interface) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn with_external_data(
        mut self,
        data_set: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        self.external_data_set = Some(data_set.into());
        self.external_data_reference = Some(reference.into());
        self
    }

    pub fn with_provenance(self, provenance: &Provenance) -> Self {
        let data_set = provenance.data_set();
        self.with_external_data(data_set, provenance.reference())
    }

    pub fn is_managed(&self) -> bool {
        self.mode == ManagementMode::Managed
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// Decode the replication ownership recorded on this workload
    pub fn provenance(&self) -> ProvenanceTag {
        ProvenanceTag::from_fields(
            self.external_data_set.as_deref(),
            self.external_data_reference.as_deref(),
        )
    }

    /// Name used in operator-facing messages
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.hostname)
    }
}

/// Composite key identifying a workload by its PCE address and hostname
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkloadKey {
    pub instance: String,
    pub hostname: String,
}

impl WorkloadKey {
    pub fn new(instance: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
            hostname: hostname.into(),
        }
    }
}

impl fmt::Display for WorkloadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.instance, self.hostname)
    }
}

/// A network interface on a workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub cidr_block: Option<u8>,
}

impl Interface {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            cidr_block: None,
        }
    }

    pub fn with_cidr(mut self, cidr_block: u8) -> Self {
        self.cidr_block = Some(cidr_block);
        self
    }

    /// Descriptor written to the `interfaces` CSV column: `name:address[/prefix]`
    pub fn descriptor(&self) -> String {
        match self.cidr_block {
            Some(prefix) => format!("{}:{}/{}", self.name, self.address, prefix),
            None => format!("{}:{}", self.name, self.address),
        }
    }

    /// Semicolon-joined descriptors for a list of interfaces
    pub fn join(interfaces: &[Interface]) -> String {
        interfaces
            .iter()
            .map(Interface::descriptor)
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Target value for one label key on an imported workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelAssignment {
    Set(String),
    Clear,
}

/// Desired state of a workload, matched against a PCE by hostname
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadRecord {
    pub hostname: String,
    pub description: String,
    pub labels: BTreeMap<String, LabelAssignment>,
    pub interfaces: Vec<Interface>,
    pub provenance: Option<Provenance>,
}

impl WorkloadRecord {
    /// Labels that result from applying this record on top of `current`.
    /// Keys the record does not mention are left untouched.
    pub fn merged_labels(&self, current: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        let mut merged = current.clone();
        for (key, assignment) in &self.labels {
            match assignment {
                LabelAssignment::Set(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                LabelAssignment::Clear => {
                    merged.remove(key);
                }
            }
        }
        merged
    }

    /// Labels for a newly created workload
    pub fn assigned_labels(&self) -> BTreeMap<String, String> {
        self.merged_labels(&BTreeMap::new())
    }

    /// Whether importing this record would change `existing`
    pub fn differs_from(&self, existing: &Workload) -> bool {
        if self.merged_labels(&existing.labels) != existing.labels {
            return true;
        }
        if existing.description.as_deref().unwrap_or_default() != self.description {
            return true;
        }
        match &self.provenance {
            Some(p) => {
                existing.external_data_set.as_deref() != Some(p.data_set())
                    || existing.external_data_reference.as_deref() != Some(p.reference().as_str())
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> WorkloadRecord {
        WorkloadRecord {
            hostname: "web1".into(),
            description: "managed ven on a".into(),
            labels: BTreeMap::from([
                ("role".to_string(), LabelAssignment::Set("web".into())),
                ("env".to_string(), LabelAssignment::Clear),
            ]),
            interfaces: vec![],
            provenance: Some(Provenance::managed("a", "/orgs/1/workloads/1")),
        }
    }

    #[test]
    fn test_interface_descriptors() {
        let eth0 = Interface::new("eth0", "10.0.0.5").with_cidr(24);
        let eth1 = Interface::new("eth1", "fe80::1");
        let joined = Interface::join(&[eth0, eth1]);
        assert_eq!(joined, "eth0:10.0.0.5/24;eth1:fe80::1");
        assert_eq!(Interface::join(&[]), "");
    }

    #[test]
    fn test_merged_labels() {
        let current = BTreeMap::from([
            ("env".to_string(), "prod".to_string()),
            ("loc".to_string(), "dc1".to_string()),
        ]);
        let merged = record().merged_labels(&current);
        assert_eq!(merged.get("role").map(String::as_str), Some("web"));
        assert!(!merged.contains_key("env"));
        assert_eq!(merged.get("loc").map(String::as_str), Some("dc1"));
    }

    #[test]
    fn test_differs_from() {
        let rec = record();
        let mut existing = Workload::new("/orgs/1/workloads/9", "web1", ManagementMode::Unmanaged)
            .with_label("role", "web")
            .with_provenance(&Provenance::managed("a", "/orgs/1/workloads/1"));
        existing.description = Some("managed ven on a".into());
        assert!(!rec.differs_from(&existing));

        let relabelled = existing.clone().with_label("env", "prod");
        assert!(rec.differs_from(&relabelled));

        let mut described = existing.clone();
        described.description = None;
        assert!(rec.differs_from(&described));

        let unstamped = Workload {
            external_data_set: None,
            ..existing
        };
        assert!(rec.differs_from(&unstamped));
    }

    #[test]
    fn test_workload_provenance() {
        let w = Workload::new("/w/1", "db1", ManagementMode::Unmanaged);
        assert_eq!(w.provenance(), ProvenanceTag::Foreign);
        assert!(!w.is_managed());
        assert_eq!(w.display_name(), "db1");
    }
}
