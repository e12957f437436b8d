//! Replication plan: the upsert and delete batches computed for a run

use serde::Serialize;
use std::collections::BTreeMap;
use workloader_types::{
    Interface, LabelAssignment, PceInstance, Provenance, SourceKind, Workload, WorkloadRecord,
};

/// Label value written for a key the source workload has no label for.
pub const REMOVE_LABEL_VALUE: &str = "wkld-replicate-remove";

/// Leading columns of the import CSV, before the label keys.
pub const IMPORT_LEADING_COLUMNS: [&str; 3] = ["source", "hostname", "description"];

/// Trailing columns of the import CSV, after the label keys.
pub const IMPORT_TRAILING_COLUMNS: [&str; 3] =
    ["interfaces", "external_data_set", "external_data_reference"];

/// Columns of the delete CSV.
pub const DELETE_COLUMNS: [&str; 3] = ["href", "pce_fqdn", "pce_name"];

/// A workload to create or update on every PCE in the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpsertRow {
    /// Friendly name of the PCE the workload was read from
    pub source: String,
    pub hostname: String,
    pub description: String,
    /// One entry per label key of the run
    pub labels: BTreeMap<String, LabelAssignment>,
    pub interfaces: Vec<Interface>,
    pub provenance: Provenance,
}

impl UpsertRow {
    /// Mirror `workload`, read from `pce`, stamped with `provenance`
    pub fn mirror(
        pce: &PceInstance,
        workload: &Workload,
        provenance: Provenance,
        label_keys: &[String],
    ) -> Self {
        let description = match provenance.kind {
            SourceKind::Managed => format!("managed ven on {}", pce.address()),
            SourceKind::Unmanaged => format!("unmanaged workload on {}", pce.address()),
        };

        let labels = label_keys
            .iter()
            .map(|key| {
                let assignment = match workload.label(key) {
                    Some(value) if !value.is_empty() => LabelAssignment::Set(value.to_string()),
                    _ => LabelAssignment::Clear,
                };
                (key.clone(), assignment)
            })
            .collect();

        Self {
            source: pce.name.clone(),
            hostname: workload.hostname.clone(),
            description,
            labels,
            interfaces: workload.interfaces.clone(),
            provenance,
        }
    }

    fn csv_record(&self, label_keys: &[String]) -> Vec<String> {
        let mut record = Vec::with_capacity(IMPORT_LEADING_COLUMNS.len() + label_keys.len() + 3);
        record.push(self.source.clone());
        record.push(self.hostname.clone());
        record.push(self.description.clone());
        for key in label_keys {
            let value = match self.labels.get(key) {
                Some(LabelAssignment::Set(v)) => v.clone(),
                Some(LabelAssignment::Clear) | None => REMOVE_LABEL_VALUE.to_string(),
            };
            record.push(value);
        }
        record.push(Interface::join(&self.interfaces));
        record.push(self.provenance.data_set().to_string());
        record.push(self.provenance.reference());
        record
    }

    pub fn to_record(&self) -> WorkloadRecord {
        WorkloadRecord {
            hostname: self.hostname.clone(),
            description: self.description.clone(),
            labels: self.labels.clone(),
            interfaces: self.interfaces.clone(),
            provenance: Some(self.provenance.clone()),
        }
    }
}

/// A workload to delete from one PCE
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteRow {
    pub href: String,
    pub pce_fqdn: String,
    pub pce_name: String,
}

impl DeleteRow {
    pub fn new(pce: &PceInstance, href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            pce_fqdn: pce.fqdn.clone(),
            pce_name: pce.name.clone(),
        }
    }

    fn csv_record(&self) -> Vec<String> {
        vec![
            self.href.clone(),
            self.pce_fqdn.clone(),
            self.pce_name.clone(),
        ]
    }
}

/// All actions computed for a run, held in memory until applied
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplicationPlan {
    pub label_keys: Vec<String>,
    pub upserts: Vec<UpsertRow>,
    pub deletes: Vec<DeleteRow>,
}

impl ReplicationPlan {
    pub fn new(label_keys: Vec<String>) -> Self {
        Self {
            label_keys,
            upserts: Vec::new(),
            deletes: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletes.is_empty()
    }

    pub fn upsert_header(&self) -> Vec<String> {
        IMPORT_LEADING_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.label_keys.iter().cloned())
            .chain(IMPORT_TRAILING_COLUMNS.iter().map(|c| c.to_string()))
            .collect()
    }

    pub fn upsert_records(&self) -> Vec<Vec<String>> {
        self.upserts
            .iter()
            .map(|row| row.csv_record(&self.label_keys))
            .collect()
    }

    pub fn delete_header(&self) -> Vec<String> {
        DELETE_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    pub fn delete_records(&self) -> Vec<Vec<String>> {
        self.deletes.iter().map(DeleteRow::csv_record).collect()
    }

    /// Upsert batch as import records
    pub fn workload_records(&self) -> Vec<WorkloadRecord> {
        self.upserts.iter().map(UpsertRow::to_record).collect()
    }

    /// Hrefs to delete on the PCE with address `fqdn`
    pub fn deletes_for<'a>(&'a self, fqdn: &'a str) -> impl Iterator<Item = &'a DeleteRow> + 'a {
        self.deletes.iter().filter(move |d| d.pce_fqdn == fqdn)
    }
}
