//! Audit sinks for the computed batches

use crate::error::{ReplicateError, Result};
use crate::plan::ReplicationPlan;
use chrono::{DateTime, Local};
use parking_lot::RwLock;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Which batch is being written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchKind {
    Import,
    Delete,
}

impl BatchKind {
    fn label(self) -> &'static str {
        match self {
            BatchKind::Import => "wkld-import",
            BatchKind::Delete => "wkld-delete",
        }
    }
}

/// File names for one run's batches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNames {
    pub import: String,
    pub delete: String,
}

impl OutputNames {
    /// `wkld-import-<name>` / `wkld-delete-<name>` with an override, otherwise
    /// `workloader-wkld-replicate-<batch>-<YYYYMMDD_HHMMSS>.csv`
    pub fn new(output_file: Option<&str>, now: DateTime<Local>) -> Self {
        let name = |kind: BatchKind| match output_file {
            Some(file) => format!("{}-{}", kind.label(), file),
            None => format!(
                "workloader-wkld-replicate-{}-{}.csv",
                kind.label(),
                now.format("%Y%m%d_%H%M%S")
            ),
        };

        Self {
            import: name(BatchKind::Import),
            delete: name(BatchKind::Delete),
        }
    }

    pub fn get(&self, kind: BatchKind) -> &str {
        match kind {
            BatchKind::Import => &self.import,
            BatchKind::Delete => &self.delete,
        }
    }
}

/// Destination for the plan's batches
pub trait PlanSink: Send + Sync {
    /// Persist one batch and return where it went
    fn write_batch(
        &self,
        kind: BatchKind,
        header: &[String],
        records: &[Vec<String>],
    ) -> Result<String>;
}

/// Writes each batch to a CSV file in a directory
pub struct CsvFileSink {
    dir: PathBuf,
    names: OutputNames,
}

impl CsvFileSink {
    pub fn new(dir: impl Into<PathBuf>, names: OutputNames) -> Self {
        Self {
            dir: dir.into(),
            names,
        }
    }

    pub fn path(&self, kind: BatchKind) -> PathBuf {
        self.dir.join(self.names.get(kind))
    }

    fn write_file(path: &Path, header: &[String], records: &[Vec<String>]) -> csv::Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(header)?;
        for record in records {
            writer.write_record(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl PlanSink for CsvFileSink {
    fn write_batch(
        &self,
        kind: BatchKind,
        header: &[String],
        records: &[Vec<String>],
    ) -> Result<String> {
        let path = self.path(kind);
        Self::write_file(&path, header, records).map_err(|source| ReplicateError::Sink {
            path: path.display().to_string(),
            source,
        })?;
        Ok(path.display().to_string())
    }
}

/// A batch captured by [`MemorySink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedBatch {
    pub kind: BatchKind,
    pub header: Vec<String>,
    pub records: Vec<Vec<String>>,
}

/// In-memory sink for testing
#[derive(Default)]
pub struct MemorySink {
    batches: RwLock<Vec<CapturedBatch>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<CapturedBatch> {
        self.batches.read().clone()
    }

    pub fn batch(&self, kind: BatchKind) -> Option<CapturedBatch> {
        self.batches.read().iter().find(|b| b.kind == kind).cloned()
    }
}

impl PlanSink for MemorySink {
    fn write_batch(
        &self,
        kind: BatchKind,
        header: &[String],
        records: &[Vec<String>],
    ) -> Result<String> {
        self.batches.write().push(CapturedBatch {
            kind,
            header: header.to_vec(),
            records: records.to_vec(),
        });
        Ok(format!("memory:{}", kind.label()))
    }
}

/// Locations of the batches written for a plan; empty batches are not written
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WrittenFiles {
    pub import: Option<String>,
    pub delete: Option<String>,
}

/// Write the non-empty batches of `plan` to `sink`
pub fn write_plan(sink: &dyn PlanSink, plan: &ReplicationPlan) -> Result<WrittenFiles> {
    let mut written = WrittenFiles::default();

    if !plan.upserts.is_empty() {
        let location =
            sink.write_batch(BatchKind::Import, &plan.upsert_header(), &plan.upsert_records())?;
        info!(count = plan.upserts.len(), file = %location, "Workloads to be imported");
        written.import = Some(location);
    }

    if !plan.deletes.is_empty() {
        let location =
            sink.write_batch(BatchKind::Delete, &plan.delete_header(), &plan.delete_records())?;
        info!(count = plan.deletes.len(), file = %location, "Workloads to be deleted");
        written.delete = Some(location);
    }

    Ok(written)
}
