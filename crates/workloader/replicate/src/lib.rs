//! Workload replication across PCEs
//!
//! Every PCE in a run ends up with a copy of every other PCE's workloads:
//! managed workloads and locally-owned unmanaged workloads are mirrored as
//! unmanaged proxies, and proxies whose source has disappeared are deleted.
//!
//! A run proceeds in fixed steps:
//!
//! 1. [`ReplicateConfig::validate`] (no API calls)
//! 2. resolve every PCE and [`discover_label_keys`]
//! 3. collect workloads from each non-skipped PCE into an [`Inventory`]
//! 4. [`reconcile`] the inventory into a [`ReplicationPlan`]
//! 5. write the plan to a [`PlanSink`]
//! 6. stop (dry run), or ask for [`Confirmation`] and [`apply_plan`]
//!
//! # Example
//!
//! ```ignore
//! let replicator = Replicator::new(&client, &AlwaysConfirm, &sink);
//! let config = ReplicateConfig::new(["pce-east", "pce-west"]).with_update_pce(true, true);
//! let outcome = replicator.run(&config).await?;
//! ```

pub mod apply;
pub mod config;
pub mod confirm;
pub mod error;
pub mod inventory;
pub mod labels;
pub mod plan;
pub mod reconcile;
pub mod sink;

pub use apply::{apply_plan, ApplyReport, InstanceReport};
pub use config::ReplicateConfig;
pub use confirm::{is_affirmative, AlwaysConfirm, Confirmation, ScriptedConfirmation};
pub use error::{ReplicateError, Result};
pub use inventory::{Entry, InstanceCounts, Inventory};
pub use labels::discover_label_keys;
pub use plan::{DeleteRow, ReplicationPlan, UpsertRow, REMOVE_LABEL_VALUE};
pub use reconcile::{classify, reconcile, Decision};
pub use sink::{
    write_plan, BatchKind, CapturedBatch, CsvFileSink, MemorySink, OutputNames, PlanSink,
    WrittenFiles,
};

use serde::Serialize;
use tracing::{info, warn};
use workloader_client::PceClient;
use workloader_types::PceInstance;

/// Prompt shown before a plan is applied
pub const CONFIRM_PROMPT: &str = "do you want to run the replicate (yes/no)?";

/// What a run computed and where it was written
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub label_keys: Vec<String>,
    pub upserts: usize,
    pub deletes: usize,
    pub files: WrittenFiles,
    pub counts: Vec<InstanceCounts>,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Nothing to import or delete
    NothingToDo { summary: RunSummary },
    /// Files written, PCEs untouched
    DryRun { summary: RunSummary },
    /// Operator did not confirm
    Declined { summary: RunSummary },
    /// Plan applied
    Applied {
        summary: RunSummary,
        report: ApplyReport,
    },
}

impl RunOutcome {
    pub fn summary(&self) -> &RunSummary {
        match self {
            RunOutcome::NothingToDo { summary }
            | RunOutcome::DryRun { summary }
            | RunOutcome::Declined { summary }
            | RunOutcome::Applied { summary, .. } => summary,
        }
    }

    pub fn report(&self) -> Option<&ApplyReport> {
        match self {
            RunOutcome::Applied { report, .. } => Some(report),
            _ => None,
        }
    }
}

/// A computed and persisted plan waiting to be applied
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub instances: Vec<PceInstance>,
    pub plan: ReplicationPlan,
    pub summary: RunSummary,
    update_pce: bool,
    no_prompt: bool,
}

/// Runs replication against a [`PceClient`]
pub struct Replicator<'a> {
    client: &'a dyn PceClient,
    confirmation: &'a dyn Confirmation,
    sink: &'a dyn PlanSink,
}

impl<'a> Replicator<'a> {
    pub fn new(
        client: &'a dyn PceClient,
        confirmation: &'a dyn Confirmation,
        sink: &'a dyn PlanSink,
    ) -> Self {
        Self {
            client,
            confirmation,
            sink,
        }
    }

    /// Prepare and then finish a run
    pub async fn run(&self, config: &ReplicateConfig) -> Result<RunOutcome> {
        let prepared = self.prepare(config).await?;
        Ok(self.finish(prepared).await)
    }

    /// Validate, collect, reconcile and write the plan.
    ///
    /// Nothing is written when any step before the sink fails.
    pub async fn prepare(&self, config: &ReplicateConfig) -> Result<PreparedRun> {
        config.validate()?;

        let mut instances = Vec::with_capacity(config.pce_names.len());
        for name in &config.pce_names {
            let pce = self
                .client
                .resolve_instance(name)
                .await
                .map_err(|e| ReplicateError::collection(name, e))?;
            instances.push(pce);
        }

        let label_keys = discover_label_keys(self.client, &instances).await?;

        let mut inventory = Inventory::new();
        for pce in &instances {
            if config.is_skipped_source(&pce.name) {
                info!(pce = %pce, "Skipping pce as a source");
                continue;
            }
            let workloads = self
                .client
                .list_workloads(pce)
                .await
                .map_err(|e| ReplicateError::collection(&pce.fqdn, e))?;
            inventory.add_instance(pce, workloads)?;
        }

        let plan = reconcile(&inventory, &label_keys);
        let files = write_plan(self.sink, &plan)?;

        let summary = RunSummary {
            label_keys,
            upserts: plan.upserts.len(),
            deletes: plan.deletes.len(),
            files,
            counts: inventory.counts().to_vec(),
        };

        Ok(PreparedRun {
            instances,
            plan,
            summary,
            update_pce: config.update_pce,
            no_prompt: config.no_prompt,
        })
    }

    /// Apply a prepared plan, subject to the run flags and confirmation
    pub async fn finish(&self, prepared: PreparedRun) -> RunOutcome {
        let PreparedRun {
            instances,
            plan,
            summary,
            update_pce,
            no_prompt,
        } = prepared;

        if plan.is_empty() {
            info!("Nothing to be done");
            return RunOutcome::NothingToDo { summary };
        }

        if !update_pce {
            info!(
                upserts = summary.upserts,
                deletes = summary.deletes,
                "See the output files for what would be done. Run with --update-pce to apply"
            );
            return RunOutcome::DryRun { summary };
        }

        if !no_prompt && !self.confirmation.confirm(CONFIRM_PROMPT) {
            warn!("Prompt denied");
            return RunOutcome::Declined { summary };
        }

        let report = apply_plan(self.client, &instances, &plan).await;
        info!(
            created = report.created(),
            updated = report.updated(),
            deleted = report.deleted(),
            failed = report.failures(),
            "Replication complete"
        );
        RunOutcome::Applied { summary, report }
    }
}
