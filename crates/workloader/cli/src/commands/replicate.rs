//! wkld-replicate command

use crate::error::CliResult;
use crate::output::{self, print_error, print_info, print_success, print_warning, OutputFormat};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tabled::Tabled;
use workloader_client::PceClient;
use workloader_replicate::{
    is_affirmative, AlwaysConfirm, Confirmation, CsvFileSink, InstanceCounts, InstanceReport,
    OutputNames, ReplicateConfig, Replicator, RunOutcome, WrittenFiles,
};

/// Arguments for `wkld-replicate`
#[derive(Debug, Args)]
pub struct ReplicateArgs {
    /// Comma-separated list of pce names to replicate between
    #[arg(short = 'p', long = "pce-list", required = true)]
    pub pce_list: String,

    /// Comma-separated list of pce names that receive workloads but do not
    /// contribute their own. Each must also be in the pce list
    #[arg(short = 's', long = "skip-source", default_value = "")]
    pub skip_source: String,

    /// Output file name; files are written as wkld-import-<name> and wkld-delete-<name>
    #[arg(long = "output-file")]
    pub output_file: Option<String>,

    /// Directory for the output files
    #[arg(long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,
}

impl ReplicateArgs {
    pub fn to_config(&self, update_pce: bool, no_prompt: bool) -> ReplicateConfig {
        let mut config = ReplicateConfig::new(ReplicateConfig::parse_list(&self.pce_list))
            .with_skip_sources(ReplicateConfig::parse_list(&self.skip_source))
            .with_output_dir(self.output_dir.clone())
            .with_update_pce(update_pce, no_prompt);
        if let Some(file) = &self.output_file {
            config = config.with_output_file(file.clone());
        }
        config
    }
}

/// Reads the operator's answer from the terminal
struct TerminalConfirmation;

impl Confirmation for TerminalConfirmation {
    fn confirm(&self, prompt: &str) -> bool {
        dialoguer::Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map(|answer| is_affirmative(&answer))
            .unwrap_or(false)
    }
}

/// Table row for collected workload counts
#[derive(Debug, Serialize, Tabled)]
struct CountRow {
    pce: String,
    total: usize,
    managed: usize,
    #[tabled(rename = "unmanaged (owned)")]
    unmanaged_owned: usize,
    #[tabled(rename = "unmanaged (not owned)")]
    unmanaged_not_owned: usize,
    contributions: usize,
}

impl From<&InstanceCounts> for CountRow {
    fn from(c: &InstanceCounts) -> Self {
        Self {
            pce: c.fqdn.clone(),
            total: c.total,
            managed: c.managed,
            unmanaged_owned: c.unmanaged_owned,
            unmanaged_not_owned: c.unmanaged_not_owned,
            contributions: c.contributions(),
        }
    }
}

/// Table row for the outcome on one PCE
#[derive(Debug, Serialize, Tabled)]
struct ApplyRow {
    pce: String,
    created: usize,
    updated: usize,
    unchanged: usize,
    deleted: usize,
    failed: usize,
}

impl From<&InstanceReport> for ApplyRow {
    fn from(r: &InstanceReport) -> Self {
        let import = r.import.clone().unwrap_or_default();
        Self {
            pce: r.fqdn.clone(),
            created: import.created,
            updated: import.updated,
            unchanged: import.unchanged,
            deleted: r.deleted,
            failed: r.failures(),
        }
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn print_files(files: &WrittenFiles) {
    if let Some(path) = &files.import {
        print_info(&format!("Import file: {}", path));
    }
    if let Some(path) = &files.delete {
        print_info(&format!("Delete file: {}", path));
    }
}

/// Execute a replication run
pub async fn execute(
    args: ReplicateArgs,
    client: &dyn PceClient,
    update_pce: bool,
    no_prompt: bool,
    format: OutputFormat,
) -> CliResult<()> {
    let config = args.to_config(update_pce, no_prompt);
    let names = OutputNames::new(config.output_file.as_deref(), chrono::Local::now());
    let sink = CsvFileSink::new(config.output_dir.clone(), names);

    let confirmation: &dyn Confirmation = if no_prompt {
        &AlwaysConfirm
    } else {
        &TerminalConfirmation
    };
    let replicator = Replicator::new(client, confirmation, &sink);

    let pb = spinner("Collecting workloads...");
    let prepared = replicator.prepare(&config).await;
    pb.finish_and_clear();
    let prepared = prepared?;

    let table = matches!(format, OutputFormat::Table);
    if table {
        let rows: Vec<CountRow> = prepared.summary.counts.iter().map(CountRow::from).collect();
        output::print_output(rows, format)?;
        print_info(&format!(
            "Label keys: {}",
            prepared.summary.label_keys.join(", ")
        ));
        print_info(&format!(
            "{} workloads to import, {} workloads to delete",
            prepared.summary.upserts, prepared.summary.deletes
        ));
        print_files(&prepared.summary.files);
    }

    let outcome = replicator.finish(prepared).await;
    if !table {
        return output::print_single(&outcome, format);
    }

    match &outcome {
        RunOutcome::NothingToDo { .. } => print_success("Nothing to be done"),
        RunOutcome::DryRun { .. } => {
            print_info("Dry run complete. Run with --update-pce to apply the changes")
        }
        RunOutcome::Declined { .. } => print_warning("prompt denied"),
        RunOutcome::Applied { report, .. } => {
            let rows: Vec<ApplyRow> = report.instances.iter().map(ApplyRow::from).collect();
            output::print_output(rows, format)?;
            for instance in &report.instances {
                if let Some(e) = &instance.import_error {
                    print_error(&format!("{}: import failed: {}", instance.fqdn, e));
                }
            }
            if report.is_clean() {
                print_success("Replication complete");
            } else {
                print_warning(&format!(
                    "Replication complete with {} failures",
                    report.failures()
                ));
            }
        }
    }
    Ok(())
}
