//! PCE registry commands

use crate::config::PceRegistry;
use crate::error::CliResult;
use crate::output::{self, print_info, OutputFormat};
use serde::Serialize;
use tabled::Tabled;

/// Table row for a configured PCE
#[derive(Debug, Serialize, Tabled)]
struct PceRow {
    name: String,
    fqdn: String,
    port: u16,
    org: u32,
    user: String,
    #[tabled(rename = "tls verify")]
    tls_verify: bool,
}

/// Print the configured PCEs
pub fn list(registry: &PceRegistry, format: OutputFormat) -> CliResult<()> {
    if let (Some(path), OutputFormat::Table) = (registry.location(), format) {
        print_info(&format!("Using {}", path.display()));
    }

    let rows: Vec<PceRow> = registry
        .pces
        .iter()
        .map(|p| PceRow {
            name: p.name.clone(),
            fqdn: p.fqdn.clone(),
            port: p.port,
            org: p.org_id,
            user: p.user.clone(),
            tls_verify: !p.disable_tls_verification,
        })
        .collect();
    output::print_output(rows, format)
}
