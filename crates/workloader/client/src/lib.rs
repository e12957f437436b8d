//! PCE access for workloader
//!
//! - [`PceClient`]: the operations the replicator needs from a PCE
//! - [`HttpPceClient`]: REST API v2 implementation over reqwest
//! - [`InMemoryPceClient`]: in-memory PCEs for development and tests
//! - [`create_or_update_workloads`]: hostname-matched import of a workload batch

mod client;
pub mod error;
mod http;
pub mod import;
mod memory;
mod wire;

pub use client::{PceClient, WorkloadUpdate};
pub use error::{ClientError, Result};
pub use http::{HttpPceClient, PceEndpoint};
pub use import::{create_or_update_workloads, ImportReport, ItemFailure};
pub use memory::InMemoryPceClient;
