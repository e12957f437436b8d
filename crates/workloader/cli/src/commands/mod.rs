//! CLI command implementations

pub mod pce;
pub mod replicate;
