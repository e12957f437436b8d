//! Replication run configuration

use crate::error::{ReplicateError, Result};
use std::collections::HashSet;
use std::path::PathBuf;

/// Everything a replication run needs to know up front
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicateConfig {
    /// PCE names taking part in the run, in processing order
    pub pce_names: Vec<String>,

    /// PCE names that receive workloads but do not contribute their own
    pub skip_sources: Vec<String>,

    /// Output file name override; prefixed with `wkld-import-` / `wkld-delete-`
    pub output_file: Option<String>,

    /// Directory the audit files are written to
    pub output_dir: PathBuf,

    /// Apply the plan to the PCEs (otherwise a dry run)
    pub update_pce: bool,

    /// Skip the confirmation prompt when applying
    pub no_prompt: bool,
}

impl ReplicateConfig {
    pub fn new<I, S>(pce_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pce_names: pce_names.into_iter().map(Into::into).collect(),
            skip_sources: Vec::new(),
            output_file: None,
            output_dir: PathBuf::from("."),
            update_pce: false,
            no_prompt: false,
        }
    }

    pub fn with_skip_sources<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_sources = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_output_file(mut self, name: impl Into<String>) -> Self {
        self.output_file = Some(name.into());
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_update_pce(mut self, update_pce: bool, no_prompt: bool) -> Self {
        self.update_pce = update_pce;
        self.no_prompt = no_prompt;
        self
    }

    /// Split a comma-separated name list, ignoring spaces and empty entries
    pub fn parse_list(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(|s| s.chars().filter(|c| !c.is_whitespace()).collect::<String>())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Check the configuration without contacting any PCE
    pub fn validate(&self) -> Result<()> {
        if self.pce_names.is_empty() {
            return Err(ReplicateError::Config("the pce list is empty".into()));
        }

        let mut seen = HashSet::new();
        for name in &self.pce_names {
            if !seen.insert(name.as_str()) {
                return Err(ReplicateError::Config(format!(
                    "{} appears more than once in the pce list",
                    name
                )));
            }
        }

        for skip in &self.skip_sources {
            if !seen.contains(skip.as_str()) {
                return Err(ReplicateError::SkipSourceNotListed(skip.clone()));
            }
        }

        if self
            .output_file
            .as_deref()
            .is_some_and(|f| f.trim().is_empty())
        {
            return Err(ReplicateError::Config("output file name is empty".into()));
        }

        Ok(())
    }

    pub fn is_skipped_source(&self, name: &str) -> bool {
        self.skip_sources.iter().any(|s| s == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        assert_eq!(
            ReplicateConfig::parse_list("pce1, pce2 ,,pce 3"),
            vec!["pce1", "pce2", "pce3"]
        );
        assert!(ReplicateConfig::parse_list("").is_empty());
    }

    #[test]
    fn test_skip_source_must_be_listed() {
        let config = ReplicateConfig::new(["b", "c"]).with_skip_sources(["a"]);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ReplicateError::SkipSourceNotListed(ref n) if n == "a"));
        assert!(err.is_config());
        assert!(err.to_string().starts_with("a is not in the pce list"));
    }

    #[test]
    fn test_valid_config() {
        let config = ReplicateConfig::new(["a", "b"])
            .with_skip_sources(["a"])
            .with_output_file("run.csv");
        assert!(config.validate().is_ok());
        assert!(config.is_skipped_source("a"));
        assert!(!config.is_skipped_source("b"));
        assert!(!config.update_pce);
    }

    #[test]
    fn test_rejects_empty_and_duplicate_lists() {
        assert!(ReplicateConfig::new(Vec::<String>::new()).validate().is_err());
        assert!(ReplicateConfig::new(["a", "a"]).validate().is_err());
        assert!(ReplicateConfig::new(["a"])
            .with_output_file(" ")
            .validate()
            .is_err());
    }
}
