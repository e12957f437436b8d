//! PCE registry configuration
//!
//! ```toml
//! [[pce]]
//! name = "east"
//! fqdn = "pce-east.example.com"
//! port = 8443
//! org = 1
//! user = "api_1a2b3c"
//! key = "..."
//! disable_tls_verification = false
//! ```

use crate::error::{CliError, CliResult};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use workloader_client::PceEndpoint;

/// Configured PCEs
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PceRegistry {
    #[serde(default, rename = "pce")]
    pub pces: Vec<PceEndpoint>,

    #[serde(skip)]
    pub path: Option<PathBuf>,
}

impl PceRegistry {
    /// Load the registry; a missing file yields an empty registry
    pub fn load(path: Option<&str>) -> CliResult<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => Self::default_config_path()?,
        };

        if !config_path.exists() {
            return Ok(PceRegistry::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;
        let mut registry = Self::parse(&contents, |name| std::env::var(key_env_var(name)).ok())?;
        registry.path = Some(config_path);
        Ok(registry)
    }

    /// Parse registry TOML; `env_key` may supply a key per PCE name
    pub fn parse(contents: &str, env_key: impl Fn(&str) -> Option<String>) -> CliResult<Self> {
        let mut registry: PceRegistry =
            toml::from_str(contents).map_err(|e| CliError::Config(e.to_string()))?;

        let mut seen = HashSet::new();
        for pce in &mut registry.pces {
            if !seen.insert(pce.name.clone()) {
                return Err(CliError::Config(format!(
                    "pce {} is defined more than once",
                    pce.name
                )));
            }
            if let Some(key) = env_key(&pce.name) {
                pce.key = key;
            }
        }

        Ok(registry)
    }

    pub fn names(&self) -> Vec<&str> {
        self.pces.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn location(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn default_config_path() -> CliResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CliError::Config("Cannot find config directory".into()))?;
        Ok(config_dir.join("workloader").join("pce.toml"))
    }
}

/// `WORKLOADER_<NAME>_KEY`, with non-alphanumerics mapped to `_`
pub fn key_env_var(name: &str) -> String {
    let name: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("WORKLOADER_{}_KEY", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[pce]]
name = "east"
fqdn = "pce-east.example.com"
org = 3
user = "api_1"
key = "secret"

[[pce]]
name = "west-2"
fqdn = "pce-west.example.com"
port = 443
disable_tls_verification = true
"#;

    #[test]
    fn test_parse_registry() {
        let registry = PceRegistry::parse(SAMPLE, |_| None).unwrap();
        assert_eq!(registry.names(), vec!["east", "west-2"]);

        let east = &registry.pces[0];
        assert_eq!(east.port, 8443);
        assert_eq!(east.org_id, 3);
        assert_eq!(east.key, "secret");

        let west = &registry.pces[1];
        assert_eq!(west.port, 443);
        assert_eq!(west.org_id, 1);
        assert!(west.disable_tls_verification);
    }

    #[test]
    fn test_env_key_overrides() {
        let registry = PceRegistry::parse(SAMPLE, |name| {
            (key_env_var(name) == "WORKLOADER_WEST_2_KEY").then(|| "from-env".to_string())
        })
        .unwrap();
        assert_eq!(registry.pces[0].key, "secret");
        assert_eq!(registry.pces[1].key, "from-env");
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let doubled = format!("{}\n{}", SAMPLE, "[[pce]]\nname = \"east\"\nfqdn = \"x\"\n");
        assert!(PceRegistry::parse(&doubled, |_| None).is_err());
    }

    #[test]
    fn test_load_missing_config() {
        let registry = PceRegistry::load(Some("/nonexistent/path/pce.toml")).unwrap();
        assert!(registry.pces.is_empty());
        assert!(registry.location().is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pce.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let registry = PceRegistry::load(path.to_str()).unwrap();
        assert_eq!(registry.pces.len(), 2);
        assert_eq!(registry.location(), Some(path.as_path()));
    }
}
