//! PCE instance types

use crate::error::{TypesError, TypesResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label keys used when any PCE in a run predates label dimensions.
pub const LEGACY_LABEL_KEYS: [&str; 4] = ["role", "app", "env", "loc"];

/// A PCE the tool talks to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PceInstance {
    /// Friendly name used on the command line
    pub name: String,

    /// Network address, also the owner prefix in provenance references
    pub fqdn: String,

    /// API port
    pub port: u16,

    /// Organization id
    pub org_id: u32,

    /// Product version, resolved from the PCE at the start of a run
    pub version: PceVersion,
}

impl PceInstance {
    pub fn new(name: impl Into<String>, fqdn: impl Into<String>, version: PceVersion) -> Self {
        Self {
            name: name.into(),
            fqdn: fqdn.into(),
            port: 8443,
            org_id: 1,
            version,
        }
    }

    /// Address used to key workloads and to encode ownership
    pub fn address(&self) -> &str {
        &self.fqdn
    }
}

impl fmt::Display for PceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.fqdn)
    }
}

/// PCE product version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PceVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl PceVersion {
    /// First release with user-defined label dimensions.
    pub const LABEL_DIMENSIONS: PceVersion = PceVersion::new(22, 5, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a product version such as `22.5.10-17` or `21.2`.
    pub fn parse(raw: &str) -> TypesResult<Self> {
        let core = raw.trim().split(['-', '+', ' ']).next().unwrap_or_default();
        let mut parts = core.split('.');

        let mut next = |required: bool| -> TypesResult<u32> {
            match parts.next() {
                Some(p) => p
                    .parse::<u32>()
                    .map_err(|_| TypesError::InvalidVersion(raw.to_string())),
                None if required => Err(TypesError::InvalidVersion(raw.to_string())),
                None => Ok(0),
            }
        };

        let major = next(true)?;
        let minor = next(true)?;
        let patch = next(false)?;
        Ok(Self::new(major, minor, patch))
    }

    /// Whether this PCE supports label dimensions beyond the legacy four keys
    pub fn supports_label_dimensions(&self) -> bool {
        (self.major, self.minor) >= (Self::LABEL_DIMENSIONS.major, Self::LABEL_DIMENSIONS.minor)
    }
}

impl fmt::Display for PceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A label dimension (label key) defined on a PCE
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDimension {
    #[serde(default)]
    pub href: String,
    pub key: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl LabelDimension {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            href: format!("/orgs/1/label_dimensions/{}", key),
            key,
            display_name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_version() {
        let v = PceVersion::parse("22.5.10-17").unwrap();
        assert_eq!(v, PceVersion::new(22, 5, 10));
    }

    #[test]
    fn test_parse_major_minor_only() {
        let v = PceVersion::parse("21.2").unwrap();
        assert_eq!(v, PceVersion::new(21, 2, 0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(PceVersion::parse("").is_err());
        assert!(PceVersion::parse("22").is_err());
        assert!(PceVersion::parse("v22.5").is_err());
    }

    #[test]
    fn test_label_dimension_support() {
        assert!(PceVersion::new(22, 5, 0).supports_label_dimensions());
        assert!(PceVersion::new(23, 1, 0).supports_label_dimensions());
        assert!(!PceVersion::new(22, 4, 9).supports_label_dimensions());
        assert!(!PceVersion::new(21, 5, 0).supports_label_dimensions());
    }

    #[test]
    fn test_instance_display() {
        let pce = PceInstance::new("prod", "pce.example.com", PceVersion::new(23, 2, 0));
        assert_eq!(pce.to_string(), "prod (pce.example.com)");
        assert_eq!(pce.address(), "pce.example.com");
    }
}
