//! JSON bodies exchanged with the PCE REST API

use serde::{Deserialize, Serialize};
use workloader_types::{Interface, ManagementMode, Workload};

#[derive(Debug, Deserialize)]
pub(crate) struct ProductVersion {
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ApiLabel {
    #[serde(default)]
    pub href: String,
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct HrefRef {
    pub href: String,
}

/// Label reference on a workload; newer PCEs inline key and value
#[derive(Debug, Deserialize)]
pub(crate) struct ApiWorkloadLabel {
    pub href: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ApiInterface {
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr_block: Option<u8>,
}

impl From<&Interface> for ApiInterface {
    fn from(i: &Interface) -> Self {
        Self {
            name: i.name.clone(),
            address: i.address.clone(),
            cidr_block: i.cidr_block,
        }
    }
}

impl From<ApiInterface> for Interface {
    fn from(i: ApiInterface) -> Self {
        Self {
            name: i.name,
            address: i.address,
            cidr_block: i.cidr_block,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AgentRef {
    #[serde(default)]
    pub href: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiWorkload {
    pub href: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub labels: Vec<ApiWorkloadLabel>,
    #[serde(default)]
    pub interfaces: Vec<ApiInterface>,
    #[serde(default)]
    pub external_data_set: Option<String>,
    #[serde(default)]
    pub external_data_reference: Option<String>,
    #[serde(default)]
    pub agent: Option<AgentRef>,
    #[serde(default)]
    pub ven: Option<AgentRef>,
}

impl ApiWorkload {
    /// A workload is managed when an agent or VEN is attached to it
    pub fn mode(&self) -> ManagementMode {
        let attached = |r: &Option<AgentRef>| {
            r.as_ref()
                .and_then(|a| a.href.as_deref())
                .is_some_and(|h| !h.is_empty())
        };
        if attached(&self.agent) || attached(&self.ven) {
            ManagementMode::Managed
        } else {
            ManagementMode::Unmanaged
        }
    }

    /// Convert to the domain type; `resolve` maps a label href to key and value.
    ///
    /// Fails with the href of the first label that carries no key and value
    /// and that `resolve` does not know.
    pub fn into_workload<F>(self, resolve: F) -> std::result::Result<Workload, String>
    where
        F: Fn(&str) -> Option<(String, String)>,
    {
        let mode = self.mode();
        let labels = self
            .labels
            .iter()
            .map(|l| match (&l.key, &l.value) {
                (Some(k), Some(v)) => Ok((k.clone(), v.clone())),
                _ => resolve(&l.href).ok_or_else(|| l.href.clone()),
            })
            .collect::<std::result::Result<_, _>>()?;

        Ok(Workload {
            href: self.href,
            hostname: self.hostname.unwrap_or_default(),
            name: self.name,
            description: self.description,
            mode,
            labels,
            interfaces: self.interfaces.into_iter().map(Interface::from).collect(),
            external_data_set: self.external_data_set,
            external_data_reference: self.external_data_reference,
        })
    }
}

/// Body for creating or updating a workload
#[derive(Debug, Serialize)]
pub(crate) struct ApiWorkloadWrite {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    pub description: String,
    pub labels: Vec<HrefRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<Vec<ApiInterface>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_data_set: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_data_reference: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ApiLabelCreate<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_managed_detection() {
        let managed: ApiWorkload = serde_json::from_value(serde_json::json!({
            "href": "/orgs/1/workloads/1",
            "hostname": "web1",
            "agent": { "href": "/orgs/1/agents/7" }
        }))
        .unwrap();
        assert_eq!(managed.mode(), ManagementMode::Managed);

        let unmanaged: ApiWorkload = serde_json::from_value(serde_json::json!({
            "href": "/orgs/1/workloads/2",
            "hostname": "db1",
            "agent": { "href": null }
        }))
        .unwrap();
        assert_eq!(unmanaged.mode(), ManagementMode::Unmanaged);
    }

    #[test]
    fn test_label_resolution() {
        let api: ApiWorkload = serde_json::from_value(serde_json::json!({
            "href": "/orgs/1/workloads/1",
            "hostname": "web1",
            "labels": [
                { "href": "/orgs/1/labels/1", "key": "role", "value": "web" },
                { "href": "/orgs/1/labels/2" }
            ],
            "interfaces": [{ "name": "eth0", "address": "10.0.0.1", "cidr_block": 24 }]
        }))
        .unwrap();

        let w = api
            .into_workload(|href| {
                (href == "/orgs/1/labels/2").then(|| ("env".to_string(), "prod".to_string()))
            })
            .unwrap();
        assert_eq!(w.label("role"), Some("web"));
        assert_eq!(w.label("env"), Some("prod"));
        assert_eq!(w.labels.len(), 2);
        assert_eq!(w.interfaces[0].descriptor(), "eth0:10.0.0.1/24");
    }

    #[test]
    fn test_unknown_label_reference_is_an_error() {
        let api: ApiWorkload = serde_json::from_value(serde_json::json!({
            "href": "/orgs/1/workloads/1",
            "hostname": "web1",
            "labels": [
                { "href": "/orgs/1/labels/1", "key": "role", "value": "web" },
                { "href": "/orgs/1/labels/404" }
            ]
        }))
        .unwrap();

        let err = api.into_workload(|_| None).unwrap_err();
        assert_eq!(err, "/orgs/1/labels/404");
    }
}
