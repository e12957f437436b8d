//! HTTP client for the PCE REST API (v2)

use crate::client::{PceClient, WorkloadUpdate};
use crate::error::{ClientError, Result};
use crate::wire::{
    ApiLabel, ApiLabelCreate, ApiWorkload, ApiWorkloadWrite, HrefRef, ProductVersion,
};
use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, info};
use workloader_types::{
    LabelDimension, PceInstance, PceVersion, Workload, WorkloadRecord,
};

fn default_port() -> u16 {
    8443
}

fn default_org_id() -> u32 {
    1
}

fn default_max_results() -> usize {
    100_000
}

/// Connection settings for one PCE
#[derive(Clone, Deserialize)]
pub struct PceEndpoint {
    /// Friendly name used on the command line
    pub name: String,

    /// PCE address
    pub fqdn: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_org_id", alias = "org")]
    pub org_id: u32,

    /// API user (`api_...`)
    #[serde(default)]
    pub user: String,

    /// API key secret
    #[serde(default)]
    pub key: String,

    /// Accept self-signed certificates
    #[serde(default)]
    pub disable_tls_verification: bool,

    /// Override for `https://<fqdn>:<port>/api/v2`
    #[serde(default)]
    pub base_url: Option<String>,

    /// Upper bound requested when listing labels and workloads.
    ///
    /// Listings are synchronous GETs, so an org holding more objects than
    /// this fails with [`ClientError::Truncated`] until it is raised.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl PceEndpoint {
    pub fn new(name: impl Into<String>, fqdn: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fqdn: fqdn.into(),
            port: default_port(),
            org_id: default_org_id(),
            user: String::new(),
            key: String::new(),
            disable_tls_verification: false,
            base_url: None,
            max_results: default_max_results(),
        }
    }

    /// Base URL of the API, without a trailing slash
    pub fn api_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}:{}/api/v2", self.fqdn, self.port),
        }
    }
}

impl std::fmt::Debug for PceEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PceEndpoint")
            .field("name", &self.name)
            .field("fqdn", &self.fqdn)
            .field("port", &self.port)
            .field("org_id", &self.org_id)
            .field("user", &self.user)
            .field("disable_tls_verification", &self.disable_tls_verification)
            .finish()
    }
}

struct Connection {
    endpoint: PceEndpoint,
    client: Client,
    api_url: String,
}

#[derive(Default)]
struct LabelIndex {
    by_href: HashMap<String, (String, String)>,
    by_pair: HashMap<(String, String), String>,
}

impl LabelIndex {
    fn insert(&mut self, label: ApiLabel) {
        self.by_pair
            .insert((label.key.clone(), label.value.clone()), label.href.clone());
        self.by_href.insert(label.href, (label.key, label.value));
    }
}

/// HTTP client for a set of configured PCEs
pub struct HttpPceClient {
    connections: HashMap<String, Connection>,
    labels: DashMap<String, LabelIndex>,
}

impl HttpPceClient {
    /// Create a client for the given endpoints
    pub fn new(endpoints: Vec<PceEndpoint>) -> Result<Self> {
        let mut connections = HashMap::new();
        for endpoint in endpoints {
            let client = Client::builder()
                .timeout(Duration::from_secs(120))
                .danger_accept_invalid_certs(endpoint.disable_tls_verification)
                .build()?;
            let api_url = endpoint.api_url();
            connections.insert(
                endpoint.name.clone(),
                Connection {
                    endpoint,
                    client,
                    api_url,
                },
            );
        }

        Ok(Self {
            connections,
            labels: DashMap::new(),
        })
    }

    fn connection(&self, name: &str) -> Result<&Connection> {
        self.connections
            .get(name)
            .ok_or_else(|| ClientError::UnknownInstance(name.to_string()))
    }

    fn org_path(pce: &PceInstance, suffix: &str) -> String {
        format!("/orgs/{}/{}", pce.org_id, suffix)
    }

    // ========== Labels ==========

    async fn load_labels(&self, pce: &PceInstance) -> Result<()> {
        let labels: Vec<ApiLabel> = self.list_all(pce, "labels").await?;

        let mut index = LabelIndex::default();
        let count = labels.len();
        for label in labels {
            index.insert(label);
        }
        self.labels.insert(pce.name.clone(), index);
        debug!(pce = %pce.name, count, "Loaded labels");
        Ok(())
    }

    fn cached_label_href(&self, pce: &PceInstance, key: &str, value: &str) -> Option<String> {
        self.labels.get(&pce.name).and_then(|index| {
            index
                .by_pair
                .get(&(key.to_string(), value.to_string()))
                .cloned()
        })
    }

    /// Href of the label `key=value`, creating the label if the PCE lacks it
    async fn label_href(&self, pce: &PceInstance, key: &str, value: &str) -> Result<String> {
        if !self.labels.contains_key(&pce.name) {
            self.load_labels(pce).await?;
        }
        if let Some(href) = self.cached_label_href(pce, key, value) {
            return Ok(href);
        }

        let conn = self.connection(&pce.name)?;
        let created: ApiLabel = self
            .request(
                conn,
                Method::POST,
                &Self::org_path(pce, "labels"),
                Some(&ApiLabelCreate { key, value }),
            )
            .await?;
        info!(pce = %pce.name, key, value, href = %created.href, "Created label");

        let href = created.href.clone();
        self.labels
            .entry(pce.name.clone())
            .or_default()
            .insert(created);
        Ok(href)
    }

    async fn label_refs(
        &self,
        pce: &PceInstance,
        labels: &BTreeMap<String, String>,
    ) -> Result<Vec<HrefRef>> {
        let mut refs = Vec::with_capacity(labels.len());
        for (key, value) in labels {
            refs.push(HrefRef {
                href: self.label_href(pce, key, value).await?,
            });
        }
        Ok(refs)
    }

    fn resolve_label(&self, pce: &PceInstance, href: &str) -> Option<(String, String)> {
        self.labels
            .get(&pce.name)
            .and_then(|index| index.by_href.get(href).cloned())
    }

    fn to_workload(&self, pce: &PceInstance, api: ApiWorkload) -> Result<Workload> {
        let workload = api.href.clone();
        api.into_workload(|href| self.resolve_label(pce, href))
            .map_err(|label| ClientError::UnresolvedLabel {
                instance: pce.name.clone(),
                workload,
                label,
            })
    }

    // ========== Internal HTTP helpers ==========

    /// GET a whole org collection, failing when the PCE holds more than it returned
    async fn list_all<T: DeserializeOwned>(
        &self,
        pce: &PceInstance,
        collection: &'static str,
    ) -> Result<Vec<T>> {
        let conn = self.connection(&pce.name)?;
        let path = format!(
            "{}?max_results={}",
            Self::org_path(pce, collection),
            conn.endpoint.max_results
        );
        let response = self
            .check(self.builder(conn, Method::GET, &path).send().await?)
            .await?;

        let total = response
            .headers()
            .get("X-Total-Count")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        let items: Vec<T> = response.json().await?;

        if let Some(total) = total {
            if total > items.len() {
                return Err(ClientError::Truncated {
                    instance: pce.name.clone(),
                    collection,
                    returned: items.len(),
                    total,
                });
            }
        }
        Ok(items)
    }

    fn builder(&self, conn: &Connection, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", conn.api_url, path);
        conn.client
            .request(method, &url)
            .basic_auth(&conn.endpoint.user, Some(&conn.endpoint.key))
    }

    async fn request<B: Serialize, T: DeserializeOwned>(
        &self,
        conn: &Connection,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let mut builder = self.builder(conn, method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = self.check(builder.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn request_empty<B: Serialize>(
        &self,
        conn: &Connection,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<()> {
        let mut builder = self.builder(conn, method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.check(builder.send().await?).await?;
        Ok(())
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if status.is_success() {
            Ok(response)
        } else if status == StatusCode::NOT_FOUND {
            Err(ClientError::NotFound(response.url().path().to_string()))
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl PceClient for HttpPceClient {
    async fn resolve_instance(&self, name: &str) -> Result<PceInstance> {
        let conn = self.connection(name)?;
        let product: ProductVersion = self
            .request(conn, Method::GET, "/product_version", None::<&()>)
            .await?;
        let version = PceVersion::parse(&product.version)?;

        Ok(PceInstance {
            name: conn.endpoint.name.clone(),
            fqdn: conn.endpoint.fqdn.clone(),
            port: conn.endpoint.port,
            org_id: conn.endpoint.org_id,
            version,
        })
    }

    async fn list_workloads(&self, pce: &PceInstance) -> Result<Vec<Workload>> {
        self.load_labels(pce).await?;

        let workloads: Vec<ApiWorkload> = self.list_all(pce, "workloads").await?;
        workloads
            .into_iter()
            .map(|w| self.to_workload(pce, w))
            .collect()
    }

    async fn list_label_dimensions(&self, pce: &PceInstance) -> Result<Vec<LabelDimension>> {
        let conn = self.connection(&pce.name)?;
        self.request(
            conn,
            Method::GET,
            &Self::org_path(pce, "label_dimensions"),
            None::<&()>,
        )
        .await
    }

    async fn create_workload(
        &self,
        pce: &PceInstance,
        record: &WorkloadRecord,
    ) -> Result<Workload> {
        let labels = self.label_refs(pce, &record.assigned_labels()).await?;
        let body = ApiWorkloadWrite {
            hostname: Some(record.hostname.clone()),
            description: record.description.clone(),
            labels,
            interfaces: Some(record.interfaces.iter().map(Into::into).collect()),
            external_data_set: record.provenance.as_ref().map(|p| p.data_set().to_string()),
            external_data_reference: record.provenance.as_ref().map(|p| p.reference()),
        };

        let conn = self.connection(&pce.name)?;
        let created: ApiWorkload = self
            .request(
                conn,
                Method::POST,
                &Self::org_path(pce, "workloads"),
                Some(&body),
            )
            .await?;
        self.to_workload(pce, created)
    }

    async fn update_workload(
        &self,
        pce: &PceInstance,
        href: &str,
        update: &WorkloadUpdate,
    ) -> Result<()> {
        let labels = self.label_refs(pce, &update.labels).await?;
        let body = ApiWorkloadWrite {
            hostname: None,
            description: update.description.clone(),
            labels,
            interfaces: None,
            external_data_set: update.provenance.as_ref().map(|p| p.data_set().to_string()),
            external_data_reference: update.provenance.as_ref().map(|p| p.reference()),
        };

        let conn = self.connection(&pce.name)?;
        self.request_empty(conn, Method::PUT, href, Some(&body)).await
    }

    async fn delete_workload(&self, pce: &PceInstance, href: &str) -> Result<()> {
        let conn = self.connection(&pce.name)?;
        self.request_empty(conn, Method::DELETE, href, None::<&()>)
            .await
    }
}
