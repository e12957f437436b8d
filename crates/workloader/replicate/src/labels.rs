//! Label key discovery

use crate::error::{ReplicateError, Result};
use tracing::info;
use workloader_client::PceClient;
use workloader_types::{PceInstance, LEGACY_LABEL_KEYS};

/// Label keys used for every row of a run.
///
/// When every PCE supports label dimensions the keys come from the first PCE in
/// the list; otherwise the legacy four keys are used.
pub async fn discover_label_keys(
    client: &dyn PceClient,
    instances: &[PceInstance],
) -> Result<Vec<String>> {
    let first = match instances.first() {
        Some(first) => first,
        None => return Err(ReplicateError::Config("the pce list is empty".into())),
    };

    if !instances
        .iter()
        .all(|pce| pce.version.supports_label_dimensions())
    {
        return Ok(LEGACY_LABEL_KEYS.iter().map(|k| k.to_string()).collect());
    }

    let dimensions = client
        .list_label_dimensions(first)
        .await
        .map_err(|e| ReplicateError::collection(&first.fqdn, e))?;

    let keys: Vec<String> = dimensions.into_iter().map(|d| d.key).collect();
    info!(
        pce = %first,
        keys = %keys.join(","),
        "All pces support label dimensions; using label dimensions of the first pce"
    );
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use workloader_client::InMemoryPceClient;
    use workloader_types::{LabelDimension, PceVersion};

    fn client_with(versions: &[(&str, PceVersion)]) -> (InMemoryPceClient, Vec<PceInstance>) {
        let client = InMemoryPceClient::new();
        let mut instances = Vec::new();
        for (name, version) in versions {
            let pce = PceInstance::new(*name, format!("{}.example.com", name), *version);
            client.add_instance(
                pce.clone(),
                vec![
                    LabelDimension::new(format!("{}-role", name)),
                    LabelDimension::new("tier"),
                ],
            );
            instances.push(pce);
        }
        (client, instances)
    }

    #[tokio::test]
    async fn test_dimensions_from_first_pce() {
        let (client, instances) = client_with(&[
            ("a", PceVersion::new(23, 2, 0)),
            ("b", PceVersion::new(22, 5, 10)),
        ]);
        let keys = discover_label_keys(&client, &instances).await.unwrap();
        assert_eq!(keys, vec!["a-role", "tier"]);
    }

    #[tokio::test]
    async fn test_legacy_keys_when_any_pce_is_older() {
        let (client, instances) = client_with(&[
            ("a", PceVersion::new(23, 2, 0)),
            ("b", PceVersion::new(21, 5, 0)),
        ]);
        let keys = discover_label_keys(&client, &instances).await.unwrap();
        assert_eq!(keys, vec!["role", "app", "env", "loc"]);
        assert_eq!(client.api_calls(), 0);
    }
}
