// ── Fabric upload ──
//
// Uploads every configlet, then builds the container tree
// `Tenant / {dc} / {dc} Leaf, {dc} Spine` with the base configlet
// mapped on the data center container.

use cvpkit_api::{Configlet, PortalClient};
use serde::Serialize;
use tracing::info;

use super::templates::base_configlet_name;
use super::{FabricOptions, GeneratedConfiglet};
use crate::error::CoreError;
use crate::snapshot::find_container;

/// Root of the provisioning tree in every CVP install.
pub const TENANT_CONTAINER: &str = "Tenant";

#[derive(Debug, Clone, Default, Serialize)]
pub struct PushSummary {
    /// `(name, key)` of every configlet created.
    pub configlets: Vec<(String, String)>,
    pub containers: Vec<String>,
}

pub async fn push(
    portal: &PortalClient,
    opts: &FabricOptions,
    configlets: &[GeneratedConfiglet],
) -> Result<PushSummary, CoreError> {
    let mut summary = PushSummary::default();
    let base_name = base_configlet_name(&opts.name);
    let mut base = None;

    for configlet in configlets {
        let key = portal.add_configlet(&configlet.name, &configlet.config).await?;
        info!(name = %configlet.name, %key, "configlet added");
        if configlet.name == base_name {
            base = Some(Configlet {
                key: key.clone(),
                name: configlet.name.clone(),
                config: configlet.config.clone(),
                ..Configlet::default()
            });
        }
        summary.configlets.push((configlet.name.clone(), key));
    }

    let tenant = find_container(portal, TENANT_CONTAINER).await?;
    portal.add_container(&opts.name, &tenant).await?;
    summary.containers.push(opts.name.clone());
    let dc = find_container(portal, &opts.name).await?;

    if let Some(base) = base {
        portal.apply_configlets_to_container(&dc, &[base]).await?;
        info!(container = %dc.name, "base configlet applied");
    }

    for role in ["Leaf", "Spine"] {
        let name = format!("{} {role}", opts.name);
        portal.add_container(&name, &dc).await?;
        info!(container = %name, parent = %dc.name, "container added");
        summary.containers.push(name);
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use cvpkit_api::{ApiPrefix, TransportConfig};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::fabric::Deployment;
    use crate::fabric::tests::options;

    #[tokio::test]
    async fn push_uploads_and_builds_tree() {
        let server = MockServer::start().await;
        let portal = PortalClient::new(
            server.uri().parse().unwrap(),
            ApiPrefix::Web,
            &TransportConfig::default(),
        )
        .unwrap();

        Mock::given(method("POST"))
            .and(path("/web/configlet/addConfiglet.do"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "key": "configlet_1", "name": "x" }
            })))
            .expect(3)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/web/inventory/add/searchContainers.do"))
            .and(query_param("queryparam", "Tenant"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "key": "root", "name": "Tenant" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/web/inventory/add/searchContainers.do"))
            .and(query_param("queryparam", "dc1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "key": "container_7", "name": "dc1" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/web/provisioning/getConfigletsByNetElementId.do"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "configletList": [] })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/web/provisioning/addTempAction.do"))
            .and(body_partial_json(json!({
                "data": [{ "action": "associate", "toId": "container_7" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": "success" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/web/provisioning/addTempAction.do"))
            .and(body_partial_json(json!({ "data": [{ "action": "add" }] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": "success" })))
            .expect(3)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/web/provisioning/v2/saveTopology.do"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "status": "success" } })))
            .expect(4)
            .mount(&server)
            .await;

        let opts = options(Deployment::Her, false);
        let configlets = vec![
            GeneratedConfiglet { name: "dc1spine1 configuration".into(), config: "!".into() },
            GeneratedConfiglet { name: "dc1leaf1 configuration".into(), config: "!".into() },
            GeneratedConfiglet { name: "dc1 Base config".into(), config: "ip routing".into() },
        ];
        let summary = push(&portal, &opts, &configlets).await.unwrap();

        assert_eq!(summary.configlets.len(), 3);
        assert_eq!(summary.containers, vec!["dc1", "dc1 Leaf", "dc1 Spine"]);
    }
}
