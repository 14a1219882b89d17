// Container and topology endpoints
//
// Topology changes are staged as temp actions and only take effect when
// the topology is saved, so each mutation here is a stage + save pair.

use serde_json::{Value, json};
use tracing::debug;

use crate::error::Error;
use crate::portal::client::PortalClient;
use crate::portal::models::{Configlet, Container, DataList};

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContainerConfiglets {
    #[serde(default)]
    configlet_list: Vec<Configlet>,
}

impl PortalClient {
    /// Search containers by name.
    ///
    /// `GET {prefix}/inventory/add/searchContainers.do?queryparam={name}&startIndex=0&endIndex=0`
    pub async fn search_containers(&self, name: &str) -> Result<Vec<Container>, Error> {
        let url = self.api_url_with_query(
            "/inventory/add/searchContainers.do",
            &[("queryparam", name), ("startIndex", "0"), ("endIndex", "0")],
        )?;
        debug!(name, "searching containers");
        let resp: DataList<Container> = self.get(url).await?;
        Ok(resp.data)
    }

    /// Configlets currently mapped to a container.
    ///
    /// `GET {prefix}/provisioning/getConfigletsByNetElementId.do?netElementId={key}&queryParam=&startIndex=0&endIndex=0`
    pub async fn container_configlets(&self, container_key: &str) -> Result<Vec<Configlet>, Error> {
        let url = self.api_url_with_query(
            "/provisioning/getConfigletsByNetElementId.do",
            &[
                ("netElementId", container_key),
                ("queryParam", ""),
                ("startIndex", "0"),
                ("endIndex", "0"),
            ],
        )?;
        debug!(container_key, "fetching container configlets");
        let resp: ContainerConfiglets = self.get(url).await?;
        Ok(resp.configlet_list)
    }

    /// Stage a topology action.
    ///
    /// `POST {prefix}/provisioning/addTempAction.do?format=topology&queryParam=&nodeId=root`
    pub async fn add_temp_action(&self, action: Value) -> Result<(), Error> {
        let url = self.api_url_with_query(
            "/provisioning/addTempAction.do",
            &[("format", "topology"), ("queryParam", ""), ("nodeId", "root")],
        )?;
        debug!("staging topology action");
        let _: Value = self.post(url, &json!({ "data": [action] })).await?;
        Ok(())
    }

    /// Commit all staged topology actions.
    ///
    /// `POST {prefix}/provisioning/v2/saveTopology.do` with `[]`
    pub async fn save_topology(&self) -> Result<Value, Error> {
        let url = self.api_url("/provisioning/v2/saveTopology.do")?;
        debug!("saving topology");
        self.post(url, &json!([])).await
    }

    /// Create a container under `parent`.
    pub async fn add_container(&self, name: &str, parent: &Container) -> Result<(), Error> {
        let msg = format!("Container {name} created");
        self.add_temp_action(json!({
            "info": msg,
            "infoPreview": msg,
            "action": "add",
            "nodeType": "container",
            "nodeId": "new_container",
            "toId": parent.key,
            "fromId": "",
            "nodeName": name,
            "fromName": "",
            "toName": parent.name,
            "toIdType": "container",
        }))
        .await?;
        self.save_topology().await?;
        Ok(())
    }

    /// Map configlets onto a container, keeping the ones already mapped.
    pub async fn apply_configlets_to_container(
        &self,
        container: &Container,
        configlets: &[Configlet],
    ) -> Result<(), Error> {
        let mut keys = Vec::new();
        let mut names = Vec::new();
        for c in self
            .container_configlets(&container.key)
            .await?
            .iter()
            .chain(configlets)
        {
            if !keys.contains(&c.key) {
                keys.push(c.key.clone());
                names.push(c.name.clone());
            }
        }

        let msg = format!("Apply configlets to container {}", container.name);
        self.add_temp_action(json!({
            "info": msg,
            "infoPreview": msg,
            "action": "associate",
            "nodeType": "configlet",
            "nodeId": "",
            "toId": container.key,
            "fromId": "",
            "nodeName": "",
            "fromName": "",
            "toName": container.name,
            "toIdType": "container",
            "configletList": keys,
            "configletNamesList": names,
            "ignoreConfigletList": [],
            "ignoreConfigletNamesList": [],
            "configletBuilderList": [],
            "configletBuilderNamesList": [],
            "ignoreConfigletBuilderList": [],
            "ignoreConfigletBuilderNamesList": [],
        }))
        .await?;
        self.save_topology().await?;
        Ok(())
    }
}
