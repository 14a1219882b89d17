// Static configlet endpoints.

use serde_json::json;
use tracing::debug;

use crate::error::Error;
use crate::portal::client::PortalClient;
use crate::portal::models::{Configlet, DataList, DataValue};

impl PortalClient {
    /// List all configlets.
    ///
    /// `GET {prefix}/configlet/getConfiglets.do?startIndex=0&endIndex=0`
    pub async fn list_configlets(&self) -> Result<Vec<Configlet>, Error> {
        let url = self.api_url_with_query(
            "/configlet/getConfiglets.do",
            &[("startIndex", "0"), ("endIndex", "0")],
        )?;
        debug!("listing configlets");
        let resp: DataList<Configlet> = self.get(url).await?;
        Ok(resp.data)
    }

    /// Get a configlet by name.
    ///
    /// `GET {prefix}/configlet/getConfigletByName.do?name={name}`
    ///
    /// A missing configlet surfaces as an error for which
    /// [`Error::is_not_found`] is true.
    pub async fn get_configlet_by_name(&self, name: &str) -> Result<Configlet, Error> {
        let url = self.api_url_with_query("/configlet/getConfigletByName.do", &[("name", name)])?;
        debug!(name, "fetching configlet");
        self.get(url).await
    }

    /// Create a configlet and return its key.
    ///
    /// `POST {prefix}/configlet/addConfiglet.do` with `{"config", "name"}`
    pub async fn add_configlet(&self, name: &str, config: &str) -> Result<String, Error> {
        let url = self.api_url("/configlet/addConfiglet.do")?;
        debug!(name, "adding configlet");
        let resp: DataValue<Configlet> = self
            .post(url, &json!({ "config": config, "name": name }))
            .await?;
        Ok(resp.data.key)
    }

    /// Replace a configlet's text.
    ///
    /// `POST {prefix}/configlet/updateConfiglet.do` with
    /// `{"config", "key", "name", "waitForTaskIds": false}`
    pub async fn update_configlet(
        &self,
        key: &str,
        name: &str,
        config: &str,
    ) -> Result<String, Error> {
        let url = self.api_url("/configlet/updateConfiglet.do")?;
        debug!(name, key, "updating configlet");
        let resp: DataValue<serde_json::Value> = self
            .post(
                url,
                &json!({
                    "config": config,
                    "key": key,
                    "name": name,
                    "waitForTaskIds": false,
                }),
            )
            .await?;
        Ok(resp
            .data
            .as_str()
            .map_or_else(|| resp.data.to_string(), String::from))
    }

    /// Delete a configlet.
    ///
    /// `POST {prefix}/configlet/deleteConfiglet.do` with `[{"key", "name"}]`
    pub async fn delete_configlet(&self, key: &str, name: &str) -> Result<(), Error> {
        let url = self.api_url("/configlet/deleteConfiglet.do")?;
        debug!(name, key, "deleting configlet");
        let _: serde_json::Value = self.post(url, &json!([{ "key": key, "name": name }])).await?;
        Ok(())
    }
}
