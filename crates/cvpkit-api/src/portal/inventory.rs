// Inventory, compliance, and reachability endpoints.

use serde_json::json;
use tracing::debug;

use crate::error::Error;
use crate::portal::client::PortalClient;
use crate::portal::models::{ComplianceResult, DataValue, InventoryResponse, NetElement};

impl PortalClient {
    /// List every provisioned device.
    ///
    /// `GET {prefix}/inventory/getInventory.do?startIndex=0&endIndex=0`
    pub async fn list_devices(&self) -> Result<Vec<NetElement>, Error> {
        let url = self.api_url_with_query(
            "/inventory/getInventory.do",
            &[("startIndex", "0"), ("endIndex", "0")],
        )?;
        debug!("listing devices");
        let resp: InventoryResponse = self.get(url).await?;
        Ok(resp.net_element_list)
    }

    /// Look up a single device by its system MAC address.
    ///
    /// `GET {prefix}/provisioning/getNetElementById.do?netElementId={mac}`
    pub async fn get_net_element(&self, mac: &str) -> Result<NetElement, Error> {
        let url = self.api_url_with_query(
            "/provisioning/getNetElementById.do",
            &[("netElementId", mac)],
        )?;
        debug!(mac, "fetching net element");
        self.get(url).await
    }

    /// Run a compliance check against one device.
    ///
    /// `POST {prefix}/provisioning/checkCompliance.do` with
    /// `{"nodeId": mac, "nodeType": "netelement"}`
    pub async fn check_compliance(&self, mac: &str) -> Result<ComplianceResult, Error> {
        let url = self.api_url("/provisioning/checkCompliance.do")?;
        debug!(mac, "checking compliance");
        self.post(url, &json!({ "nodeId": mac, "nodeType": "netelement" }))
            .await
    }

    /// Ask CVP whether it can reach an IP address.
    ///
    /// `POST {prefix}/provisioning/ipConnectivityTest.do` with `{"ipAddress": ip}`.
    /// Returns `true` when CVP answers `{"data": "success"}`. An unreachable
    /// address comes back as an API error (code 122605), which is passed
    /// through for the caller to interpret.
    pub async fn ip_connectivity_test(&self, ip: &str) -> Result<bool, Error> {
        let url = self.api_url("/provisioning/ipConnectivityTest.do")?;
        debug!(ip, "testing connectivity");
        let resp: DataValue<serde_json::Value> =
            self.post(url, &json!({ "ipAddress": ip })).await?;
        Ok(resp.data.as_str() == Some("success"))
    }
}
