// ── Provisioned devices ──

use cvpkit_api::PortalClient;
use tracing::debug;

use crate::error::CoreError;
use crate::model::{ComplianceCode, Switch};

/// Every device in the provisioning inventory, sorted by hostname.
pub async fn list_switches(portal: &PortalClient) -> Result<Vec<Switch>, CoreError> {
    let mut switches: Vec<Switch> = portal
        .list_devices()
        .await?
        .into_iter()
        .map(Switch::from)
        .collect();
    switches.sort_by(|a, b| a.hostname.cmp(&b.hostname));
    debug!(count = switches.len(), "devices listed");
    Ok(switches)
}

/// Fill in each switch's compliance code, one request per switch.
pub async fn with_compliance(portal: &PortalClient, switches: &mut [Switch]) -> Result<(), CoreError> {
    for switch in switches.iter_mut() {
        let result = portal.check_compliance(&switch.mac_address).await?;
        switch.compliance = result.compliance_code.parse::<ComplianceCode>().ok();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use cvpkit_api::{ApiPrefix, TransportConfig};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn lists_sorted_with_compliance() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/web/inventory/getInventory.do"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "netElementList": [
                    { "hostname": "spine1", "fqdn": "spine1.lab", "systemMacAddress": "00:1c:73:00:00:02" },
                    { "hostname": "leaf1", "fqdn": "leaf1.lab", "systemMacAddress": "00:1c:73:00:00:01" }
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/web/provisioning/checkCompliance.do"))
            .and(body_partial_json(json!({ "nodeId": "00:1c:73:00:00:01" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "complianceCode": "0000" })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/web/provisioning/checkCompliance.do"))
            .and(body_partial_json(json!({ "nodeId": "00:1c:73:00:00:02" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "complianceCode": "0001" })))
            .mount(&server)
            .await;

        let portal = PortalClient::new(server.uri().parse().unwrap(), ApiPrefix::Web, &TransportConfig::default())
            .unwrap();
        let mut switches = list_switches(&portal).await.unwrap();
        with_compliance(&portal, &mut switches).await.unwrap();

        assert_eq!(switches[0].hostname, "leaf1");
        assert!(switches[0].compliance.unwrap().is_compliant());
        assert_eq!(switches[1].compliance.unwrap().code(), 1);
    }
}
