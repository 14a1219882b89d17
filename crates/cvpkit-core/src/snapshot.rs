// ── Container snapshots ──

use cvpkit_api::{Container, PortalClient, SnapshotTemplate};
use tracing::info;

use crate::error::CoreError;

/// Find a container by exact name. CVP's search matches substrings.
pub async fn find_container(portal: &PortalClient, name: &str) -> Result<Container, CoreError> {
    portal
        .search_containers(name)
        .await?
        .into_iter()
        .find(|c| c.name == name)
        .ok_or_else(|| CoreError::NotFound {
            entity_type: "container".into(),
            identifier: name.into(),
        })
}

/// Find a snapshot template by exact name.
pub async fn find_template(portal: &PortalClient, name: &str) -> Result<SnapshotTemplate, CoreError> {
    portal
        .search_snapshot_templates(name)
        .await?
        .into_iter()
        .find(|t| t.name == name)
        .ok_or_else(|| CoreError::NotFound {
            entity_type: "snapshot template".into(),
            identifier: name.into(),
        })
}

/// Capture `template` across every device in `container`. Returns CVP's
/// acknowledgement, normally `"success"`.
pub async fn capture(
    portal: &PortalClient,
    container: &str,
    template: &str,
) -> Result<String, CoreError> {
    let container = find_container(portal, container).await?;
    let template = find_template(portal, template).await?;

    let ack = portal
        .capture_container_snapshot(&template.key, &container.key)
        .await?;
    info!(container = %container.name, template = %template.name, %ack, "snapshot requested");
    Ok(ack)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use cvpkit_api::{ApiPrefix, TransportConfig};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn portal(server: &MockServer) -> PortalClient {
        PortalClient::new(
            server.uri().parse().unwrap(),
            ApiPrefix::Web,
            &TransportConfig::default(),
        )
        .unwrap()
    }

    async fn mount_containers(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/web/inventory/add/searchContainers.do"))
            .and(query_param("queryparam", "Leaf"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "key": "container_2", "name": "dc1 Leaf" },
                    { "key": "container_1", "name": "Leaf" }
                ]
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn capture_resolves_exact_names() {
        let server = MockServer::start().await;
        mount_containers(&server).await;
        Mock::given(method("GET"))
            .and(path("/web/snapshot/getSnapshotTemplates.do"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "key": "snapshotTemplate_9", "name": "pre-change" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/web/snapshot/captureContainerLevelSnapshot.do"))
            .and(body_json(json!({
                "templateId": "snapshotTemplate_9",
                "containerId": "container_1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": "success" })))
            .expect(1)
            .mount(&server)
            .await;

        let ack = capture(&portal(&server), "Leaf", "pre-change").await.unwrap();
        assert_eq!(ack, "success");
    }

    #[tokio::test]
    async fn missing_template_is_not_found() {
        let server = MockServer::start().await;
        mount_containers(&server).await;
        Mock::given(method("GET"))
            .and(path("/web/snapshot/getSnapshotTemplates.do"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;

        let err = capture(&portal(&server), "Leaf", "pre-change").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { ref entity_type, .. } if entity_type == "snapshot template"));
    }

    #[tokio::test]
    async fn substring_matches_are_not_enough() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/web/inventory/add/searchContainers.do"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "key": "container_2", "name": "dc1 Leaf" }]
            })))
            .mount(&server)
            .await;

        let err = find_container(&portal(&server), "Leaf").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}
