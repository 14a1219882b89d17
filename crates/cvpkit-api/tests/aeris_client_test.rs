#![allow(clippy::unwrap_used)]
// Integration tests for `AerisClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cvpkit_api::{AerisClient, Error, TransportConfig};
use cvpkit_api::aeris::paths;

async fn setup() -> (MockServer, AerisClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = AerisClient::new(base_url, &TransportConfig::default()).unwrap();
    (server, client)
}

#[tokio::test]
async fn test_list_switches_returns_root_keys() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/aeris/v1/rest"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "SN-LEAF1": {},
            "SN-SPINE1": {}
        })))
        .mount(&server)
        .await;

    let mut switches = client.list_switches().await.unwrap();
    switches.sort();
    assert_eq!(switches, vec!["SN-LEAF1", "SN-SPINE1"]);
}

#[tokio::test]
async fn test_get_updates_strips_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(format!("/aeris/v1/rest/SN-LEAF1/{}", paths::HOSTNAME_CONFIG)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "startState": {
                "updates": { "hostname": { "_value": "leaf1" } }
            }
        })))
        .mount(&server)
        .await;

    let updates = client
        .get_updates("SN-LEAF1", paths::HOSTNAME_CONFIG)
        .await
        .unwrap();
    assert_eq!(updates["hostname"]["_value"], "leaf1");
}

#[tokio::test]
async fn test_pointer_with_leading_slash() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/aeris/v1/rest/SN-LEAF1/Sysdb/bridging/config/vlanConfig/10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let updates = client
        .get_updates("SN-LEAF1", "/Sysdb/bridging/config/vlanConfig/10")
        .await
        .unwrap();
    assert!(updates.is_empty());
}

#[tokio::test]
async fn test_error_code_in_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(format!("/aeris/v1/rest/SN-LEAF1/{}", paths::ARP)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errorCode": "404",
            "errorMessage": "path not found"
        })))
        .mount(&server)
        .await;

    let err = client.get_updates("SN-LEAF1", paths::ARP).await.unwrap_err();
    assert!(matches!(err, Error::Api { ref message, .. } if message == "path not found"));
}
