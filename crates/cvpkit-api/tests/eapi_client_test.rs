#![allow(clippy::unwrap_used)]
// Integration tests for `EapiClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cvpkit_api::{EapiClient, Error};

async fn setup() -> (MockServer, EapiClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = EapiClient::with_client(
        reqwest::Client::new(),
        &base_url,
        "admin",
        "admin".to_string().into(),
    )
    .unwrap();
    (server, client)
}

#[tokio::test]
async fn test_run_cmds_returns_results_in_order() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/command-api"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": "cvpkit",
            "result": [
                { "modelName": "DCS-7050SX-64" },
                { "hostname": "leaf1", "fqdn": "leaf1.lab" }
            ]
        })))
        .mount(&server)
        .await;

    let result = client
        .run_cmds(&["show version", "show hostname"])
        .await
        .unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result[0]["modelName"], "DCS-7050SX-64");
    assert_eq!(result[1]["hostname"], "leaf1");
}

#[tokio::test]
async fn test_rpc_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/command-api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": "cvpkit",
            "error": { "code": 1002, "message": "CLI command 1 of 1 'show bogus' failed: invalid command" }
        })))
        .mount(&server)
        .await;

    let err = client.run_cmds(&["show bogus"]).await.unwrap_err();
    assert!(matches!(err, Error::Eapi { code: 1002, .. }));
}

#[tokio::test]
async fn test_unauthorized() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/command-api"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.run_cmds(&["show version"]).await.unwrap_err();
    assert!(err.is_auth_expired());
}
