// ── check_switchType ──

use cvpkit_api::EapiClient;
use serde::Deserialize;
use serde_json::Value;

use super::{Audit, CheckReport, DeviceLogin};
use crate::error::CoreError;

const CHECK: &str = "check_switchType";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchTypeArgs {
    /// Substring expected in the model name, e.g. `vEOS` or `7050`.
    pub switch_type: String,
    /// Device to ask. Usually given on the command line.
    #[serde(default)]
    pub device: Option<String>,
    #[serde(flatten)]
    pub login: DeviceLogin,
}

fn field<'a>(result: Option<&'a Value>, key: &str) -> Result<&'a str, CoreError> {
    result
        .and_then(|r| r.get(key))
        .and_then(Value::as_str)
        .ok_or_else(|| CoreError::Api {
            message: format!("eAPI response is missing {key}"),
            code: None,
            status: None,
        })
}

/// Confirm the device's model name contains `args.switch_type`.
pub async fn check_switch_type(
    client: &EapiClient,
    args: &SwitchTypeArgs,
    audit: &mut Audit,
) -> Result<CheckReport, CoreError> {
    audit.log("running show version from script to check switch type");
    let results = client.run_cmds(&["show version", "show hostname"]).await?;
    let model = field(results.first(), "modelName")?;
    let host = field(results.get(1), "hostname")?;

    let matches = model.contains(&args.switch_type);
    if matches {
        audit.log(format!("SUCCESS: switch {host} is a {model}"));
    } else {
        audit.log(format!(
            "WARNING: switch {host} is not a {} it is a {model}",
            args.switch_type
        ));
    }
    Ok(CheckReport::tally(CHECK, u32::from(matches), u32::from(!matches), 1))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use cvpkit_api::TransportConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn switch(model: &str) -> (MockServer, EapiClient) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/command-api"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": "cvpkit",
                "result": [
                    { "modelName": model, "version": "4.20.1F" },
                    { "hostname": "leaf1", "fqdn": "leaf1.example.com" }
                ]
            })))
            .mount(&server)
            .await;
        let client = EapiClient::new(
            &server.uri().parse().unwrap(),
            "admin",
            "admin".to_string().into(),
            &TransportConfig::default(),
        )
        .unwrap();
        (server, client)
    }

    fn args(switch_type: &str) -> SwitchTypeArgs {
        SwitchTypeArgs {
            switch_type: switch_type.into(),
            device: None,
            login: DeviceLogin::default(),
        }
    }

    #[tokio::test]
    async fn matching_model_passes() {
        let (_server, client) = switch("vEOS").await;
        let mut audit = Audit::new();
        let report = check_switch_type(&client, &args("vEOS"), &mut audit).await.unwrap();

        assert!(report.success);
        assert_eq!(audit.lines().last().unwrap(), "SUCCESS: switch leaf1 is a vEOS");
    }

    #[tokio::test]
    async fn other_model_fails_with_warning() {
        let (_server, client) = switch("DCS-7050TX-64").await;
        let mut audit = Audit::new();
        let report = check_switch_type(&client, &args("vEOS"), &mut audit).await.unwrap();

        assert!(!report.success);
        assert_eq!(
            audit.lines().last().unwrap(),
            "WARNING: switch leaf1 is not a vEOS it is a DCS-7050TX-64"
        );
        assert!(report.into_result().is_err());
    }
}
